use std::sync::Arc;

use crate::attribution::recorder::VisitRecorder;
use crate::config::Config;
use crate::flow::analysis::Analyzer;
use crate::flow::session::{SessionLocks, SessionStore};
use crate::repository::Repository;
use crate::videos::VideoSearch;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Typed access to the document store (visits, jobs, interviews).
    pub repo: Repository,
    /// Form-flow sessions. Redis in production.
    pub sessions: Arc<dyn SessionStore>,
    /// One writer per session id at a time.
    pub session_locks: SessionLocks,
    /// Pluggable skill-gap analyzer. Default: LlmAnalyzer.
    pub analyzer: Arc<dyn Analyzer>,
    pub videos: Arc<dyn VideoSearch>,
    pub visits: VisitRecorder,
    pub config: Config,
}

#[cfg(test)]
pub mod test_support {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::subscriber::DefaultGuard;
    use tracing_subscriber::fmt::MakeWriter;

    use super::AppState;
    use crate::attribution::recorder::VisitRecorder;
    use crate::config::Config;
    use crate::flow::analysis::fakes::{FakeAnalyzer, FakeVideos};
    use crate::flow::session::{MemorySessionStore, SessionLocks};
    use crate::repository::Repository;
    use crate::store::MemoryDocumentStore;

    /// App state backed by in-memory stores, with handles kept for assertions.
    pub struct TestHarness {
        pub state: AppState,
        pub documents: Arc<MemoryDocumentStore>,
        pub sessions: Arc<MemorySessionStore>,
        pub analyzer: Arc<FakeAnalyzer>,
    }

    impl TestHarness {
        pub fn with_analyzer(analyzer: FakeAnalyzer) -> Self {
            let config = Config::for_tests();
            let documents = Arc::new(MemoryDocumentStore::new());
            let sessions = Arc::new(MemorySessionStore::new());
            let analyzer = Arc::new(analyzer);
            let repo = Repository::new(documents.clone());

            let state = AppState {
                repo: repo.clone(),
                sessions: sessions.clone(),
                session_locks: SessionLocks::new(),
                analyzer: analyzer.clone(),
                videos: Arc::new(FakeVideos),
                visits: VisitRecorder::new(repo, config.redirect_delay),
                config,
            };

            Self {
                state,
                documents,
                sessions,
                analyzer,
            }
        }
    }

    impl Default for TestHarness {
        fn default() -> Self {
            Self::with_analyzer(FakeAnalyzer::default())
        }
    }

    pub fn test_state() -> TestHarness {
        TestHarness::default()
    }

    /// Formatted log output collected by `capture_logs`.
    #[derive(Clone, Default)]
    pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Routes this thread's `tracing` output into a buffer until the guard
    /// drops. Tasks spawned on a current-thread test runtime are included.
    pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }
}
