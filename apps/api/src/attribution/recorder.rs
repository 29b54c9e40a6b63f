//! Visit Recorder: attributes a visitor to the referral code that brought them in.
//!
//! Order of effects for one visit:
//! 1. `referral` cookie (last touch wins)
//! 2. `visitorId` cookie, generated only when missing
//! 3. upsert of `visitors/{code}/{visitorId}` on a spawned task
//! 4. redirect plan to `/`, returned regardless of how step 3 ends
//!
//! Steps 1–2 finish before step 3 starts. Step 3 is best-effort tracking: its
//! failure is logged and never reaches the caller's response.

use std::time::Duration;

use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::attribution::visitor::{
    ensure_visitor_id, normalize_referral_code, set_referral, VisitorIdentity,
};
use crate::redirect::{RedirectPlan, HOME_PATH};
use crate::repository::Repository;
use crate::store::StoreError;

#[derive(Debug)]
pub struct RecordedVisit {
    pub referral_code: String,
    pub identity: VisitorIdentity,
    pub redirect: RedirectPlan,
    /// The attribution write. Handlers detach it; tests await it.
    pub tracking: JoinHandle<Result<(), StoreError>>,
}

#[derive(Debug)]
pub enum VisitOutcome {
    /// No usable referral code: nothing recorded, plain navigation home.
    Skipped { redirect: RedirectPlan },
    Recorded(RecordedVisit),
}

#[derive(Clone)]
pub struct VisitRecorder {
    repo: Repository,
    redirect_delay: Duration,
}

impl VisitRecorder {
    pub fn new(repo: Repository, redirect_delay: Duration) -> Self {
        Self {
            repo,
            redirect_delay,
        }
    }

    /// Must run inside a Tokio runtime; the attribution write is spawned.
    pub fn record_visit(&self, jar: CookieJar, raw_code: Option<&str>) -> (CookieJar, VisitOutcome) {
        let Some(referral_code) = normalize_referral_code(raw_code) else {
            debug!("Visit without a usable referral code: {raw_code:?}");
            return (
                jar,
                VisitOutcome::Skipped {
                    redirect: RedirectPlan::new(HOME_PATH, Duration::ZERO),
                },
            );
        };

        let jar = set_referral(jar, &referral_code);
        let (jar, identity) = ensure_visitor_id(jar);

        let tracking = self.spawn_tracking(referral_code.clone(), identity);

        info!(
            referral_code = %referral_code,
            visitor_id = %identity.visitor_id,
            new_visitor = identity.is_new,
            "Referral visit"
        );

        (
            jar,
            VisitOutcome::Recorded(RecordedVisit {
                referral_code,
                identity,
                redirect: RedirectPlan::new(HOME_PATH, self.redirect_delay),
                tracking,
            }),
        )
    }

    fn spawn_tracking(
        &self,
        referral_code: String,
        identity: VisitorIdentity,
    ) -> JoinHandle<Result<(), StoreError>> {
        let repo = self.repo.clone();
        let visited_at = Utc::now();
        tokio::spawn(async move {
            let result = repo
                .record_visit(&referral_code, identity.visitor_id, visited_at)
                .await;
            match &result {
                Ok(()) => debug!(
                    referral_code = %referral_code,
                    visitor_id = %identity.visitor_id,
                    "Visit attribution stored"
                ),
                Err(e) => warn!(
                    referral_code = %referral_code,
                    visitor_id = %identity.visitor_id,
                    "Failed to store visit attribution: {e}"
                ),
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum_extra::extract::cookie::Cookie;
    use uuid::Uuid;

    use super::*;
    use crate::attribution::visitor::{REFERRAL_COOKIE, VISITOR_COOKIE};
    use crate::redirect::DEFAULT_REDIRECT_DELAY;
    use crate::state::test_support::capture_logs;
    use crate::store::fakes::FailingDocumentStore;
    use crate::store::MemoryDocumentStore;

    fn recorder() -> (Arc<MemoryDocumentStore>, Repository, VisitRecorder) {
        let store = Arc::new(MemoryDocumentStore::new());
        let repo = Repository::new(store.clone());
        let recorder = VisitRecorder::new(repo.clone(), DEFAULT_REDIRECT_DELAY);
        (store, repo, recorder)
    }

    fn recorded(outcome: VisitOutcome) -> RecordedVisit {
        match outcome {
            VisitOutcome::Recorded(visit) => visit,
            VisitOutcome::Skipped { .. } => panic!("expected a recorded visit"),
        }
    }

    #[tokio::test]
    async fn test_fresh_visitor_scenario() {
        let (store, repo, recorder) = recorder();

        let (jar, outcome) = recorder.record_visit(CookieJar::new(), Some("xyz123"));
        let visit = recorded(outcome);

        assert_eq!(jar.get(REFERRAL_COOKIE).unwrap().value(), "xyz123");
        assert!(visit.identity.is_new);
        assert_eq!(
            jar.get(VISITOR_COOKIE).unwrap().value(),
            visit.identity.visitor_id.to_string()
        );
        assert_eq!(visit.redirect.redirect_to, "/");
        assert_eq!(visit.redirect.redirect_after_ms, 1500);

        visit.tracking.await.unwrap().unwrap();
        assert_eq!(store.len().await, 1);
        assert!(repo
            .get_visit("xyz123", visit.identity.visitor_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_repeat_visits_keep_one_record_with_latest_timestamp() {
        let (store, repo, recorder) = recorder();

        let (jar, first) = recorder.record_visit(CookieJar::new(), Some("xyz123"));
        let first = recorded(first);
        first.tracking.await.unwrap().unwrap();
        let first_ts = repo
            .get_visit("xyz123", first.identity.visitor_id)
            .await
            .unwrap()
            .unwrap()
            .timestamp;

        tokio::time::sleep(Duration::from_millis(5)).await;
        let (_jar, second) = recorder.record_visit(jar, Some("xyz123"));
        let second = recorded(second);
        second.tracking.await.unwrap().unwrap();

        assert_eq!(second.identity.visitor_id, first.identity.visitor_id);
        assert!(!second.identity.is_new);
        assert_eq!(store.len().await, 1);
        let visits = repo.visits_for("xyz123").await.unwrap();
        assert_eq!(visits.len(), 1);
        assert!(visits[0].1.timestamp > first_ts);
    }

    #[tokio::test]
    async fn test_empty_code_is_a_no_op() {
        let (store, _repo, recorder) = recorder();

        for raw in [None, Some(""), Some("   ")] {
            let (jar, outcome) = recorder.record_visit(CookieJar::new(), raw);
            let VisitOutcome::Skipped { redirect } = outcome else {
                panic!("expected a skipped visit for {raw:?}");
            };
            assert_eq!(redirect, RedirectPlan::new("/", Duration::ZERO));
            assert!(jar.get(REFERRAL_COOKIE).is_none());
            assert!(jar.get(VISITOR_COOKIE).is_none());
        }
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_new_referral_overwrites_cookie_but_keeps_visitor() {
        let (_store, _repo, recorder) = recorder();
        let visitor = Uuid::new_v4();
        let jar = CookieJar::new()
            .add(Cookie::new(REFERRAL_COOKIE, "old"))
            .add(Cookie::new(VISITOR_COOKIE, visitor.to_string()));

        let (jar, outcome) = recorder.record_visit(jar, Some("new"));
        let visit = recorded(outcome);
        visit.tracking.await.unwrap().unwrap();

        assert_eq!(jar.get(REFERRAL_COOKIE).unwrap().value(), "new");
        assert_eq!(visit.identity.visitor_id, visitor);
    }

    #[tokio::test]
    async fn test_store_failure_still_redirects() {
        let (logs, _guard) = capture_logs();
        let repo = Repository::new(Arc::new(FailingDocumentStore));
        let recorder = VisitRecorder::new(repo, DEFAULT_REDIRECT_DELAY);

        let (jar, outcome) = recorder.record_visit(CookieJar::new(), Some("xyz123"));
        let visit = recorded(outcome);

        assert_eq!(visit.redirect.redirect_to, "/");
        assert_eq!(visit.redirect.after(), Duration::from_millis(1500));
        assert!(jar.get(VISITOR_COOKIE).is_some());

        let result = visit.tracking.await.unwrap();
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        let logs = logs.contents();
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("Failed to store visit attribution"), "{logs}");
        assert!(logs.contains("xyz123"), "{logs}");
    }
}
