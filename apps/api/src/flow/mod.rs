// Course flow: WELCOME → RESUME → JOB_DESCRIPTIONS → ANALYZING → RESULTS.
// One authoritative stage per session, changed only through ApplicationState::apply.

pub mod analysis;
pub mod handlers;
pub mod prompts;
pub mod resume;
pub mod session;
pub mod stage;
pub mod state;
pub mod view;
