use std::fmt;

use serde::{Deserialize, Serialize};

/// A discrete point in the course flow. Exactly one is active per session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Welcome,
    Resume,
    JobDescriptions,
    Analyzing,
    Results,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Welcome,
        Stage::Resume,
        Stage::JobDescriptions,
        Stage::Analyzing,
        Stage::Results,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Welcome => "WELCOME",
            Stage::Resume => "RESUME",
            Stage::JobDescriptions => "JOB_DESCRIPTIONS",
            Stage::Analyzing => "ANALYZING",
            Stage::Results => "RESULTS",
        }
    }

    /// Strict parse. Callers decide how to treat an unknown value.
    pub fn parse(raw: &str) -> Option<Stage> {
        Stage::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
