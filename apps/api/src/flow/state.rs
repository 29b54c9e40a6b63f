//! Application State: the per-session course flow and its single reducer.
//!
//! `ApplicationState::apply` is the only way to change a session. It either
//! performs one legal transition or returns a `FlowError` and leaves the state
//! untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flow::stage::Stage;
use crate::videos::Video;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeData {
    pub file_name: String,
    pub text: String,
    pub char_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptionData {
    pub descriptions: Vec<JobDescription>,
}

/// One step of the learning path: a missing skill and what to watch for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningModule {
    pub skill: String,
    pub reason: String,
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub learning_path: Vec<LearningModule>,
}

/// Completion signals issued by the active step.
#[derive(Debug, Clone)]
pub enum FlowAction {
    Start,
    ResumeParsed(ResumeData),
    JobDescriptionsParsed(JobDescriptionData),
    RetryAnalysis,
    AnalysisSucceeded(AnalysisResult),
    AnalysisFailed(String),
    /// ANALYZING was found without its inputs; step back to collect them.
    InputsMissing,
    Restart,
}

impl FlowAction {
    pub fn name(&self) -> &'static str {
        match self {
            FlowAction::Start => "start",
            FlowAction::ResumeParsed(_) => "resume_parsed",
            FlowAction::JobDescriptionsParsed(_) => "job_descriptions_parsed",
            FlowAction::RetryAnalysis => "retry_analysis",
            FlowAction::AnalysisSucceeded(_) => "analysis_succeeded",
            FlowAction::AnalysisFailed(_) => "analysis_failed",
            FlowAction::InputsMissing => "inputs_missing",
            FlowAction::Restart => "restart",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FlowError {
    #[error("'{action}' is not allowed in stage {from}")]
    InvalidTransition { from: Stage, action: &'static str },

    #[error("analysis needs {missing:?} before it can start")]
    MissingPrerequisites { missing: Vec<&'static str> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationState {
    pub stage: Stage,
    pub resume_data: Option<ResumeData>,
    pub job_description_data: Option<JobDescriptionData>,
    pub analysis_result: Option<AnalysisResult>,
    /// Message of the last failed analysis. Cleared when analysis is retried.
    pub analysis_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationState {
    pub fn new() -> Self {
        Self {
            stage: Stage::Welcome,
            resume_data: None,
            job_description_data: None,
            analysis_result: None,
            analysis_error: None,
            updated_at: Utc::now(),
        }
    }

    /// Applies one transition. On error the state is left exactly as it was.
    pub fn apply(&mut self, action: FlowAction) -> Result<(), FlowError> {
        let name = action.name();
        match (self.stage, action) {
            (_, FlowAction::Restart) => {
                *self = ApplicationState::new();
                return Ok(());
            }
            (Stage::Welcome, FlowAction::Start) => {
                self.stage = Stage::Resume;
            }
            (Stage::Resume, FlowAction::ResumeParsed(data)) => {
                self.resume_data = Some(data);
                self.stage = Stage::JobDescriptions;
            }
            // Write-once: after a failed analysis the stored descriptions are
            // retried, not replaced.
            (Stage::JobDescriptions, FlowAction::JobDescriptionsParsed(_))
                if self.job_description_data.is_some() =>
            {
                return Err(FlowError::InvalidTransition {
                    from: Stage::JobDescriptions,
                    action: name,
                });
            }
            (Stage::JobDescriptions, FlowAction::JobDescriptionsParsed(data)) => {
                if self.resume_data.is_none() {
                    return Err(FlowError::MissingPrerequisites {
                        missing: vec!["resume_data"],
                    });
                }
                self.job_description_data = Some(data);
                self.analysis_error = None;
                self.stage = Stage::Analyzing;
            }
            (Stage::JobDescriptions, FlowAction::RetryAnalysis) => {
                self.ensure_analysis_inputs()?;
                self.analysis_error = None;
                self.stage = Stage::Analyzing;
            }
            (Stage::Analyzing, FlowAction::AnalysisSucceeded(result)) => {
                self.analysis_result = Some(result);
                self.stage = Stage::Results;
            }
            (Stage::Analyzing, FlowAction::AnalysisFailed(message)) => {
                self.analysis_error = Some(message);
                self.stage = Stage::JobDescriptions;
            }
            (Stage::Analyzing, FlowAction::InputsMissing) => {
                if self.resume_data.is_none() {
                    self.job_description_data = None;
                    self.stage = Stage::Resume;
                } else {
                    self.stage = Stage::JobDescriptions;
                }
            }
            (from, _) => {
                return Err(FlowError::InvalidTransition { from, action: name });
            }
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Fails fast unless both analysis inputs are present.
    pub fn ensure_analysis_inputs(&self) -> Result<(&ResumeData, &JobDescriptionData), FlowError> {
        match (&self.resume_data, &self.job_description_data) {
            (Some(resume), Some(jds)) => Ok((resume, jds)),
            (resume, jds) => {
                let mut missing = Vec::new();
                if resume.is_none() {
                    missing.push("resume_data");
                }
                if jds.is_none() {
                    missing.push("job_description_data");
                }
                Err(FlowError::MissingPrerequisites { missing })
            }
        }
    }
}
