use serde::Serialize;

use crate::flow::stage::Stage;
use crate::flow::state::{AnalysisResult, ApplicationState};

/// The single view rendered for a stage. Each stage maps to exactly one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum CourseView {
    Welcome,
    ResumeUpload,
    JobDescriptionForm {
        resume_file_name: Option<String>,
        /// Set when the last analysis failed; the form offers a retry.
        analysis_error: Option<String>,
        can_retry: bool,
    },
    AnalysisInProgress {
        job_description_count: usize,
    },
    LearningPath {
        analysis: Option<AnalysisResult>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseResponse {
    pub stage: Stage,
    #[serde(flatten)]
    pub view: CourseView,
}

pub fn render_view(state: &ApplicationState) -> CourseView {
    match state.stage {
        Stage::Welcome => CourseView::Welcome,
        Stage::Resume => CourseView::ResumeUpload,
        Stage::JobDescriptions => CourseView::JobDescriptionForm {
            resume_file_name: state.resume_data.as_ref().map(|r| r.file_name.clone()),
            analysis_error: state.analysis_error.clone(),
            can_retry: state.ensure_analysis_inputs().is_ok(),
        },
        Stage::Analyzing => CourseView::AnalysisInProgress {
            job_description_count: state
                .job_description_data
                .as_ref()
                .map_or(0, |d| d.descriptions.len()),
        },
        Stage::Results => CourseView::LearningPath {
            analysis: state.analysis_result.clone(),
        },
    }
}

impl From<&ApplicationState> for CourseResponse {
    fn from(state: &ApplicationState) -> Self {
        Self {
            stage: state.stage,
            view: render_view(state),
        }
    }
}
