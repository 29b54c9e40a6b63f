//! Analysis pipeline for the ANALYZING step: a skill-gap report from the LLM,
//! then learning videos for each missing skill.
//!
//! `AppState` holds an `Arc<dyn Analyzer>`; `LlmAnalyzer` is the default.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::flow::prompts::{SKILL_GAP_PROMPT_TEMPLATE, SKILL_GAP_SYSTEM};
use crate::flow::state::{
    AnalysisResult, ApplicationState, FlowAction, FlowError, JobDescriptionData, LearningModule,
    ResumeData,
};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::videos::VideoSearch;

/// Missing skills beyond this are dropped from the learning path.
pub const MAX_LEARNING_MODULES: usize = 5;
/// Videos kept per learning module.
const VIDEOS_PER_MODULE: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingSkill {
    pub skill: String,
    #[serde(default)]
    pub reason: String,
}

/// Raw LLM output for the skill-gap prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGapReport {
    pub summary: String,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<MissingSkill>,
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        resume: &ResumeData,
        job_descriptions: &JobDescriptionData,
    ) -> Result<AnalysisResult, AppError>;
}

pub struct LlmAnalyzer {
    llm: LlmClient,
    videos: Arc<dyn VideoSearch>,
}

impl LlmAnalyzer {
    pub fn new(llm: LlmClient, videos: Arc<dyn VideoSearch>) -> Self {
        Self { llm, videos }
    }
}

#[async_trait]
impl Analyzer for LlmAnalyzer {
    async fn analyze(
        &self,
        resume: &ResumeData,
        job_descriptions: &JobDescriptionData,
    ) -> Result<AnalysisResult, AppError> {
        let prompt = build_prompt(resume, job_descriptions);
        let system = SKILL_GAP_SYSTEM.replace("{json_only}", JSON_ONLY_SYSTEM);

        let report: SkillGapReport = self
            .llm
            .complete_json(&prompt, &system)
            .await
            .map_err(|e| AppError::Llm(format!("Skill-gap analysis failed: {e}")))?;

        Ok(build_learning_path(report, self.videos.as_ref()).await)
    }
}

fn build_prompt(resume: &ResumeData, job_descriptions: &JobDescriptionData) -> String {
    let jds = job_descriptions
        .descriptions
        .iter()
        .enumerate()
        .map(|(i, jd)| format!("[{}] {}\n{}", i + 1, jd.title, jd.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    SKILL_GAP_PROMPT_TEMPLATE
        .replace("{max_missing}", &MAX_LEARNING_MODULES.to_string())
        .replace("{resume_text}", &resume.text)
        .replace("{job_descriptions}", &jds)
}

/// Turns a skill-gap report into a learning path. Skills are de-duplicated
/// case-insensitively; a failed video lookup leaves that module without videos.
pub async fn build_learning_path(
    report: SkillGapReport,
    videos: &dyn VideoSearch,
) -> AnalysisResult {
    let mut seen = HashSet::new();
    let missing: Vec<MissingSkill> = report
        .missing_skills
        .into_iter()
        .filter(|m| !m.skill.trim().is_empty())
        .filter(|m| seen.insert(m.skill.trim().to_lowercase()))
        .take(MAX_LEARNING_MODULES)
        .collect();

    let mut learning_path = Vec::with_capacity(missing.len());
    for MissingSkill { skill, reason } in missing {
        let skill = skill.trim().to_string();
        let found = match videos.search(&skill).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Video lookup failed for '{skill}': {e}");
                vec![]
            }
        };
        learning_path.push(LearningModule {
            videos: found.into_iter().take(VIDEOS_PER_MODULE).collect(),
            skill,
            reason,
        });
    }

    AnalysisResult {
        summary: report.summary,
        matched_skills: report.matched_skills,
        missing_skills: learning_path.iter().map(|m| m.skill.clone()).collect(),
        learning_path,
    }
}

/// Runs the analysis for a session in ANALYZING and returns the completion
/// signal to apply. Missing inputs fail fast without calling the analyzer.
pub async fn run_analysis(
    state: &ApplicationState,
    analyzer: &dyn Analyzer,
) -> Result<FlowAction, FlowError> {
    let (resume, job_descriptions) = state.ensure_analysis_inputs()?;

    match analyzer.analyze(resume, job_descriptions).await {
        Ok(result) => {
            info!(
                "Analysis complete: {} matched, {} missing",
                result.matched_skills.len(),
                result.missing_skills.len()
            );
            Ok(FlowAction::AnalysisSucceeded(result))
        }
        Err(e) => {
            warn!("Analysis failed: {e}");
            Ok(FlowAction::AnalysisFailed(e.to_string()))
        }
    }
}
