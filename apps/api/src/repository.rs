//! Repository: the narrow, typed interface handlers use instead of raw store paths.
//!
//! Path layout:
//! - `visitors/{referral_code}/{visitor_id}` → `VisitRecord`
//! - `jobs/{job_id}` → `JobPosting`, indexed at `hr/{uid}/jobs/{job_id}`
//! - `applications/{job_id}/{application_id}` → `Application`
//! - `interviews/{id}` → `Interview`, indexed at `hr/{uid}/interviews/{id}`
//!
//! Multi-document writes are not transactional: the primary document is written
//! first, then its index entry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::models::recruiting::{
    Application, Interview, InterviewIndexEntry, JobIndexEntry, JobPosting,
};
use crate::models::visit::VisitRecord;
use crate::store::{DocPath, DocumentStore, StoreError};

#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // ── Visitor attribution ────────────────────────────────────────────────

    /// Upserts the attribution record for `(referral_code, visitor_id)`.
    /// Repeating the call only moves `timestamp` forward to `at`.
    pub async fn record_visit(
        &self,
        referral_code: &str,
        visitor_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let path = visit_path(referral_code, visitor_id)?;
        self.put(&path, &VisitRecord { timestamp: at }).await
    }

    #[cfg(test)]
    pub async fn get_visit(
        &self,
        referral_code: &str,
        visitor_id: Uuid,
    ) -> Result<Option<VisitRecord>, StoreError> {
        self.fetch(&visit_path(referral_code, visitor_id)?).await
    }

    /// All visitors attributed to `referral_code`, keyed by visitor id.
    pub async fn visits_for(
        &self,
        referral_code: &str,
    ) -> Result<Vec<(String, VisitRecord)>, StoreError> {
        self.children(&DocPath::new(["visitors", referral_code])?)
            .await
    }

    // ── Jobs and applications ──────────────────────────────────────────────

    pub async fn create_job(&self, job: &JobPosting) -> Result<(), StoreError> {
        let id = job.id.to_string();
        self.put(&DocPath::new(["jobs", id.as_str()])?, job).await?;
        self.put(
            &DocPath::new(["hr", job.hr_uid.as_str(), "jobs", id.as_str()])?,
            &JobIndexEntry {
                job_id: job.id,
                title: job.title.clone(),
            },
        )
        .await
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Option<JobPosting>, StoreError> {
        self.fetch(&DocPath::new(["jobs".to_string(), job_id.to_string()])?)
            .await
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobPosting>, StoreError> {
        let jobs = self.children(&DocPath::new(["jobs"])?).await?;
        Ok(jobs.into_iter().map(|(_, job)| job).collect())
    }

    pub async fn hr_jobs(&self, hr_uid: &str) -> Result<Vec<JobIndexEntry>, StoreError> {
        let entries = self.children(&DocPath::new(["hr", hr_uid, "jobs"])?).await?;
        Ok(entries.into_iter().map(|(_, entry)| entry).collect())
    }

    pub async fn apply(&self, application: &Application) -> Result<(), StoreError> {
        let path = DocPath::new([
            "applications".to_string(),
            application.job_id.to_string(),
            application.id.to_string(),
        ])?;
        self.put(&path, application).await
    }

    pub async fn applicants(&self, job_id: Uuid) -> Result<Vec<Application>, StoreError> {
        let applications = self
            .children(&DocPath::new(["applications".to_string(), job_id.to_string()])?)
            .await?;
        Ok(applications.into_iter().map(|(_, a)| a).collect())
    }

    // ── Interviews ─────────────────────────────────────────────────────────

    pub async fn schedule_interview(&self, interview: &Interview) -> Result<(), StoreError> {
        let id = interview.id.to_string();
        self.put(&DocPath::new(["interviews", id.as_str()])?, interview)
            .await?;
        self.put(
            &DocPath::new(["hr", interview.hr_uid.as_str(), "interviews", id.as_str()])?,
            &InterviewIndexEntry {
                interview_id: interview.id,
                scheduled_at: interview.scheduled_at,
                candidate_name: interview.candidate_name.clone(),
            },
        )
        .await
    }

    pub async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, StoreError> {
        self.fetch(&DocPath::new(["interviews".to_string(), id.to_string()])?)
            .await
    }

    /// Interviews scheduled by `hr_uid`, soonest first.
    pub async fn hr_interviews(
        &self,
        hr_uid: &str,
    ) -> Result<Vec<InterviewIndexEntry>, StoreError> {
        let mut entries: Vec<InterviewIndexEntry> = self
            .children(&DocPath::new(["hr", hr_uid, "interviews"])?)
            .await?
            .into_iter()
            .map(|(_, entry)| entry)
            .collect();
        entries.sort_by_key(|e| e.scheduled_at);
        Ok(entries)
    }

    // ── Typed store access ─────────────────────────────────────────────────

    async fn put<T: Serialize>(&self, path: &DocPath, value: &T) -> Result<(), StoreError> {
        self.store.set(path, serde_json::to_value(value)?).await
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &DocPath) -> Result<Option<T>, StoreError> {
        match self.store.get(path).await? {
            Some(body) => Ok(Some(serde_json::from_value(body)?)),
            None => Ok(None),
        }
    }

    async fn children<T: DeserializeOwned>(
        &self,
        path: &DocPath,
    ) -> Result<Vec<(String, T)>, StoreError> {
        self.store
            .list(path)
            .await?
            .into_iter()
            .map(|doc| -> Result<(String, T), StoreError> {
                Ok((doc.key, serde_json::from_value(doc.body)?))
            })
            .collect()
    }
}

fn visit_path(referral_code: &str, visitor_id: Uuid) -> Result<DocPath, StoreError> {
    DocPath::new([
        "visitors".to_string(),
        referral_code.to_string(),
        visitor_id.to_string(),
    ])
}
