//! Generation job model: parameters, status snapshots, and outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{JobError, ValidationError};

/// Creative parameters for a video generation request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationParams {
    pub category: String,
    /// The quote or script text the video is built around.
    pub content: String,
    /// Free-form description of the desired visuals.
    pub visual_prompt: String,
    /// Render style preset (e.g. "cinematic", "anime").
    pub style: String,
}

impl GenerationParams {
    /// Presence check run before any network call. Returns the first
    /// missing field so the UI can point at it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.category.trim().is_empty() {
            return Err(ValidationError::MissingField("category"));
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::MissingField("content"));
        }
        if self.visual_prompt.trim().is_empty() {
            return Err(ValidationError::MissingField("visual_prompt"));
        }
        if self.style.trim().is_empty() {
            return Err(ValidationError::MissingField("style"));
        }
        Ok(())
    }
}

/// Identifier for a submitted job, assigned by the job service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
}

/// Job status as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One status response from the job service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    /// Percentage in 0..=100. Expected non-decreasing while the job is
    /// live, but the service does not guarantee it.
    #[serde(default)]
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Terminal result of a polled job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed { url: String },
    Failed(JobError),
}

/// Item type of the polling stream: progress snapshots followed by
/// exactly one terminal outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum JobUpdate {
    Progress(JobSnapshot),
    Done(JobOutcome),
}

/// A finished video as listed by the library endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
