//! Client-side form state for the writing and contact pages.
//!
//! Each form is an immutable value advanced by a `reduce` function; a session
//! type owns the value together with the submitter it sends through.

mod contact;
mod write;

pub use contact::{
    ContactAction, ContactForm, ContactRejection, ContactSession, ContactSubmission,
};
pub use write::{
    AuthoringForm, AuthoringSession, FormAction, FormRejection, PostSubmission,
};

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::PostRecord;

pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("submission rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Body returned by `POST /api/postblog`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostReceipt {
    pub success: bool,
    pub message: String,
    pub blog: PostRecord,
}

/// Body returned by `POST /api/postcontact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactReceipt {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
}

#[async_trait]
pub trait PostSubmitter: Send + Sync {
    async fn submit_post(&self, submission: &PostSubmission) -> Result<PostReceipt, SubmitError>;
}

#[async_trait]
pub trait ContactSubmitter: Send + Sync {
    async fn submit_contact(
        &self,
        submission: &ContactSubmission,
    ) -> Result<ContactReceipt, SubmitError>;
}

/// How a session's submit call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome<R> {
    /// A submission was already in flight.
    Ignored,
    /// Local validation failed; nothing was sent.
    Rejected(R),
    Submitted,
    Failed(SubmitError),
}

async fn with_timeout<T>(
    timeout: Duration,
    call: impl std::future::Future<Output = Result<T, SubmitError>>,
) -> Result<T, SubmitError> {
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(SubmitError::Timeout))
}
