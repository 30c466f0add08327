//! Contact message intake.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::info;

use crate::application::posts::METRIC_VALIDATION_REJECTED;
use crate::application::repos::{ContactsRepo, RepoError};
use crate::domain::contact::NewContactMessage;
use crate::domain::entities::ContactMessageRecord;
use crate::domain::error::DomainError;

pub const METRIC_CONTACT_MESSAGES: &str = "creator_circle_contact_messages_total";

pub const CONTACT_SUCCESS_MESSAGE: &str =
    "Thank you for your message! We will get back to you soon.";

#[derive(Debug, Error)]
pub enum ContactServiceError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default)]
pub struct SubmitContactCommand {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub description: String,
}

#[derive(Clone)]
pub struct ContactService {
    repo: Arc<dyn ContactsRepo>,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactsRepo>) -> Self {
        Self { repo }
    }

    pub async fn submit(
        &self,
        command: SubmitContactCommand,
    ) -> Result<ContactMessageRecord, ContactServiceError> {
        let message = NewContactMessage::validate(
            &command.name,
            &command.email,
            command.phone.as_deref(),
            &command.description,
        )
        .inspect_err(|_| {
            counter!(METRIC_VALIDATION_REJECTED, "form" => "contact").increment(1);
        })?;

        let record = self.repo.create_contact_message(message).await?;
        counter!(METRIC_CONTACT_MESSAGES).increment(1);
        info!(
            target = "creator_circle::contact",
            message_id = %record.id,
            has_phone = record.phone.is_some(),
            "contact message stored"
        );
        Ok(record)
    }
}
