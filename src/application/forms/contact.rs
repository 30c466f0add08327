use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::contact::{is_valid_email, is_valid_phone};

use super::{
    ContactSubmitter, DEFAULT_SUBMIT_TIMEOUT, Notification, SubmitError, SubmitOutcome,
    with_timeout,
};

pub const CONTACT_SENT_MESSAGE: &str = "Thank you! Your message has been sent successfully.";
pub const CONTACT_FAILED_MESSAGE: &str = "Failed to send message. Please try again.";
pub const CONTACT_NETWORK_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactRejection {
    MissingFields,
    InvalidEmail,
    InvalidPhone,
}

impl fmt::Display for ContactRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContactRejection::MissingFields => "Please fill in all required fields.",
            ContactRejection::InvalidEmail => "Please enter a valid email address with @ symbol.",
            ContactRejection::InvalidPhone => {
                "Phone number must start with + followed by country code (e.g., +1234567890). No spaces allowed."
            }
        })
    }
}

/// Wire body of `POST /api/postcontact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactAction {
    SetName(String),
    SetEmail(String),
    SetPhone(String),
    SetDescription(String),
    SubmitRejected(ContactRejection),
    SubmitStarted,
    /// Carries the server's confirmation text, if any.
    SubmitSucceeded(Option<String>),
    SubmitFailed(String),
    DismissNotification,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub description: String,
    pub submitting: bool,
    pub notification: Option<Notification>,
}

impl ContactForm {
    pub fn reduce(self, action: ContactAction) -> Self {
        match action {
            ContactAction::SetName(name) => Self { name, ..self },
            ContactAction::SetEmail(email) => Self { email, ..self },
            ContactAction::SetPhone(phone) => Self { phone, ..self },
            ContactAction::SetDescription(description) => Self {
                description,
                ..self
            },
            ContactAction::SubmitRejected(rejection) => Self {
                notification: Some(Notification::error(rejection.to_string())),
                ..self
            },
            ContactAction::SubmitStarted => Self {
                submitting: true,
                notification: None,
                ..self
            },
            ContactAction::SubmitSucceeded(message) => Self {
                notification: Some(Notification::success(
                    message.unwrap_or_else(|| CONTACT_SENT_MESSAGE.to_string()),
                )),
                ..Self::default()
            },
            ContactAction::SubmitFailed(message) => Self {
                submitting: false,
                notification: Some(Notification::error(message)),
                ..self
            },
            ContactAction::DismissNotification => Self {
                notification: None,
                ..self
            },
        }
    }

    pub fn validate(&self) -> Result<ContactSubmission, ContactRejection> {
        let name = self.name.trim();
        let email = self.email.trim();
        let desc = self.description.trim();
        if name.is_empty() || email.is_empty() || desc.is_empty() {
            return Err(ContactRejection::MissingFields);
        }
        if !is_valid_email(email) {
            return Err(ContactRejection::InvalidEmail);
        }
        let phone = self.phone.trim();
        if !phone.is_empty() && !is_valid_phone(phone) {
            return Err(ContactRejection::InvalidPhone);
        }

        Ok(ContactSubmission {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            desc: desc.to_string(),
        })
    }
}

pub struct ContactSession {
    form: ContactForm,
    submitter: Arc<dyn ContactSubmitter>,
    timeout: Duration,
}

impl ContactSession {
    pub fn new(submitter: Arc<dyn ContactSubmitter>) -> Self {
        Self {
            form: ContactForm::default(),
            submitter,
            timeout: DEFAULT_SUBMIT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn form(&self) -> &ContactForm {
        &self.form
    }

    pub fn update(&mut self, action: ContactAction) {
        let form = std::mem::take(&mut self.form);
        self.form = form.reduce(action);
    }

    pub async fn submit(&mut self) -> SubmitOutcome<ContactRejection> {
        if self.form.submitting {
            return SubmitOutcome::Ignored;
        }
        let submission = match self.form.validate() {
            Ok(submission) => submission,
            Err(rejection) => {
                self.update(ContactAction::SubmitRejected(rejection));
                return SubmitOutcome::Rejected(rejection);
            }
        };

        self.update(ContactAction::SubmitStarted);
        match with_timeout(self.timeout, self.submitter.submit_contact(&submission)).await {
            Ok(receipt) => {
                let message = Some(receipt.message).filter(|message| !message.is_empty());
                self.update(ContactAction::SubmitSucceeded(message));
                SubmitOutcome::Submitted
            }
            Err(err) => {
                warn!(
                    target = "creator_circle::forms::contact",
                    error = %err,
                    "contact submission failed"
                );
                let message = match &err {
                    SubmitError::Rejected { message, .. } if !message.is_empty() => {
                        message.clone()
                    }
                    SubmitError::Rejected { .. } => CONTACT_FAILED_MESSAGE.to_string(),
                    SubmitError::Network(_) | SubmitError::Timeout => {
                        CONTACT_NETWORK_MESSAGE.to_string()
                    }
                };
                self.update(ContactAction::SubmitFailed(message));
                SubmitOutcome::Failed(err)
            }
        }
    }
}
