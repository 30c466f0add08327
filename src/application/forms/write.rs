use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::application::editor::{
    CommandDispatcher, CommandError, DispatchOutcome, EditorBuffer, FormatCommand,
};
use crate::domain::document::{EMPTY_DOCUMENT_MARKUP, Selection};
use crate::domain::entities::{META_DESCRIPTION_LIMIT, truncate_chars};
use crate::domain::slug::slugify;
use crate::domain::tags::{MAX_TAGS_PER_POST, is_known_tag};

use super::{
    DEFAULT_SUBMIT_TIMEOUT, Notification, PostSubmitter, SubmitError, SubmitOutcome, with_timeout,
};

pub const POST_CREATED_MESSAGE: &str =
    "Blog post created successfully! Redirecting to blog list...";
pub const POST_FAILED_MESSAGE: &str = "Failed to create blog post. Please try again.";
pub const TAG_LIMIT_MESSAGE: &str = "You can select maximum 2 tags only.";

/// Why the writing form refused to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRejection {
    MissingFields,
    EmptyContent,
    NoTags,
    TooManyTags,
}

impl fmt::Display for FormRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FormRejection::MissingFields => "Please fill in all required fields.",
            FormRejection::EmptyContent => "Please write some content for your blog post.",
            FormRejection::NoTags => "Please select at least one tag for your blog.",
            FormRejection::TooManyTags => TAG_LIMIT_MESSAGE,
        })
    }
}

/// Wire body of `POST /api/postblog`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSubmission {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author: String,
    pub metadesc: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    SetTitle(String),
    SetAuthor(String),
    SetDescription(String),
    ContentChanged(String),
    ToggleTag(String),
    SubmitRejected(FormRejection),
    SubmitStarted,
    SubmitSucceeded,
    SubmitFailed,
    DismissNotification,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthoringForm {
    pub title: String,
    pub author: String,
    pub description: String,
    pub content: String,
    pub tags: Vec<String>,
    pub submitting: bool,
    pub notification: Option<Notification>,
}

impl AuthoringForm {
    pub fn reduce(self, action: FormAction) -> Self {
        match action {
            FormAction::SetTitle(title) => Self { title, ..self },
            FormAction::SetAuthor(author) => Self { author, ..self },
            FormAction::SetDescription(description) => Self {
                description,
                ..self
            },
            FormAction::ContentChanged(content) => Self { content, ..self },
            FormAction::ToggleTag(tag) => self.toggle_tag(tag),
            FormAction::SubmitRejected(rejection) => Self {
                notification: Some(Notification::error(rejection.to_string())),
                ..self
            },
            FormAction::SubmitStarted => Self {
                submitting: true,
                notification: None,
                ..self
            },
            FormAction::SubmitSucceeded => Self {
                notification: Some(Notification::success(POST_CREATED_MESSAGE)),
                ..Self::default()
            },
            FormAction::SubmitFailed => Self {
                submitting: false,
                notification: Some(Notification::error(POST_FAILED_MESSAGE)),
                ..self
            },
            FormAction::DismissNotification => Self {
                notification: None,
                ..self
            },
        }
    }

    fn toggle_tag(mut self, tag: String) -> Self {
        if let Some(index) = self.tags.iter().position(|selected| *selected == tag) {
            self.tags.remove(index);
            return self;
        }
        if !is_known_tag(&tag) {
            self.notification = Some(Notification::error(format!("Unknown tag `{tag}`.")));
            return self;
        }
        if self.tags.len() >= MAX_TAGS_PER_POST {
            self.notification = Some(Notification::error(TAG_LIMIT_MESSAGE));
            return self;
        }
        self.tags.push(tag);
        self
    }

    /// Check the form and build the request body. Content equal to the empty
    /// document counts as blank.
    pub fn validate(&self) -> Result<PostSubmission, FormRejection> {
        let title = self.title.trim();
        let author = self.author.trim();
        let description = self.description.trim();
        if title.is_empty() || author.is_empty() || description.is_empty() {
            return Err(FormRejection::MissingFields);
        }

        let content = self.content.trim();
        if content.is_empty() || content == EMPTY_DOCUMENT_MARKUP {
            return Err(FormRejection::EmptyContent);
        }

        if self.tags.is_empty() {
            return Err(FormRejection::NoTags);
        }
        if self.tags.len() > MAX_TAGS_PER_POST {
            return Err(FormRejection::TooManyTags);
        }

        Ok(PostSubmission {
            title: title.to_string(),
            slug: slugify(title),
            content: content.to_string(),
            author: author.to_string(),
            metadesc: truncate_chars(description, META_DESCRIPTION_LIMIT),
            tags: self.tags.clone(),
        })
    }
}

/// One writing page visit: the form, the body editor and the submitter.
pub struct AuthoringSession {
    form: AuthoringForm,
    buffer: EditorBuffer,
    dispatcher: CommandDispatcher,
    submitter: Arc<dyn PostSubmitter>,
    timeout: Duration,
}

impl AuthoringSession {
    pub fn new(submitter: Arc<dyn PostSubmitter>) -> Self {
        Self::with_buffer(submitter, EditorBuffer::new())
    }

    pub fn with_buffer(submitter: Arc<dyn PostSubmitter>, buffer: EditorBuffer) -> Self {
        Self {
            form: AuthoringForm::default(),
            buffer,
            dispatcher: CommandDispatcher::new(),
            submitter,
            timeout: DEFAULT_SUBMIT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn form(&self) -> &AuthoringForm {
        &self.form
    }

    pub fn buffer(&self) -> &EditorBuffer {
        &self.buffer
    }

    pub fn update(&mut self, action: FormAction) {
        let form = std::mem::take(&mut self.form);
        self.form = form.reduce(action);
    }

    pub fn select(&mut self, selection: Selection) -> bool {
        self.buffer.select(selection)
    }

    /// Body edits are refused while a link waits for its URL, since the
    /// pending link keeps the offsets of the text it will wrap.
    pub fn type_text(&mut self, text: &str) -> Result<(), CommandError> {
        self.ensure_no_pending_link()?;
        let markup = self.buffer.type_text(text);
        self.sync_content(markup);
        Ok(())
    }

    pub fn paste(&mut self, raw: &str) -> Result<(), CommandError> {
        self.ensure_no_pending_link()?;
        let markup = self.buffer.on_paste(raw);
        self.sync_content(markup);
        Ok(())
    }

    pub fn press_enter(&mut self, shift: bool) -> Result<(), CommandError> {
        self.ensure_no_pending_link()?;
        let markup = self.buffer.on_enter_key(shift);
        self.sync_content(markup);
        Ok(())
    }

    pub fn format(&mut self, command: FormatCommand) -> Result<DispatchOutcome, CommandError> {
        let outcome = self.dispatcher.dispatch(&mut self.buffer, command)?;
        self.sync_outcome(&outcome);
        Ok(outcome)
    }

    pub fn resolve_link(&mut self, answer: Option<&str>) -> Result<DispatchOutcome, CommandError> {
        let outcome = self.dispatcher.resolve_link(&mut self.buffer, answer)?;
        self.sync_outcome(&outcome);
        Ok(outcome)
    }

    /// Mark the form as submitting and return the body to send, or `None`
    /// when a submission is already in flight or validation fails.
    pub fn begin_submit(&mut self) -> Result<Option<PostSubmission>, FormRejection> {
        if self.form.submitting {
            return Ok(None);
        }
        match self.form.validate() {
            Ok(submission) => {
                self.update(FormAction::SubmitStarted);
                Ok(Some(submission))
            }
            Err(rejection) => {
                self.update(FormAction::SubmitRejected(rejection));
                Err(rejection)
            }
        }
    }

    pub fn finish_submit(&mut self, result: Result<(), SubmitError>) {
        match result {
            Ok(()) => {
                self.update(FormAction::SubmitSucceeded);
                self.buffer.reset();
            }
            Err(err) => {
                warn!(
                    target = "creator_circle::forms::write",
                    error = %err,
                    "post submission failed"
                );
                self.update(FormAction::SubmitFailed);
            }
        }
    }

    pub async fn submit(&mut self) -> SubmitOutcome<FormRejection> {
        let submission = match self.begin_submit() {
            Ok(Some(submission)) => submission,
            Ok(None) => return SubmitOutcome::Ignored,
            Err(rejection) => return SubmitOutcome::Rejected(rejection),
        };

        let result = with_timeout(self.timeout, self.submitter.submit_post(&submission)).await;
        match result {
            Ok(receipt) => {
                info!(
                    target = "creator_circle::forms::write",
                    slug = %receipt.blog.slug,
                    "post submitted"
                );
                self.finish_submit(Ok(()));
                SubmitOutcome::Submitted
            }
            Err(err) => {
                self.finish_submit(Err(err.clone()));
                SubmitOutcome::Failed(err)
            }
        }
    }

    fn ensure_no_pending_link(&self) -> Result<(), CommandError> {
        if self.dispatcher.is_link_pending() {
            return Err(CommandError::LinkPending);
        }
        Ok(())
    }

    fn sync_content(&mut self, markup: Option<String>) {
        if let Some(markup) = markup {
            self.update(FormAction::ContentChanged(markup));
        }
    }

    fn sync_outcome(&mut self, outcome: &DispatchOutcome) {
        if let DispatchOutcome::Applied(markup) = outcome {
            self.update(FormAction::ContentChanged(markup.clone()));
        }
    }
}
