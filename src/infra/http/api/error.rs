use std::error::Error as StdError;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::contact::ContactServiceError;
use crate::application::error::ErrorReport;
use crate::application::pagination::PaginationError;
use crate::application::posts::{INVALID_SLUG_MESSAGE, MISSING_FIELDS_MESSAGE, PostServiceError};
use crate::application::repos::RepoError;
use crate::domain::contact::MISSING_FIELDS_ERROR;
use crate::domain::error::DomainError;

pub mod messages {
    pub const BLOG_NOT_FOUND: &str = "Blog not found";
    pub const FETCH_BLOG_FAILED: &str = "Error fetching blog";
    pub const FETCH_BLOGS_FAILED: &str = "Failed to fetch blogs";
    pub const SAVE_BLOG_FAILED: &str = "Failed to save blog.";
    pub const DUPLICATE_SLUG: &str = "A blog with this slug already exists.";
    pub const CONTACT_FAILED: &str = "Internal server error. Please try again later.";
    pub const INVALID_BODY: &str = "Request body must be a JSON object.";
    pub const STORE_UNAVAILABLE: &str = "Content store unavailable";
    pub const RATE_LIMITED: &str = "Too many requests. Please try again later.";
}

/// Wire shape of every API error: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(source: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status,
            report: ErrorReport::from_message(source, status, message.clone()),
            message,
        }
    }

    /// Like [`ApiError::new`], but logs the full cause chain of `cause`.
    pub fn with_cause(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
        cause: &dyn StdError,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            report: ErrorReport::from_error(source, status, cause),
        }
    }

    pub fn bad_request(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(source, StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(source, StatusCode::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn rate_limited(retry_after: u64) -> Response {
        let mut response = Self::new(
            "infra::http::api::rate_limit",
            StatusCode::TOO_MANY_REQUESTS,
            messages::RATE_LIMITED,
        )
        .into_response();
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }

    /// Map a store failure; `fallback` is the client-facing text for 5xx.
    pub fn from_repo(source: &'static str, err: RepoError, fallback: &'static str) -> Self {
        let (status, message) = match &err {
            RepoError::Duplicate { .. } => (StatusCode::CONFLICT, messages::DUPLICATE_SLUG),
            RepoError::NotFound => (StatusCode::NOT_FOUND, messages::BLOG_NOT_FOUND),
            RepoError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, fallback),
            RepoError::Integrity { .. } => (StatusCode::CONFLICT, fallback),
            RepoError::Timeout => (StatusCode::SERVICE_UNAVAILABLE, messages::STORE_UNAVAILABLE),
            RepoError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, fallback),
        };
        Self::with_cause(source, status, message, &err)
    }

    pub fn from_post_error(
        source: &'static str,
        err: PostServiceError,
        fallback: &'static str,
    ) -> Self {
        match err {
            PostServiceError::MissingField(_) => Self::with_cause(
                source,
                StatusCode::BAD_REQUEST,
                MISSING_FIELDS_MESSAGE,
                &err,
            ),
            PostServiceError::InvalidSlug(_) => Self::with_cause(
                source,
                StatusCode::BAD_REQUEST,
                INVALID_SLUG_MESSAGE,
                &err,
            ),
            PostServiceError::Domain(domain) => {
                Self::from_domain(source, domain, MISSING_FIELDS_MESSAGE)
            }
            PostServiceError::NotFound => Self::not_found(source, messages::BLOG_NOT_FOUND),
            PostServiceError::Repo(repo) => Self::from_repo(source, repo, fallback),
        }
    }

    pub fn from_contact_error(source: &'static str, err: ContactServiceError) -> Self {
        match err {
            ContactServiceError::Invalid(domain) => {
                Self::from_domain(source, domain, MISSING_FIELDS_ERROR)
            }
            ContactServiceError::Repo(repo) => {
                Self::from_repo(source, repo, messages::CONTACT_FAILED)
            }
        }
    }

    fn from_domain(source: &'static str, err: DomainError, missing: &'static str) -> Self {
        let message = match &err {
            DomainError::MissingField { .. } => missing.to_string(),
            DomainError::Validation { message } => message.clone(),
            DomainError::NotFound { .. } => {
                return Self::with_cause(
                    source,
                    StatusCode::NOT_FOUND,
                    messages::BLOG_NOT_FOUND,
                    &err,
                );
            }
        };
        Self::with_cause(source, StatusCode::BAD_REQUEST, message, &err)
    }
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        Self::with_cause(
            "infra::http::api::blogs_paginated",
            StatusCode::BAD_REQUEST,
            err.to_string(),
            &err,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.message,
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}
