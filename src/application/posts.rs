//! Post listing, lookup and creation.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use thiserror::Error;
use tracing::info;

use crate::application::pagination::{PageRequest, PaginatedPosts, paginate};
use crate::application::repos::{CreatePostParams, PostsRepo, PostsWriteRepo, RepoError};
use crate::application::sanitize::sanitize_content;
use crate::domain::entities::{META_DESCRIPTION_LIMIT, PostRecord, truncate_chars};
use crate::domain::error::DomainError;
use crate::domain::slug::is_valid_slug;
use crate::domain::tags::TagSet;

pub const METRIC_POSTS_CREATED: &str = "creator_circle_posts_created_total";
pub const METRIC_LISTING_MS: &str = "creator_circle_listing_ms";
pub const METRIC_VALIDATION_REJECTED: &str = "creator_circle_validation_rejected_total";

pub const POST_SAVED_MESSAGE: &str = "Blog post saved to database!";
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields.";
pub const INVALID_SLUG_MESSAGE: &str =
    "Slug may only contain lowercase letters, digits and single hyphens.";

#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("slug `{0}` is not canonical")]
    InvalidSlug(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl PostServiceError {
    /// Whether the error stems from caller input rather than the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::InvalidSlug(_) | Self::Domain(_)
        )
    }
}

/// Fields of a post creation request as received, before validation.
#[derive(Debug, Clone, Default)]
pub struct CreatePostCommand {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author: String,
    pub meta_description: String,
    pub tags: Vec<String>,
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
}

impl PostService {
    pub fn new(reader: Arc<dyn PostsRepo>, writer: Arc<dyn PostsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list_recent(&self) -> Result<Vec<PostRecord>, PostServiceError> {
        Ok(self.reader.list_posts().await?)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<PostRecord, PostServiceError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(PostServiceError::NotFound);
        }
        self.reader
            .find_by_slug(slug)
            .await?
            .ok_or(PostServiceError::NotFound)
    }

    pub async fn list_paginated(
        &self,
        request: &PageRequest,
    ) -> Result<PaginatedPosts, PostServiceError> {
        let started = Instant::now();
        let posts = self.reader.list_posts().await?;
        let page = paginate(posts, request);
        histogram!(METRIC_LISTING_MS).record(started.elapsed().as_secs_f64() * 1000.0);
        Ok(page)
    }

    pub async fn create_post(
        &self,
        command: CreatePostCommand,
    ) -> Result<PostRecord, PostServiceError> {
        let params = match validate_create(command) {
            Ok(params) => params,
            Err(err) => {
                counter!(METRIC_VALIDATION_REJECTED, "form" => "post").increment(1);
                return Err(err);
            }
        };

        let post = self.writer.create_post(params).await?;
        counter!(METRIC_POSTS_CREATED).increment(1);
        info!(
            target = "creator_circle::posts",
            post_id = %post.id,
            slug = %post.slug,
            tags = ?post.tags,
            "post created"
        );
        Ok(post)
    }
}

fn require(value: &str, field: &'static str) -> Result<String, PostServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(PostServiceError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Shared by the HTTP surface and the importer.
pub(crate) fn validate_create(
    command: CreatePostCommand,
) -> Result<CreatePostParams, PostServiceError> {
    let title = require(&command.title, "title")?;
    let slug = require(&command.slug, "slug")?;
    let content = require(&command.content, "content")?;
    let author = require(&command.author, "author")?;
    let meta_description = require(&command.meta_description, "metadesc")?;

    if !is_valid_slug(&slug) {
        return Err(PostServiceError::InvalidSlug(slug));
    }

    let tags = TagSet::try_from_tags(&command.tags)?;

    let content = sanitize_content(&content);
    if content.trim().is_empty() {
        return Err(PostServiceError::MissingField("content"));
    }

    Ok(CreatePostParams {
        title,
        slug,
        content,
        author,
        meta_description: truncate_chars(&meta_description, META_DESCRIPTION_LIMIT),
        tags: tags.into_vec(),
    })
}
