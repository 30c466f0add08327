//! Bulk import of posts from a directory of JSON files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::posts::{CreatePostCommand, PostServiceError, validate_create};
use crate::application::repos::{PostsWriteRepo, RepoError};
use crate::domain::document;
use crate::domain::entities::truncate_chars;
use crate::domain::slug::slugify;
use crate::domain::tags::TagsInput;

pub const DEFAULT_IMPORT_AUTHOR: &str = "admin";
/// Characters of body text used when a file carries no meta description.
pub const DERIVED_DESCRIPTION_CHARS: usize = 150;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read import directory `{path}`")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single file was skipped.
#[derive(Debug, Error)]
pub enum ImportFileError {
    #[error("failed to read file")]
    Read(#[source] std::io::Error),
    #[error("file is not a valid post document")]
    Parse(#[source] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] PostServiceError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct ImportedPost {
    title: String,
    content: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    metadesc: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    tags: Option<TagsInput>,
}

impl ImportedPost {
    fn into_command(self) -> CreatePostCommand {
        let author = non_blank(self.author).unwrap_or_else(|| DEFAULT_IMPORT_AUTHOR.to_string());
        let meta_description = non_blank(self.metadesc).unwrap_or_else(|| {
            let text = document::parse(&self.content).plain_text();
            truncate_chars(text.trim(), DERIVED_DESCRIPTION_CHARS)
        });
        let slug = non_blank(self.slug).unwrap_or_else(|| slugify(&self.title));

        CreatePostCommand {
            title: self.title,
            slug,
            content: self.content,
            author,
            meta_description,
            tags: self.tags.map(TagsInput::into_list).unwrap_or_default(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[derive(Clone)]
pub struct PostImporter {
    writer: Arc<dyn PostsWriteRepo>,
}

impl PostImporter {
    pub fn new(writer: Arc<dyn PostsWriteRepo>) -> Self {
        Self { writer }
    }

    /// Import every `*.json` file in `dir`, in file-name order. Files that
    /// fail are logged and counted as skipped.
    pub async fn import_dir(&self, dir: &Path) -> Result<ImportSummary, ImportError> {
        let files = list_json_files(dir)
            .await
            .map_err(|source| ImportError::Directory {
                path: dir.to_path_buf(),
                source,
            })?;

        if files.is_empty() {
            warn!(
                target = "creator_circle::import",
                path = %dir.display(),
                "no post files found"
            );
        }

        let mut summary = ImportSummary::default();
        for file in files {
            match self.import_file(&file).await {
                Ok(slug) => {
                    summary.imported += 1;
                    info!(
                        target = "creator_circle::import",
                        file = %file.display(),
                        slug = %slug,
                        "imported post"
                    );
                }
                Err(err) => {
                    summary.skipped += 1;
                    warn!(
                        target = "creator_circle::import",
                        file = %file.display(),
                        error = %err,
                        "skipped post file"
                    );
                }
            }
        }

        info!(
            target = "creator_circle::import",
            imported = summary.imported,
            skipped = summary.skipped,
            "import finished"
        );
        Ok(summary)
    }

    async fn import_file(&self, path: &Path) -> Result<String, ImportFileError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(ImportFileError::Read)?;
        let post: ImportedPost = serde_json::from_str(&raw).map_err(ImportFileError::Parse)?;
        let params = validate_create(post.into_command())?;
        let record = self.writer.create_post(params).await?;
        Ok(record.slug)
    }
}

async fn list_json_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|left, right| left.file_name().cmp(&right.file_name()));
    Ok(files)
}
