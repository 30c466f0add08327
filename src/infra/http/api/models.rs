use serde::Deserialize;

use crate::application::contact::SubmitContactCommand;
use crate::application::posts::CreatePostCommand;
use crate::domain::tags::TagsInput;

/// Body of `POST /api/postblog`. Absent fields deserialize as blanks so the
/// service reports them as missing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostCreateRequest {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author: String,
    pub metadesc: String,
    pub tags: TagsInput,
}

impl From<PostCreateRequest> for CreatePostCommand {
    fn from(request: PostCreateRequest) -> Self {
        Self {
            title: request.title,
            slug: request.slug,
            content: request.content,
            author: request.author,
            meta_description: request.metadesc,
            tags: request.tags.into_list(),
        }
    }
}

/// Body of `POST /api/postcontact`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactCreateRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub desc: String,
}

impl From<ContactCreateRequest> for SubmitContactCommand {
    fn from(request: ContactCreateRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
            phone: request.phone,
            description: request.desc,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SlugQuery {
    pub slug: Option<String>,
}

/// Raw paging parameters; parsed by the listing service so malformed values
/// produce its own error messages.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PaginatedQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub tags: Option<String>,
}
