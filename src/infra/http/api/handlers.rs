use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};

use crate::application::contact::CONTACT_SUCCESS_MESSAGE;
use crate::application::forms::{ContactReceipt, PostReceipt};
use crate::application::pagination::{PageRequest, PaginatedPosts};
use crate::application::posts::POST_SAVED_MESSAGE;
use crate::domain::entities::PostRecord;

use super::error::{ApiError, messages};
use super::models::{ContactCreateRequest, PaginatedQuery, PostCreateRequest, SlugQuery};
use super::state::ApiState;

const SOURCE_BLOGS: &str = "infra::http::api::blogs";
const SOURCE_GETBLOG: &str = "infra::http::api::getblog";
const SOURCE_POSTBLOG: &str = "infra::http::api::postblog";
const SOURCE_POSTCONTACT: &str = "infra::http::api::postcontact";
const SOURCE_PAGINATED: &str = "infra::http::api::blogs_paginated";

pub async fn list_posts(State(state): State<ApiState>) -> Result<Json<Vec<PostRecord>>, ApiError> {
    let posts = state
        .posts
        .list_recent()
        .await
        .map_err(|err| ApiError::from_post_error(SOURCE_BLOGS, err, messages::FETCH_BLOGS_FAILED))?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<ApiState>,
    query: Result<Query<SlugQuery>, QueryRejection>,
) -> Result<Json<PostRecord>, ApiError> {
    let Query(query) = query.map_err(|err| {
        ApiError::with_cause(
            SOURCE_GETBLOG,
            StatusCode::BAD_REQUEST,
            messages::BLOG_NOT_FOUND,
            &err,
        )
    })?;
    let slug = query.slug.unwrap_or_default();

    let post = state.posts.find_by_slug(&slug).await.map_err(|err| {
        ApiError::from_post_error(SOURCE_GETBLOG, err, messages::FETCH_BLOG_FAILED)
    })?;
    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<ApiState>,
    payload: Result<Json<PostCreateRequest>, JsonRejection>,
) -> Result<Json<PostReceipt>, ApiError> {
    let Json(request) = payload.map_err(|err| {
        ApiError::with_cause(
            SOURCE_POSTBLOG,
            StatusCode::BAD_REQUEST,
            messages::INVALID_BODY,
            &err,
        )
    })?;

    let blog = state
        .posts
        .create_post(request.into())
        .await
        .map_err(|err| ApiError::from_post_error(SOURCE_POSTBLOG, err, messages::SAVE_BLOG_FAILED))?;

    Ok(Json(PostReceipt {
        success: true,
        message: POST_SAVED_MESSAGE.to_string(),
        blog,
    }))
}

pub async fn submit_contact(
    State(state): State<ApiState>,
    payload: Result<Json<ContactCreateRequest>, JsonRejection>,
) -> Result<Json<ContactReceipt>, ApiError> {
    let Json(request) = payload.map_err(|err| {
        ApiError::with_cause(
            SOURCE_POSTCONTACT,
            StatusCode::BAD_REQUEST,
            messages::INVALID_BODY,
            &err,
        )
    })?;

    let record = state
        .contact
        .submit(request.into())
        .await
        .map_err(|err| ApiError::from_contact_error(SOURCE_POSTCONTACT, err))?;

    Ok(Json(ContactReceipt {
        success: true,
        message: CONTACT_SUCCESS_MESSAGE.to_string(),
        id: record.id,
    }))
}

pub async fn list_posts_paginated(
    State(state): State<ApiState>,
    query: Result<Query<PaginatedQuery>, QueryRejection>,
) -> Result<Json<PaginatedPosts>, ApiError> {
    let Query(query) = query.map_err(|err| {
        ApiError::with_cause(
            SOURCE_PAGINATED,
            StatusCode::BAD_REQUEST,
            messages::FETCH_BLOGS_FAILED,
            &err,
        )
    })?;

    let request = PageRequest::from_query(
        query.page.as_deref(),
        query.limit.as_deref(),
        query.tags.as_deref(),
    )?;

    let page = state
        .posts
        .list_paginated(&request)
        .await
        .map_err(|err| {
            ApiError::from_post_error(SOURCE_PAGINATED, err, messages::FETCH_BLOGS_FAILED)
        })?;
    Ok(Json(page))
}

pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::new(
        "infra::http::api",
        StatusCode::METHOD_NOT_ALLOWED,
        format!("Method {method} not allowed"),
    )
}
