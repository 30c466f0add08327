//! HTTP implementation of the form submitters, talking to the JSON API.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::application::forms::{
    ContactReceipt, ContactSubmission, ContactSubmitter, PostReceipt, PostSubmission,
    PostSubmitter, SubmitError,
};
use crate::config::ClientSettings;

const POST_BLOG_PATH: &str = "api/postblog";
const POST_CONTACT_PATH: &str = "api/postcontact";

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid base url: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct HttpContentClient {
    client: Client,
    base: Url,
}

impl HttpContentClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientBuildError> {
        let base = with_trailing_slash(settings.base_url.clone())?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("creator-circle/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, SubmitError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|err| SubmitError::Network(err.to_string()))?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        Self::handle(response).await
    }

    async fn handle<T: DeserializeOwned>(response: Response) -> Result<T, SubmitError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = serde_json::from_slice::<serde_json::Value>(&bytes)
                .ok()
                .and_then(|value| value.get("error")?.as_str().map(str::to_string))
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| SubmitError::Network(format!("failed to parse body: {err}")))
    }
}

#[async_trait]
impl PostSubmitter for HttpContentClient {
    async fn submit_post(&self, submission: &PostSubmission) -> Result<PostReceipt, SubmitError> {
        self.post_json(POST_BLOG_PATH, submission).await
    }
}

#[async_trait]
impl ContactSubmitter for HttpContentClient {
    async fn submit_contact(
        &self,
        submission: &ContactSubmission,
    ) -> Result<ContactReceipt, SubmitError> {
        self.post_json(POST_CONTACT_PATH, submission).await
    }
}

fn transport_error(err: reqwest::Error) -> SubmitError {
    if err.is_timeout() {
        SubmitError::Timeout
    } else {
        SubmitError::Network(err.to_string())
    }
}

/// `Url::join` replaces the last segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Result<Url, url::ParseError> {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.join("")
}
