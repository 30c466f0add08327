use std::sync::Arc;

use crate::application::contact::ContactService;
use crate::application::posts::PostService;

use super::rate_limit::ApiRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub posts: Arc<PostService>,
    pub contact: Arc<ContactService>,
    pub rate_limiter: Arc<ApiRateLimiter>,
}
