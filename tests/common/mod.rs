#![allow(dead_code)]

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use creator_circle::application::contact::ContactService;
use creator_circle::application::posts::PostService;
use creator_circle::application::repos::{
    ContactsRepo, CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, StoreHealth,
};
use creator_circle::domain::contact::NewContactMessage;
use creator_circle::domain::entities::{ContactMessageRecord, PostRecord};
use creator_circle::infra::http::{ApiRateLimiter, ApiState, RouterState};

/// Repository double backed by vectors; slugs are unique like the real index.
#[derive(Default)]
pub struct InMemoryStore {
    posts: Mutex<Vec<PostRecord>>,
    contacts: Mutex<Vec<ContactMessageRecord>>,
    unhealthy: AtomicBool,
}

impl InMemoryStore {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn seed(&self, post: PostRecord) {
        self.posts.lock().await.push(post);
    }

    pub async fn posts(&self) -> Vec<PostRecord> {
        self.posts.lock().await.clone()
    }

    pub async fn contacts(&self) -> Vec<ContactMessageRecord> {
        self.contacts.lock().await.clone()
    }

    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl PostsRepo for InMemoryStore {
    async fn list_posts(&self) -> Result<Vec<PostRecord>, RepoError> {
        let mut posts = self.posts.lock().await.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        Ok(self
            .posts
            .lock()
            .await
            .iter()
            .find(|post| post.slug == slug)
            .cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().await;
        if posts.iter().any(|post| post.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_key".to_string(),
            });
        }

        let record = PostRecord {
            id: Uuid::new_v4(),
            title: params.title,
            slug: params.slug,
            content: params.content,
            author: params.author,
            meta_description: params.meta_description,
            tags: params.tags,
            created_at: OffsetDateTime::now_utc(),
        };
        posts.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl ContactsRepo for InMemoryStore {
    async fn create_contact_message(
        &self,
        message: NewContactMessage,
    ) -> Result<ContactMessageRecord, RepoError> {
        let record = ContactMessageRecord {
            id: Uuid::new_v4(),
            name: message.name,
            email: message.email,
            phone: message.phone,
            description: message.description,
            created_at: OffsetDateTime::now_utc(),
        };
        self.contacts.lock().await.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    async fn health_check(&self) -> Result<(), RepoError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            Err(RepoError::from_persistence("store offline"))
        } else {
            Ok(())
        }
    }
}

pub fn post(title: &str, tags: &[&str], minutes_ago: i64) -> PostRecord {
    PostRecord {
        id: Uuid::new_v4(),
        title: title.to_string(),
        slug: creator_circle::domain::slug::slugify(title),
        content: format!("<p>{title}</p>"),
        author: "Ada".to_string(),
        meta_description: format!("About {title}"),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        created_at: OffsetDateTime::now_utc() - time::Duration::minutes(minutes_ago),
    }
}

pub fn router_state(store: Arc<InMemoryStore>, max_requests: u32) -> RouterState {
    router_state_with_proxies(store, max_requests, Vec::new())
}

pub fn router_state_with_proxies(
    store: Arc<InMemoryStore>,
    max_requests: u32,
    trusted_proxies: Vec<IpAddr>,
) -> RouterState {
    let reader: Arc<dyn PostsRepo> = store.clone();
    let writer: Arc<dyn PostsWriteRepo> = store.clone();
    let contacts: Arc<dyn ContactsRepo> = store.clone();
    let health: Arc<dyn StoreHealth> = store;

    RouterState {
        api: ApiState {
            posts: Arc::new(PostService::new(reader, writer)),
            contact: Arc::new(ContactService::new(contacts)),
            rate_limiter: Arc::new(
                ApiRateLimiter::new(Duration::from_secs(60), max_requests)
                    .with_trusted_proxies(trusted_proxies),
            ),
        },
        health,
    }
}
