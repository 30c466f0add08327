mod common;

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use creator_circle::infra::http::build_router;

use common::{InMemoryStore, post, router_state, router_state_with_proxies};

async fn send(router: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn valid_post_body() -> Value {
    json!({
        "title": "Grow on TikTok",
        "slug": "grow-on-tiktok",
        "content": "<p>Post <b>early</b><script>alert(1)</script></p>",
        "author": "Ada",
        "metadesc": "x".repeat(200),
        "tags": ["TikTok", "Growth Strategies"]
    })
}

#[tokio::test]
async fn blogs_lists_newest_first() {
    let store = InMemoryStore::shared();
    store.seed(post("Older", &["AI"], 30)).await;
    store.seed(post("Newer", &["AI"], 5)).await;
    let router = build_router(router_state(store, 10));

    let (status, body) = send(router, get("/api/blogs")).await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|post| post["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["Newer", "Older"]);
    assert!(body[0]["createdAt"].is_string());
    assert!(body[0]["metadesc"].is_string());
}

#[tokio::test]
async fn getblog_returns_post_or_404() {
    let store = InMemoryStore::shared();
    store.seed(post("Viral Hooks", &["Viral Marketing"], 1)).await;
    let router = build_router(router_state(store, 10));

    let (status, body) = send(router.clone(), get("/api/getblog?slug=viral-hooks")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Viral Hooks");

    let (status, body) = send(router.clone(), get("/api/getblog?slug=missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Blog not found"}));

    let (status, _) = send(router, get("/api/getblog")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn postblog_stores_sanitized_post() {
    let store = InMemoryStore::shared();
    let router = build_router(router_state(store.clone(), 10));

    let (status, body) = send(router, post_json("/api/postblog", valid_post_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Blog post saved to database!");
    assert_eq!(body["blog"]["slug"], "grow-on-tiktok");
    assert_eq!(
        body["blog"]["metadesc"].as_str().expect("metadesc").chars().count(),
        160
    );

    let stored = store.posts().await;
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].content.contains("<script>"));
    assert!(stored[0].content.contains("<b>early</b>"));
}

#[tokio::test]
async fn postblog_accepts_legacy_joined_tags() {
    let store = InMemoryStore::shared();
    let router = build_router(router_state(store.clone(), 10));
    let mut body = valid_post_body();
    body["tags"] = json!("AI, Tools");

    let (status, _) = send(router, post_json("/api/postblog", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.posts().await[0].tags, vec!["AI", "Tools"]);
}

#[tokio::test]
async fn postblog_rejects_missing_fields() {
    let store = InMemoryStore::shared();
    let router = build_router(router_state(store.clone(), 10));

    let (status, body) = send(
        router,
        post_json("/api/postblog", json!({"title": "Only a title"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing required fields."}));
    assert!(store.posts().await.is_empty());
}

#[tokio::test]
async fn postblog_rejects_unknown_or_too_many_tags() {
    let store = InMemoryStore::shared();
    let router = build_router(router_state(store.clone(), 10));

    let mut body = valid_post_body();
    body["tags"] = json!(["AI", "Tools", "Business"]);
    let (status, _) = send(router.clone(), post_json("/api/postblog", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = valid_post_body();
    body["tags"] = json!(["Cooking"]);
    let (status, _) = send(router, post_json("/api/postblog", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(store.posts().await.is_empty());
}

#[tokio::test]
async fn postblog_duplicate_slug_conflicts() {
    let store = InMemoryStore::shared();
    let router = build_router(router_state(store, 10));

    let (status, _) = send(router.clone(), post_json("/api/postblog", valid_post_body())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(router, post_json("/api/postblog", valid_post_body())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn postblog_rejects_malformed_json() {
    let router = build_router(router_state(InMemoryStore::shared(), 10));
    let request = Request::builder()
        .method("POST")
        .uri("/api/postblog")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");

    let (status, body) = send(router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn postcontact_validates_and_stores() {
    let store = InMemoryStore::shared();
    let router = build_router(router_state(store.clone(), 10));

    let (status, body) = send(
        router.clone(),
        post_json(
            "/api/postcontact",
            json!({"name": "Ada", "email": "foo.bar", "phone": "", "desc": "Hi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid email format. Email must contain @ symbol."
    );

    let (status, body) = send(
        router.clone(),
        post_json(
            "/api/postcontact",
            json!({"name": "Ada", "email": "a@b.co", "phone": "+1 234 567", "desc": "Hi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .expect("error")
            .starts_with("Invalid phone format.")
    );

    let (status, body) = send(
        router.clone(),
        post_json("/api/postcontact", json!({"email": "a@b.co"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Missing required fields. Name, email, and message are required."
    );

    let (status, body) = send(
        router,
        post_json(
            "/api/postcontact",
            json!({"name": "Ada", "email": "a@b.co", "phone": "+1234567890", "desc": "Hi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Thank you for your message! We will get back to you soon."
    );

    let contacts = store.contacts().await;
    assert_eq!(contacts.len(), 1);
    assert_eq!(body["id"], contacts[0].id.to_string());
}

#[tokio::test]
async fn blogs_paginated_slices_sorted_titles() {
    let store = InMemoryStore::shared();
    for index in 0..13 {
        store
            .seed(post(&format!("Post {index:02}"), &["AI"], index))
            .await;
    }
    let router = build_router(router_state(store, 10));

    let (status, body) = send(router.clone(), get("/api/blogs-paginated?page=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blogs"].as_array().expect("blogs").len(), 6);
    assert_eq!(body["blogs"][0]["title"], "Post 00");
    assert_eq!(body["pagination"]["totalPages"], 3);
    assert_eq!(body["pagination"]["totalBlogs"], 13);
    assert_eq!(body["pagination"]["hasMore"], true);
    assert_eq!(body["pagination"]["pageSize"], 6);

    let (_, body) = send(router.clone(), get("/api/blogs-paginated?page=3&limit=6")).await;
    assert_eq!(body["blogs"].as_array().expect("blogs").len(), 1);
    assert_eq!(body["pagination"]["hasMore"], false);

    let (_, body) = send(router, get("/api/blogs-paginated?page=9")).await;
    assert!(body["blogs"].as_array().expect("blogs").is_empty());
    assert_eq!(body["pagination"]["currentPage"], 9);
}

#[tokio::test]
async fn blogs_paginated_filters_by_tag() {
    let store = InMemoryStore::shared();
    store.seed(post("Zeta", &["AI", "Business"], 1)).await;
    store.seed(post("Mid", &["Growth Strategies"], 2)).await;
    store.seed(post("alpha", &["AI"], 3)).await;
    let router = build_router(router_state(store, 10));

    let (status, body) = send(router, get("/api/blogs-paginated?tags=AI")).await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["blogs"]
        .as_array()
        .expect("blogs")
        .iter()
        .map(|post| post["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["alpha", "Zeta"]);
}

#[tokio::test]
async fn blogs_paginated_rejects_invalid_paging() {
    let router = build_router(router_state(InMemoryStore::shared(), 10));

    for uri in [
        "/api/blogs-paginated?page=0",
        "/api/blogs-paginated?limit=0",
        "/api/blogs-paginated?limit=101",
        "/api/blogs-paginated?page=abc",
    ] {
        let (status, body) = send(router.clone(), get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn write_routes_are_rate_limited() {
    let router = build_router(router_state(InMemoryStore::shared(), 1));
    let contact = json!({"name": "Ada", "email": "a@b.co", "desc": "Hi"});

    let (status, _) = send(router.clone(), post_json("/api/postcontact", contact.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let response = router
        .clone()
        .oneshot(post_json("/api/postcontact", contact))
        .await
        .expect("router response");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    let (status, _) = send(router, get("/api/blogs")).await;
    assert_eq!(status, StatusCode::OK);
}

fn contact_from(peer: &str, forwarded_for: &str) -> Request<Body> {
    let mut request = post_json(
        "/api/postcontact",
        json!({"name": "Ada", "email": "a@b.co", "desc": "Hi"}),
    );
    let peer: SocketAddr = peer.parse().expect("socket address");
    request.extensions_mut().insert(ConnectInfo(peer));
    request.headers_mut().insert(
        "x-forwarded-for",
        forwarded_for.parse().expect("header value"),
    );
    request
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_escape_the_limit() {
    let store = InMemoryStore::shared();
    let router = build_router(router_state(store.clone(), 1));

    let mut accepted = 0;
    for n in 0..20 {
        let request = contact_from("198.51.100.4:40000", &format!("203.0.113.{n}"));
        let (status, _) = send(router.clone(), request).await;
        if status == StatusCode::OK {
            accepted += 1;
        } else {
            assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(store.contacts().await.len(), 1);
}

#[tokio::test]
async fn trusted_proxy_forwards_client_addresses() {
    let store = InMemoryStore::shared();
    let proxy = "10.0.0.1".parse().expect("proxy address");
    let router = build_router(router_state_with_proxies(store.clone(), 1, vec![proxy]));

    for n in 0..3 {
        let request = contact_from("10.0.0.1:40000", &format!("203.0.113.{n}"));
        let (status, _) = send(router.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = send(router, contact_from("10.0.0.1:40001", "203.0.113.0")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(store.contacts().await.len(), 3);
}

#[tokio::test]
async fn wrong_method_is_reported_as_json() {
    let router = build_router(router_state(InMemoryStore::shared(), 10));

    let (status, body) = send(router, get("/api/postblog")).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"error": "Method GET not allowed"}));
}

#[tokio::test]
async fn health_probe_reflects_store_state() {
    let store = InMemoryStore::shared();
    let router = build_router(router_state(store.clone(), 10));

    let (status, _) = send(router.clone(), get("/_health/db")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    store.set_unhealthy(true);
    let (status, _) = send(router, get("/_health/db")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
