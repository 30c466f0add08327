//! Page-number pagination over the full post collection.

use std::cmp::Ordering;

use feruca::Collator;
use serde::Serialize;
use thiserror::Error;

use crate::domain::entities::PostRecord;
use crate::domain::tags::split_joined;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 6;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page must be 1 or greater")]
    InvalidPage,
    #[error("limit must be between 1 and {MAX_PAGE_SIZE}, got {0}")]
    InvalidPageSize(u32),
    #[error("`{field}` must be a positive integer, got `{value}`")]
    Malformed { field: &'static str, value: String },
}

/// Validated listing request: 1-based page, page size and tag filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
    tags: Vec<String>,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32, tags: Vec<String>) -> Result<Self, PaginationError> {
        if page == 0 {
            return Err(PaginationError::InvalidPage);
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(PaginationError::InvalidPageSize(page_size));
        }
        Ok(Self {
            page,
            page_size,
            tags,
        })
    }

    /// Build a request from raw query-string values, applying defaults for
    /// absent or empty parameters.
    pub fn from_query(
        page: Option<&str>,
        limit: Option<&str>,
        tags: Option<&str>,
    ) -> Result<Self, PaginationError> {
        let page = parse_number("page", page)?.unwrap_or(DEFAULT_PAGE);
        let page_size = parse_number("limit", limit)?.unwrap_or(DEFAULT_PAGE_SIZE);
        let tags = tags.map(split_joined).unwrap_or_default();
        Self::new(page, page_size, tags)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

fn parse_number(field: &'static str, raw: Option<&str>) -> Result<Option<u32>, PaginationError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| PaginationError::Malformed {
            field,
            value: raw.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_blogs: u64,
    pub has_more: bool,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedPosts {
    pub blogs: Vec<PostRecord>,
    pub pagination: PaginationMeta,
}

/// Sort by title with the Unicode collation algorithm (root locale), then by
/// the raw title and the id so the order is total and repeatable.
pub fn sort_by_title(posts: &mut [PostRecord]) {
    let mut collator = Collator::default();
    posts.sort_by(|left, right| compare_titles(&mut collator, left, right));
}

fn compare_titles(collator: &mut Collator, left: &PostRecord, right: &PostRecord) -> Ordering {
    collator
        .collate(left.title.as_str(), right.title.as_str())
        .then_with(|| left.title.cmp(&right.title))
        .then_with(|| left.id.cmp(&right.id))
}

/// Filter by tag intersection, sort by title and slice out the requested page.
pub fn paginate(posts: Vec<PostRecord>, request: &PageRequest) -> PaginatedPosts {
    let mut retained: Vec<PostRecord> = if request.tags.is_empty() {
        posts
    } else {
        posts
            .into_iter()
            .filter(|post| post.has_any_tag(&request.tags))
            .collect()
    };
    sort_by_title(&mut retained);

    let total = retained.len() as u64;
    let page_size = u64::from(request.page_size);
    let start = u64::from(request.page - 1) * page_size;
    let end = start + page_size;

    let blogs = if start >= total {
        Vec::new()
    } else {
        retained
            .into_iter()
            .skip(start as usize)
            .take(request.page_size as usize)
            .collect()
    };

    PaginatedPosts {
        blogs,
        pagination: PaginationMeta {
            current_page: request.page,
            total_pages: total.div_ceil(page_size),
            total_blogs: total,
            has_more: end < total,
            page_size: request.page_size,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn post(title: &str, tags: &[&str]) -> PostRecord {
        PostRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: crate::domain::slug::slugify(title),
            content: "<p>body</p>".to_string(),
            author: "admin".to_string(),
            meta_description: String::new(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn thirteen_posts() -> Vec<PostRecord> {
        (1..=13).map(|n| post(&format!("Post {n:02}"), &[])).collect()
    }

    #[test]
    fn first_page_of_thirteen() {
        let request = PageRequest::new(1, 6, Vec::new()).expect("valid request");
        let page = paginate(thirteen_posts(), &request);

        assert_eq!(page.blogs.len(), 6);
        assert_eq!(page.blogs[0].title, "Post 01");
        assert_eq!(
            page.pagination,
            PaginationMeta {
                current_page: 1,
                total_pages: 3,
                total_blogs: 13,
                has_more: true,
                page_size: 6,
            }
        );
    }

    #[test]
    fn last_page_of_thirteen() {
        let request = PageRequest::new(3, 6, Vec::new()).expect("valid request");
        let page = paginate(thirteen_posts(), &request);

        assert_eq!(page.blogs.len(), 1);
        assert_eq!(page.blogs[0].title, "Post 13");
        assert!(!page.pagination.has_more);
    }

    #[test]
    fn page_beyond_the_end_is_empty() {
        let request = PageRequest::new(9, 6, Vec::new()).expect("valid request");
        let page = paginate(thirteen_posts(), &request);

        assert!(page.blogs.is_empty());
        assert!(!page.pagination.has_more);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[test]
    fn tag_filter_keeps_intersecting_posts_in_title_order() {
        let posts = vec![
            post("Zebra growth", &["AI", "Business"]),
            post("Middle", &["Growth Strategies"]),
            post("alpha launch", &["AI"]),
        ];
        let request = PageRequest::from_query(None, None, Some("AI")).expect("valid request");
        let page = paginate(posts, &request);

        let titles: Vec<_> = page.blogs.iter().map(|post| post.title.as_str()).collect();
        assert_eq!(titles, ["alpha launch", "Zebra growth"]);
        assert_eq!(page.pagination.total_blogs, 2);
    }

    fn sorted_titles(titles: &[&str]) -> Vec<String> {
        let mut posts: Vec<_> = titles.iter().map(|title| post(title, &[])).collect();
        sort_by_title(&mut posts);
        posts.into_iter().map(|post| post.title).collect()
    }

    #[test]
    fn title_sort_ignores_case_at_the_primary_level() {
        assert_eq!(
            sorted_titles(&["beta", "Beta", "Alpha"]),
            ["Alpha", "beta", "Beta"]
        );
    }

    #[test]
    fn accented_titles_sort_with_their_base_letter() {
        assert_eq!(
            sorted_titles(&["Zebra", "Éclair", "apple"]),
            ["apple", "Éclair", "Zebra"]
        );
        assert_eq!(
            sorted_titles(&["Ökonomie", "Opal", "Pixel", "oak"]),
            ["oak", "Ökonomie", "Opal", "Pixel"]
        );
    }

    #[test]
    fn accented_titles_page_in_collation_order() {
        let posts = vec![post("Zebra", &[]), post("Éclair", &[]), post("apple", &[])];
        let request = PageRequest::new(1, 2, Vec::new()).expect("valid request");
        let page = paginate(posts, &request);

        let titles: Vec<_> = page.blogs.iter().map(|post| post.title.as_str()).collect();
        assert_eq!(titles, ["apple", "Éclair"]);
        assert!(page.pagination.has_more);
    }

    #[test]
    fn identical_inputs_produce_identical_output() {
        let posts = thirteen_posts();
        let request = PageRequest::new(2, 5, Vec::new()).expect("valid request");

        let first = serde_json::to_string(&paginate(posts.clone(), &request)).expect("json");
        let second = serde_json::to_string(&paginate(posts, &request)).expect("json");
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_requests_are_rejected() {
        assert_eq!(
            PageRequest::from_query(Some("0"), None, None),
            Err(PaginationError::InvalidPage)
        );
        assert_eq!(
            PageRequest::from_query(None, Some("0"), None),
            Err(PaginationError::InvalidPageSize(0))
        );
        assert_eq!(
            PageRequest::from_query(None, Some("101"), None),
            Err(PaginationError::InvalidPageSize(101))
        );
        assert!(matches!(
            PageRequest::from_query(Some("two"), None, None),
            Err(PaginationError::Malformed { field: "page", .. })
        ));
    }

    #[test]
    fn defaults_apply_to_missing_and_blank_parameters() {
        let request = PageRequest::from_query(Some(""), None, Some(" , ")).expect("valid");
        assert_eq!(request.page(), DEFAULT_PAGE);
        assert_eq!(request.page_size(), DEFAULT_PAGE_SIZE);
        assert!(request.tags().is_empty());
    }
}
