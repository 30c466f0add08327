//! Creator Circle: blog listing, rich-text authoring and a contact inbox.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
