//! Application services layer.

pub mod contact;
pub mod editor;
pub mod error;
pub mod forms;
pub mod importer;
pub mod pagination;
pub mod posts;
pub mod repos;
pub mod sanitize;
