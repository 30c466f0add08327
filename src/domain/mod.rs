//! Domain layer types and invariants.

pub mod contact;
pub mod document;
pub mod entities;
pub mod error;
pub mod slug;
pub mod tags;
