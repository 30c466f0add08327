//! Deterministic URL slugs derived from post titles.
//!
//! The rules mirror what authors see in the writing form: the title is
//! lowercased, anything that is not an ASCII word character, whitespace or a
//! hyphen is dropped, and every run of whitespace, underscores and hyphens
//! collapses into a single `-`. Leading and trailing hyphens are trimmed, so
//! `"Hello, World! 2025"` becomes `hello-world-2025`.

use thiserror::Error;

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive a slug from the provided title.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Infallible variant of [`derive_slug`]; returns an empty string when the
/// title contains no slug-worthy characters.
pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let mut output = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !output.is_empty() {
                output.push('-');
            }
            pending_separator = false;
            output.push(ch);
        } else if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_separator = true;
        }
        // Everything else is stripped without acting as a separator, so
        // "don't" stays one word.
    }

    output
}

/// Whether `slug` already has the canonical shape produced by [`slugify`].
pub fn is_valid_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return false;
    }
    slug.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
