//! Allow-list cleaning of stored post markup.

use std::collections::{HashMap, HashSet};

use ammonia::Builder as AmmoniaBuilder;
use once_cell::sync::Lazy;

static CONTENT_SANITIZER: Lazy<AmmoniaBuilder<'static>> = Lazy::new(build_content_sanitizer);

/// Restrict markup to what the editor itself produces.
pub(crate) fn build_content_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "b",
        "blockquote",
        "br",
        "em",
        "h1",
        "h2",
        "h3",
        "i",
        "li",
        "ol",
        "p",
        "strong",
        "u",
        "ul",
    ]);
    builder.tags(tags);
    builder.generic_attributes(HashSet::new());
    builder.tag_attributes(HashMap::from([("a", HashSet::from(["href"]))]));
    builder.link_rel(None);
    builder
}

pub fn sanitize_content(markup: &str) -> String {
    CONTENT_SANITIZER.clean(markup).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_editor_markup_untouched() {
        let markup = "<h2>Title</h2><p>Read <b>this</b> <a href=\"https://docs.rs\">doc</a></p><ul><li>one</li></ul><p><br></p>";
        assert_eq!(sanitize_content(markup), markup);
    }

    #[test]
    fn strips_scripts_and_foreign_attributes() {
        let cleaned = sanitize_content(
            "<p style=\"color:red\" onclick=\"x()\">Hi<script>alert(1)</script></p><a href=\"javascript:alert(1)\">x</a>",
        );
        assert_eq!(cleaned, "<p>Hi</p><a>x</a>");
    }
}
