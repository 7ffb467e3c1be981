//! Anchor extraction from HTML documents.
//!
//! Best-effort parsing: malformed markup yields whatever anchors the parser
//! can recover, and empty or non-HTML input yields an empty sequence. This
//! function never returns an error; a listing page that fails to parse
//! simply produces no links, which downstream code surfaces as an empty
//! snapshot.

use scraper::{Html, Selector};

/// One anchor tag lifted from a page, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    /// The href attribute exactly as it appeared in the source markup,
    /// percent-encoding included. Empty string when the anchor had no href.
    pub href: String,
    /// Visible link text with surrounding whitespace stripped.
    pub text: String,
    /// The title attribute, when present.
    pub title: Option<String>,
    /// The class attribute verbatim (HTML already space-separates classes).
    pub class_attr: Option<String>,
}

impl RawLink {
    /// Returns true when the class attribute contains the given class name.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.class_attr
            .as_deref()
            .is_some_and(|attr| attr.split_ascii_whitespace().any(|c| c == class))
    }
}

/// Extracts every anchor tag from an HTML document, preserving document order.
///
/// The extraction is tolerant by design: unclosed tags, stray markup, and
/// non-HTML text all degrade to "fewer anchors", never to an error.
#[must_use]
pub fn extract_links(html: &str) -> Vec<RawLink> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let document = Html::parse_document(html);

    // The selector is a constant and known to be valid; an empty result is
    // the correct degradation if that ever stopped being true.
    let Ok(selector) = Selector::parse("a") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| {
            let value = element.value();
            RawLink {
                href: value.attr("href").unwrap_or_default().to_string(),
                text: element.text().collect::<String>().trim().to_string(),
                title: value.attr("title").map(str::to_string),
                class_attr: value.attr("class").map(str::to_string),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_links_empty_input_returns_empty() {
        assert!(extract_links("").is_empty());
        assert!(extract_links("   \n\t ").is_empty());
    }

    #[test]
    fn test_extract_links_non_html_returns_empty() {
        assert!(extract_links("just some plain text, no markup").is_empty());
        assert!(extract_links("{\"json\": true}").is_empty());
    }

    #[test]
    fn test_extract_links_preserves_document_order() {
        let html = r#"<html><body>
            <a href="first/">First</a>
            <a href="second.zip">Second</a>
            <a href="third/">Third</a>
        </body></html>"#;

        let links = extract_links(html);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].href, "first/");
        assert_eq!(links[1].href, "second.zip");
        assert_eq!(links[2].href, "third/");
    }

    #[test]
    fn test_extract_links_captures_attributes() {
        let html = r#"<a href="file.zip" title="A file" class="menu wide">Download</a>"#;

        let links = extract_links(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "file.zip");
        assert_eq!(links[0].text, "Download");
        assert_eq!(links[0].title.as_deref(), Some("A file"));
        assert_eq!(links[0].class_attr.as_deref(), Some("menu wide"));
    }

    #[test]
    fn test_extract_links_missing_attributes_default() {
        let html = "<a>No href at all</a>";

        let links = extract_links(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "");
        assert_eq!(links[0].title, None);
        assert_eq!(links[0].class_attr, None);
    }

    #[test]
    fn test_extract_links_strips_text_whitespace() {
        let html = "<a href=\"x/\">\n   spaced out   \n</a>";

        let links = extract_links(html);
        assert_eq!(links[0].text, "spaced out");
    }

    #[test]
    fn test_extract_links_tolerates_malformed_markup() {
        // Unclosed tags and stray brackets; the parser recovers what it can.
        let html = r#"<table><tr><td><a href="a.zip">A<a href="b.zip">B"#;

        let links = extract_links(html);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "a.zip");
        assert_eq!(links[1].href, "b.zip");
    }

    #[test]
    fn test_has_class_matches_whole_words() {
        let link = RawLink {
            href: "/catalog".to_string(),
            text: "Catalog".to_string(),
            title: None,
            class_attr: Some("menu-wide menu".to_string()),
        };
        assert!(link.has_class("menu"));
        assert!(!link.has_class("wide"));

        let bare = RawLink {
            href: "x".to_string(),
            text: String::new(),
            title: None,
            class_attr: None,
        };
        assert!(!bare.has_class("menu"));
    }

    #[test]
    fn test_extract_links_keeps_percent_encoding_verbatim() {
        let html = r#"<a href="Game%20%28USA%29.zip">Game (USA).zip</a>"#;

        let links = extract_links(html);
        assert_eq!(links[0].href, "Game%20%28USA%29.zip");
    }
}
