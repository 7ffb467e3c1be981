//! Resolution of raw anchors into navigable listing entries.
//!
//! A raw anchor becomes an [`Entry`] only if it points somewhere useful:
//! empty hrefs, parent references, fragment-only links, and non-http(s)
//! schemes are dropped. Everything else is classified as a directory or a
//! file by its trailing separator, resolved to an absolute URL against the
//! page's own URL, and given a decoded display name.
//!
//! Source ordering is preserved throughout. Directory listings are usually
//! alphabetical, but the ordering can encode precedence (version, region)
//! that the user relies on, so the resolver never re-sorts.

use std::time::SystemTime;

use url::Url;

use super::anchor::RawLink;

/// Whether an entry points at a directory or a downloadable file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// The href ends with a path separator; descending into it yields
    /// another listing.
    Directory,
    /// Anything else; fetching it yields file content.
    File,
}

/// One resolved file-or-directory item parsed from a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Decoded, human-readable name.
    pub display_name: String,
    /// The href exactly as it appeared in the source page, percent-encoding
    /// included. This exact string is what gets appended to the listing URL
    /// when requesting the target; some remote filesystems distinguish
    /// byte-for-byte escaped forms.
    pub raw_href: String,
    /// Directory or file, classified by trailing separator on `raw_href`.
    pub kind: EntryKind,
    /// `raw_href` resolved against the listing page's own URL.
    pub absolute_url: String,
    /// True when the absolute URL points at a different host than the page
    /// it was found on. Cross-origin entries are retained and flagged, never
    /// dropped: menu-style pages intentionally link outward.
    pub is_external: bool,
}

impl Entry {
    /// Returns true for directory entries.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// The resolved view of one remote directory listing.
///
/// Immutable once constructed. `entries` preserves the source page's anchor
/// order.
#[derive(Debug, Clone)]
pub struct ListingSnapshot {
    /// The URL that was fetched to produce this snapshot.
    pub source_url: String,
    /// When the page content was retrieved.
    pub fetched_at: SystemTime,
    /// Resolved entries in document order.
    pub entries: Vec<Entry>,
}

impl ListingSnapshot {
    /// Iterates over directory entries only.
    pub fn directories(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Directory)
    }

    /// Iterates over file entries only.
    pub fn files(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::File)
    }

    /// Returns true when the snapshot holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves raw anchors into a [`ListingSnapshot`] for the given page URL.
///
/// Dropped links: empty hrefs, parent references (`..`/`../`), fragment-only
/// hrefs (`#...`), hrefs that fail RFC 3986 resolution, and any scheme other
/// than http/https.
#[must_use]
pub fn resolve(raw_links: &[RawLink], page_url: &Url) -> ListingSnapshot {
    let entries = raw_links
        .iter()
        .filter_map(|link| resolve_one(link, page_url))
        .collect();

    ListingSnapshot {
        source_url: page_url.as_str().to_string(),
        fetched_at: SystemTime::now(),
        entries,
    }
}

/// Resolves only anchors carrying the `menu` class.
///
/// Menu pages are navigation bars rather than listings; their anchors may
/// have no visible text, in which case a positional label stands in. The
/// result is a strict subset of what [`resolve`] would produce.
#[must_use]
pub fn resolve_menu(raw_links: &[RawLink], page_url: &Url) -> ListingSnapshot {
    let labeled: Vec<RawLink> = raw_links
        .iter()
        .filter(|link| link.has_class("menu"))
        .enumerate()
        .map(|(i, link)| {
            let mut link = link.clone();
            if link.text.is_empty() {
                link.text = format!("Menu Item {}", i + 1);
            }
            link
        })
        .collect();

    resolve(&labeled, page_url)
}

fn resolve_one(link: &RawLink, page_url: &Url) -> Option<Entry> {
    let href = link.href.as_str();
    if href.is_empty() || href == ".." || href == "../" || href.starts_with('#') {
        return None;
    }

    let absolute = page_url.join(href).ok()?;
    if !matches!(absolute.scheme(), "http" | "https") {
        return None;
    }

    let kind = if href.ends_with('/') {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    // Visible link text wins when the page supplies one; otherwise decode
    // the last path segment of the href.
    let display_name = if link.text.is_empty() {
        name_from_href(href)
    } else {
        link.text.clone()
    };

    let is_external = absolute.host_str() != page_url.host_str()
        || absolute.port_or_known_default() != page_url.port_or_known_default();

    Some(Entry {
        display_name,
        raw_href: href.to_string(),
        kind,
        absolute_url: absolute.into(),
        is_external,
    })
}

/// Derives a display name from the last path segment of an href,
/// percent-decoded as UTF-8. Decode failures fall back to the literal
/// segment text rather than raising.
fn name_from_href(raw_href: &str) -> String {
    let trimmed = raw_href.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => segment.to_string(),
    }
}
