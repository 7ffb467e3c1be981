//! Listing pages: anchor extraction and entry resolution.
//!
//! A listing is a directory-index web page enumerating files and
//! subdirectories as hyperlinks. This module turns the raw HTML of such a
//! page into an ordered [`ListingSnapshot`] of navigable [`Entry`] values:
//!
//! 1. [`extract_links`] lifts every anchor tag out of the markup, in
//!    document order, without ever failing on malformed input.
//! 2. [`resolve`] classifies each anchor as a directory or file, resolves
//!    its href against the page URL, and decodes a human-readable name.
//!
//! The same machinery handles "menu" pages (navigation bars built from
//! anchors carrying a `menu` class) via [`resolve_menu`], which is a strict
//! subset of the general resolution.

mod anchor;
mod resolver;

pub use anchor::{RawLink, extract_links};
pub use resolver::{Entry, EntryKind, ListingSnapshot, resolve, resolve_menu};
