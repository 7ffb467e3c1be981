//! Navigation state machine over the remote listing tree.
//!
//! The navigator tracks the user's position as a stack of visited listing
//! URLs (top = current; the root is never popped) and owns the transitions
//! between its states:
//!
//! ```text
//! Idle --open--> Loading --success--> Loaded --descend/back/refresh--> Loading ...
//!                   |
//!                   +--failure--> Error --retry--> Loading
//! ```
//!
//! Only one listing fetch is in flight at a time. Operations issued while a
//! load is running are rejected with [`NavError::Busy`] rather than racing
//! two fetches into the same cache slot.
//!
//! Fetch and parse failures never cross this boundary as Rust errors: they
//! become the `Error` state plus a [`Event::NavigationError`] emission. The
//! `Result` returns of the operations cover caller mistakes only (busy
//! rejection, descending a file entry, malformed URLs).

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::events::{Event, EventSender};
use crate::fetch::{FetchCache, Transport};
use crate::listing::{Entry, EntryKind, ListingSnapshot, extract_links, resolve};

/// Where the navigator currently is.
#[derive(Debug, Clone)]
pub enum NavState {
    /// Nothing opened yet.
    Idle,
    /// A listing fetch is in flight.
    Loading {
        /// The URL being fetched.
        url: String,
    },
    /// A listing is current and renderable.
    Loaded(ListingSnapshot),
    /// The last load failed; `retry` re-attempts the same URL.
    Error {
        /// The URL that failed to load.
        url: String,
        /// Human-readable failure description.
        reason: String,
    },
}

/// Caller errors from navigation operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavError {
    /// An operation was issued while a load was in flight.
    #[error("navigation busy loading {url}")]
    Busy {
        /// The URL currently loading.
        url: String,
    },

    /// The URL does not parse as an absolute http(s) URL.
    #[error("invalid listing URL: {url}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
    },

    /// `descend` was called with a file entry.
    #[error("cannot descend into file entry: {name}")]
    NotADirectory {
        /// Display name of the offending entry.
        name: String,
    },

    /// The operation needs a current listing and none is loaded.
    #[error("no listing loaded")]
    NothingLoaded,

    /// `retry` was called outside the error state.
    #[error("nothing to retry")]
    NothingToRetry,
}

/// Navigation state machine with its URL stack and shared page cache.
pub struct Navigator {
    transport: Arc<dyn Transport>,
    cache: Arc<FetchCache>,
    events: EventSender,
    state: NavState,
    stack: Vec<String>,
}

impl Navigator {
    /// Creates an idle navigator.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<FetchCache>, events: EventSender) -> Self {
        Self {
            transport,
            cache,
            events,
            state: NavState::Idle,
            stack: Vec::new(),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &NavState {
        &self.state
    }

    /// Returns the current snapshot, when one is loaded.
    #[must_use]
    pub fn current_snapshot(&self) -> Option<&ListingSnapshot> {
        match &self.state {
            NavState::Loaded(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// Returns the visited-URL stack, top = current.
    #[must_use]
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    /// Current depth in the tree (1 = root listing).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Opens a root listing, replacing any existing navigation history.
    ///
    /// # Errors
    ///
    /// [`NavError::Busy`] while a load is in flight; [`NavError::InvalidUrl`]
    /// when the URL does not parse. A failed fetch is not an `Err`: it
    /// surfaces as the `Error` state and a `NavigationError` event.
    #[instrument(skip(self))]
    pub async fn open(&mut self, url: &str) -> Result<(), NavError> {
        self.ensure_not_busy()?;
        let parsed = parse_listing_url(url)?;
        self.stack = vec![parsed.as_str().to_string()];
        self.load(parsed, true).await;
        Ok(())
    }

    /// Descends into a directory entry of the current listing, pushing it
    /// onto the navigation stack.
    ///
    /// # Errors
    ///
    /// [`NavError::Busy`] while loading, [`NavError::NothingLoaded`] unless
    /// a listing is current, [`NavError::NotADirectory`] for file entries.
    #[instrument(skip(self, entry), fields(target = %entry.absolute_url))]
    pub async fn descend(&mut self, entry: &Entry) -> Result<(), NavError> {
        self.ensure_not_busy()?;
        if !matches!(self.state, NavState::Loaded(_)) {
            return Err(NavError::NothingLoaded);
        }
        if entry.kind != EntryKind::Directory {
            return Err(NavError::NotADirectory {
                name: entry.display_name.clone(),
            });
        }
        let parsed = parse_listing_url(&entry.absolute_url)?;
        self.stack.push(parsed.as_str().to_string());
        self.load(parsed, true).await;
        Ok(())
    }

    /// Goes back to the previous listing. A no-op at the root: the root
    /// listing is never popped.
    ///
    /// # Errors
    ///
    /// [`NavError::Busy`] while a load is in flight.
    #[instrument(skip(self))]
    pub async fn back(&mut self) -> Result<(), NavError> {
        self.ensure_not_busy()?;
        if self.stack.len() <= 1 {
            debug!("back at root, ignoring");
            return Ok(());
        }
        self.stack.pop();
        let Some(previous) = self.stack.last().cloned() else {
            return Err(NavError::NothingLoaded);
        };
        let parsed = parse_listing_url(&previous)?;
        self.load(parsed, true).await;
        Ok(())
    }

    /// Re-fetches the current listing, bypassing the cache. The cached copy
    /// is invalidated first so staleness can be forced by the user.
    ///
    /// # Errors
    ///
    /// [`NavError::Busy`] while loading, [`NavError::NothingLoaded`] when
    /// nothing has been opened yet.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<(), NavError> {
        self.ensure_not_busy()?;
        let Some(current) = self.stack.last().cloned() else {
            return Err(NavError::NothingLoaded);
        };
        self.cache.invalidate(&current);
        let parsed = parse_listing_url(&current)?;
        self.load(parsed, false).await;
        Ok(())
    }

    /// Retries the failed load after an error.
    ///
    /// # Errors
    ///
    /// [`NavError::NothingToRetry`] unless the navigator is in its error
    /// state; [`NavError::Busy`] while a load is in flight.
    #[instrument(skip(self))]
    pub async fn retry(&mut self) -> Result<(), NavError> {
        self.ensure_not_busy()?;
        let NavState::Error { url, .. } = &self.state else {
            return Err(NavError::NothingToRetry);
        };
        let parsed = parse_listing_url(&url.clone())?;
        self.load(parsed, true).await;
        Ok(())
    }

    fn ensure_not_busy(&self) -> Result<(), NavError> {
        if let NavState::Loading { url } = &self.state {
            return Err(NavError::Busy { url: url.clone() });
        }
        Ok(())
    }

    /// Runs one load to completion: `Loading`, then `Loaded` or `Error`.
    async fn load(&mut self, url: Url, use_cache: bool) {
        let url_str = url.as_str().to_string();
        self.state = NavState::Loading {
            url: url_str.clone(),
        };

        match self
            .cache
            .get_or_fetch(&url_str, self.transport.as_ref(), use_cache)
            .await
        {
            Ok(response) => {
                let links = extract_links(&response.text_lossy());
                let snapshot = resolve(&links, &url);
                if snapshot.is_empty() && !response.body.is_empty() {
                    // Not promoted to an error: some listings really are
                    // empty, the consumer decides what "suspiciously empty"
                    // means.
                    warn!(url = %url_str, "listing parsed to zero entries");
                }
                debug!(url = %url_str, entries = snapshot.entries.len(), "listing loaded");
                let _ = self.events.send(Event::ListingUpdated(snapshot.clone()));
                self.state = NavState::Loaded(snapshot);
            }
            Err(error) => {
                let reason = error.to_string();
                warn!(url = %url_str, %reason, "listing load failed");
                let _ = self.events.send(Event::NavigationError {
                    url: url_str.clone(),
                    reason: reason.clone(),
                });
                self.state = NavState::Error {
                    url: url_str,
                    reason,
                };
            }
        }
    }
}

fn parse_listing_url(url: &str) -> Result<Url, NavError> {
    let parsed = Url::parse(url).map_err(|_| NavError::InvalidUrl {
        url: url.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(NavError::InvalidUrl {
            url: url.to_string(),
        });
    }
    Ok(parsed)
}
