//! Per-run wiring of the core's owned state.
//!
//! A [`Session`] replaces what an earlier prototype kept in module-level
//! globals (shared HTTP client, cache maps, a progress singleton) with
//! explicit owned state: one validated config, one transport, one shared
//! page cache, and the sending half of the event channel. Components that
//! need any of these get them from the session by reference or cheap clone.

use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::download::{DownloadTask, Orchestrator};
use crate::events::{EventReceiver, EventSender, event_channel};
use crate::fetch::{FetchCache, HttpTransport, Transport};
use crate::filter::FilterConfig;
use crate::listing::Entry;
use crate::nav::Navigator;

/// Owned state for one run of the tool.
pub struct Session {
    config: Config,
    transport: Arc<dyn Transport>,
    cache: Arc<FetchCache>,
    events: EventSender,
}

impl Session {
    /// Validates the config and builds the session plus the receiving half
    /// of its event channel.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from validation; nothing is constructed on
    /// failure.
    pub fn new(mut config: Config) -> Result<(Self, EventReceiver), ConfigError> {
        config.normalize();
        config.validate()?;

        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(config.timeout(), &config.user_agent));
        let (events, receiver) = event_channel();

        Ok((
            Self {
                config,
                transport,
                cache: Arc::new(FetchCache::new()),
                events,
            },
            receiver,
        ))
    }

    /// The validated config snapshot.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared page cache.
    #[must_use]
    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// The filename filter for this run.
    #[must_use]
    pub fn filter(&self) -> FilterConfig {
        self.config.filter()
    }

    /// Creates a navigator over this session's transport and cache.
    #[must_use]
    pub fn navigator(&self) -> Navigator {
        Navigator::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.cache),
            self.events.clone(),
        )
    }

    /// Creates an orchestrator for one batch using this session's retry
    /// settings. Each batch needs its own orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            Arc::clone(&self.transport),
            self.config.retry_policy(),
            self.events.clone(),
        )
    }

    /// Fetches one page through the session cache. Used for menu pages and
    /// diagnostics where the caller wants raw content rather than a
    /// navigator transition.
    ///
    /// # Errors
    ///
    /// Propagates the transport's [`crate::fetch::FetchError`].
    pub async fn fetch_page(
        &self,
        url: &str,
    ) -> Result<crate::fetch::FetchResponse, crate::fetch::FetchError> {
        self.cache
            .get_or_fetch(url, self.transport.as_ref(), true)
            .await
    }

    /// Turns selected file entries into a pending task batch targeting the
    /// configured download directory.
    #[must_use]
    pub fn make_tasks(&self, entries: Vec<Entry>) -> Vec<DownloadTask> {
        entries
            .into_iter()
            .enumerate()
            .map(|(id, entry)| DownloadTask::new(id, entry, &self.config.download_directory))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::listing::EntryKind;

    #[test]
    fn test_session_rejects_invalid_config() {
        let config = Config {
            base_url: "nope".to_string(),
            ..Config::default()
        };
        assert!(Session::new(config).is_err());
    }

    #[test]
    fn test_make_tasks_assigns_sequential_ids() {
        let (session, _rx) = Session::new(Config::default()).unwrap();
        let entries = vec![
            Entry {
                display_name: "a.zip".to_string(),
                raw_href: "a.zip".to_string(),
                kind: EntryKind::File,
                absolute_url: "https://host/a.zip".to_string(),
                is_external: false,
            },
            Entry {
                display_name: "b.zip".to_string(),
                raw_href: "b.zip".to_string(),
                kind: EntryKind::File,
                absolute_url: "https://host/b.zip".to_string(),
                is_external: false,
            },
        ];

        let tasks = session.make_tasks(entries);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, 0);
        assert_eq!(tasks[1].id, 1);
        assert!(tasks[1].destination.ends_with("b.zip"));
    }

    #[test]
    fn test_session_normalizes_config() {
        let config = Config {
            base_url: "https://host/".to_string(),
            start_path: "files/".to_string(),
            ..Config::default()
        };
        let (session, _rx) = Session::new(config).unwrap();
        assert_eq!(session.config().full_url(), "https://host/files/");
    }
}
