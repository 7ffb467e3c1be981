//! Include/exclude filename filtering.
//!
//! Filters are plain case-sensitive substring patterns, not globs or
//! regexes, matched against the **decoded** display name of an entry. The
//! decoded form was chosen (over the raw percent-encoded href) so that
//! patterns read the way filenames render: `(USA)`, not `%28USA%29`.
//! Patterns authored against encoded tokens will never match and must be
//! re-authored in decoded form.

/// Immutable include/exclude pattern sets for one operation.
///
/// Evaluation order is fixed and is a design invariant: the include check
/// runs first (an entry must contain at least one include pattern when the
/// set is non-empty), then the exclude check (an entry containing any
/// exclude pattern is dropped). Exclude therefore always wins over include
/// when patterns conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl FilterConfig {
    /// Creates a filter from include and exclude pattern sets.
    #[must_use]
    pub fn new(include_patterns: Vec<String>, exclude_patterns: Vec<String>) -> Self {
        Self {
            include_patterns,
            exclude_patterns,
        }
    }

    /// Creates a filter that keeps everything.
    #[must_use]
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Returns the configured include patterns.
    #[must_use]
    pub fn include_patterns(&self) -> &[String] {
        &self.include_patterns
    }

    /// Returns the configured exclude patterns.
    #[must_use]
    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }

    /// Decides whether a file with the given decoded display name is kept.
    ///
    /// Pure function, no I/O. An empty include set means "include
    /// everything"; the exclude check runs after the include check and
    /// short-circuits on the first match.
    #[must_use]
    pub fn keep(&self, display_name: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self
                .include_patterns
                .iter()
                .any(|p| display_name.contains(p.as_str()))
        {
            return false;
        }

        !self
            .exclude_patterns
            .iter()
            .any(|p| display_name.contains(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str]) -> FilterConfig {
        FilterConfig::new(
            include.iter().map(ToString::to_string).collect(),
            exclude.iter().map(ToString::to_string).collect(),
        )
    }

    #[test]
    fn test_no_filters_accepts_everything() {
        let f = filter(&[], &[]);
        assert!(f.keep("anything at all.zip"));
        assert!(f.keep(""));
    }

    #[test]
    fn test_include_requires_at_least_one_match() {
        let f = filter(&["(USA)", "(World)"], &[]);
        assert!(f.keep("Game (USA).zip"));
        assert!(f.keep("Game (World).zip"));
        assert!(!f.keep("Game (Japan).zip"));
    }

    #[test]
    fn test_exclude_drops_matches() {
        let f = filter(&[], &["(Demo)", "(Beta)"]);
        assert!(f.keep("Game (USA).zip"));
        assert!(!f.keep("Game (USA) (Demo).zip"));
        assert!(!f.keep("Game (USA) (Beta).zip"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        // The documented two-stage invariant: include passes, then exclude
        // rejects. "fooABbar" contains both A and B.
        let f = filter(&["A"], &["B"]);
        assert!(!f.keep("fooABbar"));
        assert!(f.keep("fooAbar"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let f = filter(&["(USA)"], &[]);
        assert!(!f.keep("Game (usa).zip"));
    }

    #[test]
    fn test_matching_is_substring_not_glob() {
        let f = filter(&["US"], &[]);
        // Plain containment; no anchoring, no wildcards.
        assert!(f.keep("Game (USA).zip"));
        assert!(f.keep("BONUS.zip"));
    }

    #[test]
    fn test_decoded_form_is_matched() {
        // Patterns are authored decoded; the encoded token never matches.
        let f = filter(&["%28USA%29"], &[]);
        assert!(!f.keep("Game (USA).zip"));
    }
}
