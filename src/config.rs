//! Highlighting settings and build configuration.

use hilite_syntax::{DefinedSymbolSet, ScanOptions};

/// Runtime identifier that implies [`MONO_SYMBOL`].
pub const MONO_RUNTIME: &str = "Mono";
/// Implicit symbol defined when building for the Mono runtime.
pub const MONO_SYMBOL: &str = "__MonoCS__";

/// User-facing highlighting switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSettings {
    /// Run the semantic overlay at all
    pub semantic_highlighting: bool,
    /// Track `#if` blocks; when off, nothing is excluded
    pub conditional_highlighting: bool,
    /// Words painted as comment tags inside comments
    pub comment_tags: Vec<String>,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            semantic_highlighting: true,
            conditional_highlighting: true,
            comment_tags: ScanOptions::default().comment_tags,
        }
    }
}

impl HighlightSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_semantic_highlighting(mut self, enabled: bool) -> Self {
        self.semantic_highlighting = enabled;
        self
    }

    pub fn with_conditional_highlighting(mut self, enabled: bool) -> Self {
        self.conditional_highlighting = enabled;
        self
    }

    pub fn with_comment_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.comment_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Options for the line scanner.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::default()
            .with_conditional_highlighting(self.conditional_highlighting)
            .with_comment_tags(self.comment_tags.clone())
    }
}

/// The active build configuration: where the configured symbols come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfiguration {
    pub defines: Vec<String>,
    pub runtime: Option<String>,
}

impl BuildConfiguration {
    pub fn new<I, S>(defines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            defines: defines.into_iter().map(Into::into).collect(),
            runtime: None,
        }
    }

    /// Parse a project-style define list such as `"DEBUG;TRACE"`.
    pub fn from_define_list(list: &str) -> Self {
        Self::new(
            list.split(|c: char| c == ';' || c == ',' || c.is_whitespace())
                .filter(|name| !name.is_empty()),
        )
    }

    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = Some(runtime.into());
        self
    }

    /// Symbols every document starts from.
    pub fn defined_symbols(&self) -> DefinedSymbolSet {
        let mut symbols: DefinedSymbolSet = self.defines.iter().map(String::as_str).collect();
        if self.runtime.as_deref() == Some(MONO_RUNTIME) {
            symbols.insert(MONO_SYMBOL);
        }
        symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // Settings
    // ========================================

    #[test]
    fn test_default_settings() {
        let settings = HighlightSettings::default();
        assert!(settings.semantic_highlighting);
        assert!(settings.conditional_highlighting);
        assert!(settings.comment_tags.iter().any(|tag| tag == "TODO"));
    }

    #[test]
    fn test_scan_options_follow_settings() {
        let options = HighlightSettings::new()
            .with_conditional_highlighting(false)
            .with_comment_tags(["NOTE"])
            .scan_options();
        assert!(!options.conditional_highlighting);
        assert_eq!(options.comment_tags, vec!["NOTE".to_string()]);
    }

    // ========================================
    // Build configuration
    // ========================================

    #[test]
    fn test_define_list_separators() {
        let config = BuildConfiguration::from_define_list("DEBUG;TRACE, NET45  X;;");
        assert_eq!(config.defines, vec!["DEBUG", "TRACE", "NET45", "X"]);
    }

    #[test]
    fn test_mono_runtime_adds_symbol() {
        let config = BuildConfiguration::new(["DEBUG"]);
        assert!(!config.defined_symbols().contains(MONO_SYMBOL));

        let symbols = config.with_runtime("Mono").defined_symbols();
        assert!(symbols.contains(MONO_SYMBOL));
        assert!(symbols.contains("DEBUG"));
        assert_eq!(symbols.len(), 2);
    }

    #[test]
    fn test_other_runtime_adds_nothing() {
        let symbols = BuildConfiguration::default().with_runtime("CoreCLR").defined_symbols();
        assert!(symbols.is_empty());
    }
}
