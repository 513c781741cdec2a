//! Parser configuration for recovery bounds and resource limits.
//!
//! This module provides [`ParseConfig`] for controlling how far error
//! recovery may search and how large the parse stack may grow.
//!
//! # Recovery Bounds
//!
//! Error recovery looks ahead over a bounded number of tokens before it gives
//! up and skips the offending one. Every recovery consumes input or reaches
//! the end of input, so a bound keeps adversarial input from turning each
//! error into a long search while still guaranteeing termination.
//!
//! # Example
//!
//! ```ignore
//! use sysy_parser_core::ParseConfig;
//!
//! // Defaults: skip search over 32 tokens, up to 3 inserted tokens at end of input.
//! let config = ParseConfig::default();
//!
//! // Force full reparses, e.g. to compare against incremental results.
//! let config = ParseConfig::new().with_reuse(false);
//! ```

/// Configuration for parser behavior and resource limits.
///
/// # Default Values
///
/// | Setting | Default | Meaning |
/// |---------|---------|---------|
/// | `max_skipped_tokens` | 32 | Tokens recovery may look past per error |
/// | `max_missing_tokens` | 3 | Zero-width tokens inserted at end of input |
/// | `max_stack_depth` | 100 000 | Nesting beyond this is skipped as an error |
/// | `reuse` | `true` | Reuse unchanged subtrees when reparsing |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseConfig {
    /// Maximum tokens error recovery may skip in one search.
    ///
    /// Larger values let recovery jump further to a resumable token at the
    /// cost of a longer search. Values below 1 behave as 1.
    pub max_skipped_tokens: usize,

    /// Maximum zero-width `MISSING` tokens inserted together at end of input.
    ///
    /// In the middle of the text a single insertion is tried.
    pub max_missing_tokens: usize,

    /// Maximum number of stack entries.
    ///
    /// Tokens that would push the stack beyond this are wrapped in `ERROR`
    /// nodes instead of being shifted.
    pub max_stack_depth: usize,

    /// Whether incremental parses reuse subtrees of the previous tree.
    pub reuse: bool,
}

impl Default for ParseConfig {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ParseConfig {
    /// Default configuration, usable in const contexts.
    pub const DEFAULT: Self = Self {
        max_skipped_tokens: 32,
        max_missing_tokens: 3,
        max_stack_depth: 100_000,
        reuse: true,
    };

    /// Creates a new configuration with default values.
    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    #[inline]
    pub const fn with_max_skipped_tokens(mut self, count: usize) -> Self {
        self.max_skipped_tokens = count;
        self
    }

    #[inline]
    pub const fn with_max_missing_tokens(mut self, count: usize) -> Self {
        self.max_missing_tokens = count;
        self
    }

    /// Sets the stack limit. Use `usize::MAX` to disable it.
    #[inline]
    pub const fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    #[inline]
    pub const fn with_reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_defaults() {
        let config = ParseConfig::default();
        assert_eq!(config.max_skipped_tokens, 32);
        assert_eq!(config.max_missing_tokens, 3);
        assert_eq!(config.max_stack_depth, 100_000);
        assert!(config.reuse);
    }

    #[test]
    fn test_parse_config_builder() {
        let config = ParseConfig::new()
            .with_max_skipped_tokens(4)
            .with_max_missing_tokens(1)
            .with_max_stack_depth(64)
            .with_reuse(false);

        assert_eq!(config.max_skipped_tokens, 4);
        assert_eq!(config.max_missing_tokens, 1);
        assert_eq!(config.max_stack_depth, 64);
        assert!(!config.reuse);
    }

    #[test]
    fn test_parse_config_is_const() {
        const CONFIG: ParseConfig = ParseConfig::new().with_max_stack_depth(usize::MAX);
        assert_eq!(CONFIG.max_stack_depth, usize::MAX);
    }
}
