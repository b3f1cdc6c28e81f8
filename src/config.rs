//! Compile-time configuration (spec §4.C ambient stack): a public,
//! serializable [`Config`] the caller builds once per compile, converted
//! into an [`InternalConfig`] the compiler and loader actually consume.
//! Mirrors the teacher's `Config`/`InternalConfig` split in `config.rs`.
use serde::{Deserialize, Serialize};

use crate::whitespace::WhitespacePolicy;

/// Whether a schema is compiled in strict or non-strict mode (spec §4.G,
/// glossary "Strict mode"): strict rejects unknown keywords and closes
/// objects/arrays to only their declared members; non-strict additionally
/// admits `basic_any` extensions and empty containers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct StrictMode(pub bool);

impl Default for StrictMode {
    fn default() -> Self {
        StrictMode(true)
    }
}

/// The regex engine's resource limits, mirroring the teacher's
/// `RegexConfig` (`regex-automata`'s dense DFA here instead of the
/// teacher's own regex fork).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RegexConfig {
    /// Maximum DFA size in bytes before compilation is aborted. `None`
    /// means no limit.
    pub max_dfa_size: Option<usize>,
}

impl Default for RegexConfig {
    fn default() -> Self {
        Self { max_dfa_size: Some(16 * 1024 * 1024) }
    }
}

/// Top-level configuration for a single schema compile (spec §4.C + §6).
/// Unlike the teacher's `Config` (one engine config reused across many
/// grammars), the whitespace/indent/separators/strict knobs here are
/// per-compile, since each schema may want a different output policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Config {
    /// Whitespace/separator policy applied to every array/object rule
    /// (spec §4.C).
    pub whitespace: WhitespacePolicy,
    /// Strict vs. non-strict compilation (spec §4.G, §6).
    pub strict: StrictMode,
    /// Regex engine resource limits (spec §5: bounded compile-time cost).
    pub regex: RegexConfig,
    /// Name of the root EBNF rule. The default is `root` (spec §6).
    pub root_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            whitespace: WhitespacePolicy::default(),
            strict: StrictMode::default(),
            regex: RegexConfig::default(),
            root_name: "root".to_string(),
        }
    }
}

/// The internal, fully-resolved configuration threaded through the
/// compiler and grammar loader. Kept separate from [`Config`] so the
/// public struct stays small and serializable while this one can carry
/// non-serializable derived state in the future (mirrors the teacher's
/// `InternalConfig`).
#[derive(Debug, Clone)]
pub struct InternalConfig {
    pub whitespace: WhitespacePolicy,
    pub strict: bool,
    pub regex: RegexConfig,
    pub root_name: String,
}

impl Config {
    pub fn internal_config(self) -> InternalConfig {
        InternalConfig {
            whitespace: self.whitespace,
            strict: self.strict.0,
            regex: self.regex,
            root_name: self.root_name,
        }
    }
}
