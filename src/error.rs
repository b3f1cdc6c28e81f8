//! Error taxonomy (spec §7): one enum per fallible operation, following the
//! teacher's `thiserror` style (see `CreateGrammarError`/`CreateEngineError`
//! in `grammar.rs`/`engine.rs`).
use thiserror::Error;

/// A schema is malformed: bad JSON, an unknown keyword under strict mode,
/// or a `$ref` that does not resolve.
#[derive(Debug, Error)]
pub enum InvalidSchema {
    #[error("schema is not a JSON object or `true`/`false`: {0}")]
    NotAnObject(String),
    #[error("unknown keyword `{0}` under strict mode")]
    UnknownKeyword(String),
    #[error("`$ref` target `{0}` does not resolve against the root schema")]
    UnresolvedRef(String),
    #[error(
        "`exclusiveMinimum`/`exclusiveMaximum` given as a boolean (draft-04 style); only the numeric form is supported"
    )]
    BooleanExclusiveBound,
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A schema construct outside the supported subset (spec §6).
#[derive(Debug, Error)]
pub enum UnsupportedSchema {
    #[error("`format` value `{0}` is not in the supported set")]
    UnknownFormat(String),
    #[error("`type` value `{0}` is not recognized")]
    UnknownType(String),
    #[error("schema node has no representable compilation: {0}")]
    Unrepresentable(String),
}

/// Failure to parse EBNF text back into the grammar AST (component H).
#[derive(Debug, Error)]
pub enum GrammarParseError {
    #[error("parse error at byte offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
    #[error("rule `{0}` is referenced but never defined")]
    UndefinedRule(String),
    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(String),
    #[error("no `root` rule is defined")]
    MissingRoot,
    #[error("regex compilation failed for rule `{0}`: {1}")]
    RegexError(String, String),
}

/// Top-level error returned by [`crate::compiler::json_schema_to_ebnf`] and
/// friends; callers typically match on the variant to decide whether the
/// input schema or the grammar pipeline is at fault.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{0}")]
    InvalidSchema(#[from] InvalidSchema),
    #[error("{0}")]
    UnsupportedSchema(#[from] UnsupportedSchema),
    #[error("{0}")]
    GrammarParseError(#[from] GrammarParseError),
}
