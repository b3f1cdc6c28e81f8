//! `schemabnf`: compiles JSON Schema into an EBNF grammar, matches that
//! grammar incrementally against a byte stream, and projects the set of
//! grammar-admissible next bytes onto a token vocabulary as a bitmask
//! suitable for constrained LLM decoding.
pub mod bitmask;
pub mod compiler;
pub mod config;
pub mod ebnf;
pub mod error;
pub mod formats;
pub mod grammar;
pub mod matcher;
pub mod prelude;
pub mod range_regex;
pub mod schema;
pub mod vocabulary;
pub mod whitespace;

pub use bitmask::{fill_next_token_bitmask, fill_next_token_bitmask_with_deadline, BitmaskFillResult};
pub use compiler::{compile_json_schema, json_schema_to_ebnf};
pub use config::Config;
pub use error::CompileError;
pub use grammar::{CompiledGrammar, GrammarCompiler};
pub use matcher::{GrammarMatcher, Snapshot};
pub use vocabulary::{allocate_token_bitmask, TokenizerInfo};
