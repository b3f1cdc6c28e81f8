//! End-to-end pipeline tests: schema JSON in, compiled matcher (and, for
//! the bitmask test, a vocabulary projection) out. Mirrors the teacher's
//! top-level `tests/test.rs` integration style, exercising the public API
//! surface (`json_schema_to_ebnf`, `GrammarCompiler`, `GrammarMatcher`,
//! `fill_next_token_bitmask`) rather than internal module plumbing, which
//! the `#[cfg(test)]` modules co-located with the implementation already
//! cover.
use std::rc::Rc;

use ahash::AHashMap;
use schemabnf::config::{Config, StrictMode};
use schemabnf::whitespace::WhitespacePolicy;
use schemabnf::{
    allocate_token_bitmask, compile_json_schema, fill_next_token_bitmask, json_schema_to_ebnf, GrammarCompiler,
    GrammarMatcher, TokenizerInfo,
};
use serde_json::json;

fn matcher_for(schema: &serde_json::Value, config: &Config) -> GrammarMatcher {
    let compiled = compile_json_schema(schema, config).unwrap();
    GrammarMatcher::new(Rc::new(compiled))
}

/// Spec §8 S6: under `any_whitespace`, arbitrary runs of space/tab/newline
/// are accepted between tokens, while whitespace inside a string literal is
/// just more string content and is unaffected by the policy.
#[test]
fn s6_any_whitespace_accepts_arbitrary_inter_token_runs() {
    let schema = json!({
        "type": "object",
        "properties": {
            "value": {"type": "string"},
            "arr": {"type": "array", "items": {"type": "integer"}},
            "obj": {"type": "object", "properties": {"a": {"type": "integer"}}, "required": ["a"]}
        },
        "required": ["value", "arr", "obj"]
    });
    let config = Config { whitespace: WhitespacePolicy::AnyWhitespace, ..Config::default() };

    let compact = br#"{"value":"x","arr":[1,2],"obj":{"a":1}}"#;
    assert!(matcher_for(&schema, &config).accept_string(compact));

    let spread = b"{ \"value\" : \"x\" ,\n\t\"arr\"\t: [ 1 ,\n2 ] , \"obj\": {\"a\"\n:\t1} }";
    assert!(matcher_for(&schema, &config).accept_string(spread));

    // whitespace embedded in a string's content is literal data, not a
    // separator, and must still round-trip byte for byte.
    let spaced_value = br#"{"value":"a b","arr":[1],"obj":{"a":1}}"#;
    assert!(matcher_for(&schema, &config).accept_string(spaced_value));
}

/// Strict mode (glossary "Strict mode"): unknown properties are rejected,
/// and a value of the wrong JSON type for a declared property is rejected.
#[test]
fn strict_mode_closes_objects_to_declared_properties() {
    let schema = json!({"type":"object","properties":{"a":{"type":"integer"}},"required":["a"]});
    let config = Config { strict: StrictMode(true), ..Config::default() };
    assert!(!matcher_for(&schema, &config).accept_string(br#"{"a": 1, "b": 2}"#));
}

/// The full pipeline the external collaborators actually drive (spec §6):
/// compile once, then for every model step compute the vocabulary bitmask
/// and advance by the bytes of whichever token the mask allows.
#[test]
fn fills_a_vocabulary_bitmask_and_advances_byte_by_byte() {
    let schema = json!({"type":"object","properties":{"ok":{"type":"boolean"}},"required":["ok"]});
    let config = Config::default();
    let text = json_schema_to_ebnf(&schema, &config).unwrap();
    let loader = GrammarCompiler::new(true);
    let compiled = loader.compile_grammar(&text, &config.root_name).unwrap();
    let mut matcher = GrammarMatcher::new(Rc::new(compiled));

    let mut vocab_map: AHashMap<u32, Vec<u8>> = AHashMap::default();
    vocab_map.insert(0, br#"{"ok""#.to_vec());
    vocab_map.insert(1, b": true}".to_vec());
    vocab_map.insert(2, b"nonsense".to_vec());
    let eos = 3;
    vocab_map.insert(eos, b"".to_vec());
    let vocab = TokenizerInfo::from_vocab(vocab_map, eos);

    let mut mask = allocate_token_bitmask(1, vocab.vocab_size());
    let result = fill_next_token_bitmask(&mut matcher, &vocab, &mut mask, 0);
    assert!(!result.aborted);
    let bit = |row: &[u32], id: u32| row[id as usize / 32] & (1 << (id % 32)) != 0;
    assert!(bit(&mask[0], 0));
    assert!(!bit(&mask[0], 1));
    assert!(!bit(&mask[0], 2));

    assert!(matcher.accept_token(&vocab, 0));
    let mut mask2 = allocate_token_bitmask(1, vocab.vocab_size());
    fill_next_token_bitmask(&mut matcher, &vocab, &mut mask2, 0);
    assert!(bit(&mask2[0], 1));
    assert!(!bit(&mask2[0], 2));

    assert!(matcher.accept_token(&vocab, 1));
    assert!(matcher.accept_eos());
}

/// Spec §8 property 3 (prefix property): every prefix of an accepted
/// string is itself accepted; rejection never occurs on a byte that a
/// complete document would still need.
#[test]
fn every_prefix_of_an_accepted_document_is_itself_accepted() {
    let schema = json!({"type":"array","items":{"type":"integer"}});
    let config = Config::default();
    let doc = b"[1, 2, 3]";
    let mut m = matcher_for(&schema, &config);
    for &b in doc {
        assert!(m.accept_byte(b), "prefix rejected at byte {:?}", b as char);
    }
    assert!(m.accept_eos());
}
