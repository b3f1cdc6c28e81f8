//! Schema → EBNF compiler (spec §4.G, component G): recursively compiles a
//! resolved [`crate::schema::Node`] graph into an [`crate::ebnf::Grammar`],
//! consulting the basic prelude (B), whitespace policy (C), range-regex
//! generator (D) and format-regex library (E) along the way. Grounded on
//! the teacher's top-level compile entry points (`grammar.rs`'s
//! `GrammarCompiler`/`Grammar` surface) generalized from "parse EBNF text"
//! to "derive EBNF text from a schema".
use ahash::AHashSet;
use serde_json::Value;

use crate::config::Config;
use crate::ebnf::{Expr, Grammar};
use crate::error::{CompileError, InvalidSchema, UnsupportedSchema};
use crate::formats;
use crate::grammar::{CompiledGrammar, GrammarCompiler};
use crate::prelude;
use crate::range_regex::generate_range_regex;
use crate::schema::{AdditionalProperties, Node, Resolver};
use crate::whitespace::WhitespacePolicy;

/// Compiles `schema_json` into canonical EBNF text (spec §6
/// `json_schema_to_ebnf`). The basic prelude is always emitted first,
/// followed by `config.root_name`'s rule and then every `$ref` target the
/// resolver named along the way.
pub fn json_schema_to_ebnf(schema_json: &Value, config: &Config) -> Result<String, CompileError> {
    let internal = config.clone().internal_config();

    let mut resolver = Resolver::new(schema_json, internal.strict);
    let root_node = resolver.resolve_root()?;
    let defs = resolver.defs;

    let mut grammar = Grammar::new();
    prelude::emit(&mut grammar, &internal.whitespace, internal.strict);

    let mut compiler = Compiler { grammar: &mut grammar, whitespace: internal.whitespace.clone(), strict: internal.strict };
    let root_body = compiler.compile_body(&internal.root_name, &root_node, 0)?;
    compiler.grammar.push(internal.root_name.clone(), root_body);
    // A `$ref: "#"` self-reference registers the root itself as a def (named
    // after `root_name`) so every other `$ref` target resolves uniformly;
    // skip it here since the root was just compiled directly above.
    for (def_name, def_node) in &defs {
        if *def_name == internal.root_name {
            continue;
        }
        let body = compiler.compile_body(def_name, def_node, 0)?;
        compiler.grammar.push(def_name.clone(), body);
    }

    Ok(grammar.to_text())
}

/// Convenience mirroring the teacher's `Grammar::from_json_schema` (spec
/// §6): compiles the schema straight through to a [`CompiledGrammar`].
pub fn compile_json_schema(schema_json: &Value, config: &Config) -> Result<CompiledGrammar, CompileError> {
    let text = json_schema_to_ebnf(schema_json, config)?;
    let loader = GrammarCompiler::new(false);
    Ok(loader.compile_grammar(&text, &config.root_name)?)
}

struct Compiler<'g> {
    grammar: &'g mut Grammar,
    whitespace: WhitespacePolicy,
    strict: bool,
}

fn json_quote(v: &Value) -> Result<String, InvalidSchema> {
    serde_json::to_string(v).map_err(InvalidSchema::Json)
}

/// Strips `generate_range_regex`'s full-string anchors (`^(...)$`) so the
/// body can be embedded as an [`Expr::Regex`] terminal matched incrementally
/// mid-stream rather than against a whole standalone haystack.
fn unanchor(re: &str) -> String {
    re.strip_prefix('^').unwrap_or(re).strip_suffix('$').unwrap_or(re).to_string()
}

/// Omits a literal that would print as `""`, so compact/any-whitespace
/// policies (whose `open_ws`/`close_ws` are empty) don't clutter output
/// with no-op literals.
fn ws_or_none(e: Expr) -> Option<Expr> {
    match &e {
        Expr::Literal(s) if s.is_empty() => None,
        _ => Some(e),
    }
}

impl<'g> Compiler<'g> {
    /// Compiles `node`'s body directly — used for a rule's own
    /// right-hand side (the caller pushes it under a name itself).
    fn compile_body(&mut self, name: &str, node: &Node, depth: usize) -> Result<Expr, CompileError> {
        match node {
            Node::Object { .. } => self.compile_object(name, node, depth),
            Node::Array { .. } => self.compile_array(name, node, depth),
            Node::String { pattern, format, .. } => self.compile_string(pattern, format),
            Node::Integer { minimum, maximum } => Ok(self.compile_integer(*minimum, *maximum)),
            Node::Number { .. } => Ok(Expr::r#ref("basic_number")),
            Node::Boolean => Ok(Expr::r#ref("basic_boolean")),
            Node::Null => Ok(Expr::r#ref("basic_null")),
            Node::Enum(values) => {
                let lits: Result<Vec<Expr>, InvalidSchema> =
                    values.iter().map(|v| Ok(Expr::lit(json_quote(v)?))).collect();
                Ok(Expr::alt(lits?))
            }
            Node::Const(v) => Ok(Expr::lit(json_quote(v)?)),
            Node::Ref(target) => Ok(Expr::r#ref(target.clone())),
            Node::AnyOf(arms) | Node::OneOf(arms) => self.compile_combinator(name, arms, depth),
            Node::AllOf(arms) => self.compile_all_of(name, arms, depth),
            Node::Any => Ok(Expr::r#ref("basic_any")),
            Node::NotRepresentable => Ok(Expr::never()),
        }
    }

    /// Compiles `node` as a nested position (object property, array item,
    /// combinator arm): composite nodes get their own named rule
    /// (`rule_name`) and a reference to it; scalar nodes inline directly,
    /// matching spec §8 S1's expectation that a plain `integer` property
    /// inlines to `basic_integer` rather than indirecting through a
    /// dedicated rule.
    fn compile_ref(&mut self, rule_name: &str, node: &Node, depth: usize) -> Result<Expr, CompileError> {
        match node {
            Node::Object { .. } | Node::Array { .. } | Node::AnyOf(_) | Node::OneOf(_) | Node::AllOf(_) => {
                self.push_rule(rule_name, node, depth)
            }
            _ => self.compile_body(rule_name, node, depth),
        }
    }

    fn push_rule(&mut self, rule_name: &str, node: &Node, depth: usize) -> Result<Expr, CompileError> {
        let body = self.compile_body(rule_name, node, depth)?;
        self.grammar.push(rule_name, body);
        Ok(Expr::r#ref(rule_name))
    }

    fn compile_combinator(&mut self, name: &str, arms: &[Node], depth: usize) -> Result<Expr, CompileError> {
        let mut refs = Vec::with_capacity(arms.len());
        for (i, arm) in arms.iter().enumerate() {
            refs.push(self.push_rule(&format!("{name}_case_{i}"), arm, depth)?);
        }
        Ok(Expr::alt(refs))
    }

    /// `allOf`: when every arm is an object schema, merges their property
    /// lists (spec §4.G "most restrictive combination representable").
    /// Otherwise falls back to the first arm per Open Question #2.
    fn compile_all_of(&mut self, name: &str, arms: &[Node], depth: usize) -> Result<Expr, CompileError> {
        if arms.is_empty() {
            return Ok(Expr::r#ref("basic_any"));
        }
        if let Some(merged) = try_merge_object_arms(arms) {
            return self.compile_body(name, &merged, depth);
        }
        log::warn!("allOf at `{name}` has no structurally representable intersection; falling back to its first arm");
        self.compile_body(name, &arms[0], depth)
    }

    fn compile_string(&self, pattern: &Option<String>, format: &Option<String>) -> Result<Expr, CompileError> {
        let quote = Expr::lit("\"");
        Ok(match (pattern, format) {
            (None, None) => Expr::r#ref("basic_string"),
            (Some(p), None) => Expr::seq([quote.clone(), Expr::Regex(p.clone()), quote]),
            (None, Some(f)) => {
                let re = formats::format_regex(f).ok_or_else(|| UnsupportedSchema::UnknownFormat(f.clone()))?;
                Expr::seq([quote.clone(), Expr::Regex(re), quote])
            }
            (Some(p), Some(f)) => {
                // Both constraints apply at once (spec §4.E): the pattern is
                // checked as a non-consuming lookahead, the format regex is
                // what's actually consumed.
                let re = formats::format_regex(f).ok_or_else(|| UnsupportedSchema::UnknownFormat(f.clone()))?;
                Expr::seq([
                    quote.clone(),
                    Expr::Lookahead(Box::new(Expr::Regex(p.clone()))),
                    Expr::Regex(re),
                    quote,
                ])
            }
        })
    }

    fn compile_integer(&self, minimum: Option<i64>, maximum: Option<i64>) -> Expr {
        if minimum.is_none() && maximum.is_none() {
            Expr::r#ref("basic_integer")
        } else {
            Expr::Regex(unanchor(&generate_range_regex(minimum, maximum)))
        }
    }

    fn compile_object(&mut self, name: &str, node: &Node, depth: usize) -> Result<Expr, CompileError> {
        let Node::Object { properties, required, additional_properties } = node else { unreachable!() };
        let required_set: AHashSet<&str> = required.iter().map(String::as_str).collect();
        let n = properties.len();

        let open_ws = self.whitespace.open_ws_expr(depth);
        let close_ws = self.whitespace.close_ws_expr(depth);
        let item_sep = self.whitespace.item_sep_expr(depth);
        let kv_sep = self.whitespace.kv_sep_expr(depth);

        let additional_value = self.additional_value_expr(name, additional_properties, depth + 1)?;
        let trailing_tail: Option<Expr> = additional_value.as_ref().map(|v| {
            Expr::Star(Box::new(Expr::seq([item_sep.clone(), Expr::r#ref("basic_string"), kv_sep.clone(), v.clone()])))
        });

        if n == 0 {
            return Ok(match additional_value {
                Some(v) => {
                    let mut nonempty = vec![Expr::lit("{")];
                    if let Some(ws) = ws_or_none(open_ws.clone()) {
                        nonempty.push(ws);
                    }
                    nonempty.push(Expr::r#ref("basic_string"));
                    nonempty.push(kv_sep);
                    nonempty.push(v);
                    if let Some(tail) = trailing_tail.clone() {
                        nonempty.push(tail);
                    }
                    if let Some(ws) = ws_or_none(close_ws) {
                        nonempty.push(ws);
                    }
                    nonempty.push(Expr::lit("}"));
                    let empty = Expr::seq([Expr::lit("{"), WhitespacePolicy::any_ws_expr(), Expr::lit("}")]);
                    Expr::alt([Expr::seq(nonempty), empty])
                }
                None => {
                    let mut parts = vec![Expr::lit("{")];
                    if let Some(ws) = ws_or_none(open_ws) {
                        parts.push(ws);
                    }
                    if let Some(ws) = ws_or_none(close_ws) {
                        parts.push(ws);
                    }
                    parts.push(Expr::lit("}"));
                    Expr::seq(parts)
                }
            });
        }

        let has_optional = properties.iter().any(|(k, _)| !required_set.contains(k.as_str()));

        if !has_optional {
            // All required: a flat sequence, no branching needed.
            let mut parts = vec![Expr::lit("{")];
            if let Some(ws) = ws_or_none(open_ws) {
                parts.push(ws);
            }
            for (i, (key, val)) in properties.iter().enumerate() {
                if i > 0 {
                    parts.push(item_sep.clone());
                }
                parts.push(Expr::lit(json_quote(&Value::String(key.clone()))?));
                parts.push(kv_sep.clone());
                parts.push(self.compile_ref(&format!("{name}_prop_{i}"), val, depth + 1)?);
            }
            if let Some(tail) = trailing_tail.clone() {
                parts.push(tail);
            }
            if let Some(ws) = ws_or_none(close_ws) {
                parts.push(ws);
            }
            parts.push(Expr::lit("}"));
            return Ok(Expr::seq(parts));
        }

        // Mixed or all-optional: woven `part_k` chain (spec §4.G, §9
        // "Optional properties"). `part_i` is the suffix starting at
        // property `i`; a required property forces inclusion, an optional
        // one may be skipped in favor of `part_{i+1}` directly.
        let part_n = format!("{name}_part_{n}");
        let mut part_n_parts = Vec::new();
        if let Some(tail) = trailing_tail {
            part_n_parts.push(tail);
        }
        if let Some(ws) = ws_or_none(close_ws) {
            part_n_parts.push(ws);
        }
        part_n_parts.push(Expr::lit("}"));
        self.grammar.push(part_n.clone(), Expr::seq(part_n_parts));

        // Each property's value sub-grammar is compiled exactly once and
        // then shared (as a cheap `Expr` clone) between the "cont" and
        // "first" chains below, since both may reference the same property.
        let mut val_exprs = Vec::with_capacity(n);
        for (i, (_, val)) in properties.iter().enumerate() {
            val_exprs.push(self.compile_ref(&format!("{name}_prop_{i}"), val, depth + 1)?);
        }

        // `part_i` (built for i in 1..n): entered once at least one key has
        // already been written, so every continuation carries a leading
        // `item_sep`.
        for i in (1..n).rev() {
            let (key, _) = &properties[i];
            let next = Expr::r#ref(format!("{name}_part_{}", i + 1));
            let with_prop = Expr::seq([
                item_sep.clone(),
                Expr::lit(json_quote(&Value::String(key.clone()))?),
                kv_sep.clone(),
                val_exprs[i].clone(),
                next.clone(),
            ]);
            let body = if required_set.contains(key.as_str()) { with_prop } else { Expr::alt([next, with_prop]) };
            self.grammar.push(format!("{name}_part_{i}"), body);
        }

        // `first_i` (built for i in 0..n): entered while no key has been
        // written yet, so the property at `i`, if taken, starts the object
        // body with no leading separator. Skipping an optional property
        // here moves to `first_{i+1}` (still no key written); taking one
        // moves to the separator-bearing `part_{i+1}` chain above. Every
        // property is reachable as the first key as long as every property
        // before it is optional.
        let mut root = None;
        for i in (0..n).rev() {
            let (key, _) = &properties[i];
            let cont_next = Expr::r#ref(if i + 1 < n { format!("{name}_part_{}", i + 1) } else { part_n.clone() });
            let with_prop = Expr::seq([Expr::lit(json_quote(&Value::String(key.clone()))?), kv_sep.clone(), val_exprs[i].clone(), cont_next]);
            let body = if required_set.contains(key.as_str()) {
                with_prop
            } else {
                let skip_next = Expr::r#ref(if i + 1 < n { format!("{name}_first_{}", i + 1) } else { part_n.clone() });
                Expr::alt([skip_next, with_prop])
            };
            if i == 0 {
                root = Some(body);
            } else {
                self.grammar.push(format!("{name}_first_{i}"), body);
            }
        }

        let mut parts = vec![Expr::lit("{")];
        if let Some(ws) = ws_or_none(open_ws) {
            parts.push(ws);
        }
        parts.push(root.expect("n > 0 guarantees the i == 0 iteration ran"));
        Ok(Expr::seq(parts))
    }

    /// `additionalProperties`'s admitted extension value type, or `None`
    /// when extra keys are closed off. `False` always closes (even
    /// non-strict, per SPEC_FULL §11); `Absent` opens only when non-strict;
    /// an explicit schema opens regardless of strictness since the author
    /// asked for it directly.
    fn additional_value_expr(
        &mut self,
        name: &str,
        additional_properties: &AdditionalProperties,
        depth: usize,
    ) -> Result<Option<Expr>, CompileError> {
        Ok(match additional_properties {
            AdditionalProperties::False => None,
            AdditionalProperties::Absent => {
                if self.strict {
                    None
                } else {
                    Some(Expr::r#ref("basic_any"))
                }
            }
            AdditionalProperties::Schema(node) => Some(self.compile_ref(&format!("{name}_addl"), node, depth)?),
        })
    }

    fn compile_array(&mut self, name: &str, node: &Node, depth: usize) -> Result<Expr, CompileError> {
        let Node::Array { items, prefix_items, min_items, max_items } = node else { unreachable!() };
        let _ = max_items;
        let open_ws = self.whitespace.open_ws_expr(depth);
        let close_ws = self.whitespace.close_ws_expr(depth);
        let item_sep = self.whitespace.item_sep_expr(depth);
        let min_items = min_items.unwrap_or(0);

        if prefix_items.is_empty() {
            let item_expr = match items {
                Some(n) => self.compile_ref(&format!("{name}_item"), n, depth + 1)?,
                None => Expr::r#ref("basic_any"),
            };
            let mut parts = vec![Expr::lit("[")];
            if let Some(ws) = ws_or_none(open_ws) {
                parts.push(ws);
            }
            parts.push(item_expr.clone());
            parts.push(Expr::Star(Box::new(Expr::seq([item_sep, item_expr]))));
            if let Some(ws) = ws_or_none(close_ws) {
                parts.push(ws);
            }
            parts.push(Expr::lit("]"));
            let body = Expr::seq(parts);
            return Ok(if !self.strict && min_items == 0 {
                Expr::alt([body, Expr::seq([Expr::lit("["), WhitespacePolicy::any_ws_expr(), Expr::lit("]")])])
            } else {
                body
            });
        }

        let mut parts = vec![Expr::lit("[")];
        if let Some(ws) = ws_or_none(open_ws) {
            parts.push(ws);
        }
        for (i, item) in prefix_items.iter().enumerate() {
            if i > 0 {
                parts.push(item_sep.clone());
            }
            parts.push(self.compile_ref(&format!("{name}_item_{i}"), item, depth + 1)?);
        }
        if let Some(tail_schema) = items {
            let tail = self.compile_ref(&format!("{name}_item"), tail_schema, depth + 1)?;
            parts.push(Expr::Star(Box::new(Expr::seq([item_sep, tail]))));
        }
        if let Some(ws) = ws_or_none(close_ws) {
            parts.push(ws);
        }
        parts.push(Expr::lit("]"));
        let body = Expr::seq(parts);
        Ok(if !self.strict && min_items == 0 {
            Expr::alt([body, Expr::seq([Expr::lit("["), WhitespacePolicy::any_ws_expr(), Expr::lit("]")])])
        } else {
            body
        })
    }
}

/// Best-effort `allOf` merge for the case every arm is an object schema:
/// unions the property lists (first definition wins on key collision),
/// unions `required`, and intersects `additionalProperties` conservatively
/// (`false` in any arm closes the result).
fn try_merge_object_arms(arms: &[Node]) -> Option<Node> {
    let mut properties: Vec<(String, Box<Node>)> = Vec::new();
    let mut required: Vec<String> = Vec::new();
    let mut additional_properties = AdditionalProperties::Absent;
    for arm in arms {
        let Node::Object { properties: p, required: r, additional_properties: a } = arm else {
            return None;
        };
        for (k, v) in p {
            if !properties.iter().any(|(existing, _)| existing == k) {
                properties.push((k.clone(), v.clone()));
            }
        }
        for k in r {
            if !required.contains(k) {
                required.push(k.clone());
            }
        }
        match a {
            AdditionalProperties::False => additional_properties = AdditionalProperties::False,
            AdditionalProperties::Schema(s) if matches!(additional_properties, AdditionalProperties::Absent) => {
                additional_properties = AdditionalProperties::Schema(s.clone());
            }
            _ => {}
        }
    }
    Some(Node::Object { properties, required, additional_properties })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarCompiler;
    use serde_json::json;

    fn strict_config() -> Config {
        Config { whitespace: WhitespacePolicy::Compact, ..Config::default() }
    }

    fn nonstrict_config() -> Config {
        let mut c = strict_config();
        c.strict = crate::config::StrictMode(false);
        c
    }

    #[test]
    fn s1_object_with_required_integer() {
        let schema = json!({"type":"object","properties":{"a":{"type":"integer"}},"required":["a"]});
        let text = json_schema_to_ebnf(&schema, &strict_config()).unwrap();
        assert!(text.contains("root ::= \"{\" \"\\\"a\\\"\" \": \" basic_integer \"}\"\n"), "{text}");

        let loader = GrammarCompiler::new(false);
        let compiled = loader.compile_grammar(&text, "root").unwrap();
        let mut matcher = crate::matcher::GrammarMatcher::new(std::rc::Rc::new(compiled));
        assert!(matcher.accept_string(br#"{"a": 1}"#));
        assert!(matcher.accept_eos());

        let mut rejected = crate::matcher::GrammarMatcher::new(std::rc::Rc::new(loader.compile_grammar(&text, "root").unwrap()));
        assert!(!rejected.accept_string(br#"{"a": 1.0}"#));
    }

    #[test]
    fn s2_self_recursive_ref() {
        let schema = json!({
            "type":"object",
            "properties":{"name":{"type":"string"},"children":{"type":"array","items":{"$ref":"#"}}},
            "required":["name"]
        });
        let text = json_schema_to_ebnf(&schema, &strict_config()).unwrap();
        let loader = GrammarCompiler::new(false);
        let compiled = loader.compile_grammar(&text, "root").unwrap();
        let mut matcher = crate::matcher::GrammarMatcher::new(std::rc::Rc::new(compiled));
        assert!(matcher.accept_string(
            br#"{"name": "root", "children": [{"name": "c1", "children": [{"name": "g1"}]}, {"name": "c2"}]}"#
        ));
        assert!(matcher.accept_eos());
    }

    #[test]
    fn s4_ipv4_format() {
        let schema = json!({"type":"string","format":"ipv4"});
        let text = json_schema_to_ebnf(&schema, &strict_config()).unwrap();
        let loader = GrammarCompiler::new(false);
        let compiled = loader.compile_grammar(&text, "root").unwrap();
        let mut ok = crate::matcher::GrammarMatcher::new(std::rc::Rc::new(compiled));
        assert!(ok.accept_string(br#""255.255.255.255""#));
        assert!(ok.accept_eos());

        let compiled2 = loader.compile_grammar(&text, "root").unwrap();
        let mut bad = crate::matcher::GrammarMatcher::new(std::rc::Rc::new(compiled2));
        assert!(!bad.accept_string(br#""256.0.0.0""#));
    }

    #[test]
    fn string_with_both_pattern_and_format_intersects_both() {
        // spec §4.E: "When a schema has both `pattern` and `format`, both
        // regexes are AND-composed"; the pattern is checked as a lookahead
        // over the format's own consumed bytes.
        let schema = json!({"type":"string","format":"ipv4","pattern":"^10\\."});
        let text = json_schema_to_ebnf(&schema, &strict_config()).unwrap();
        let loader = GrammarCompiler::new(false);
        let mut ok = crate::matcher::GrammarMatcher::new(std::rc::Rc::new(loader.compile_grammar(&text, "root").unwrap()));
        assert!(ok.accept_string(br#""10.0.0.1""#));
        assert!(ok.accept_eos());

        let mut wrong_prefix =
            crate::matcher::GrammarMatcher::new(std::rc::Rc::new(loader.compile_grammar(&text, "root").unwrap()));
        assert!(!wrong_prefix.accept_string(br#""11.0.0.1""#));
    }

    #[test]
    fn s5_non_strict_empty_object() {
        let schema = json!({"type":"object"});
        let text = json_schema_to_ebnf(&schema, &nonstrict_config()).unwrap();
        let loader = GrammarCompiler::new(false);
        let compiled = loader.compile_grammar(&text, "root").unwrap();
        let mut matcher = crate::matcher::GrammarMatcher::new(std::rc::Rc::new(compiled));
        assert!(matcher.accept_string(br#"{"tmp": 123}"#));
        assert!(matcher.accept_eos());

        let strict_text = json_schema_to_ebnf(&schema, &strict_config()).unwrap();
        let strict_compiled = loader.compile_grammar(&strict_text, "root").unwrap();
        let mut strict_matcher = crate::matcher::GrammarMatcher::new(std::rc::Rc::new(strict_compiled));
        assert!(!strict_matcher.accept_string(br#"{"tmp": 123}"#));
    }

    #[test]
    fn all_optional_object_admits_any_property_as_first_key() {
        let schema = json!({
            "type":"object",
            "properties":{"a":{"type":"integer"},"b":{"type":"integer"}}
        });
        let text = json_schema_to_ebnf(&schema, &strict_config()).unwrap();
        let loader = GrammarCompiler::new(false);

        for doc in [br#"{}"#.as_slice(), br#"{"a": 1}"#, br#"{"b": 2}"#, br#"{"a": 1, "b": 2}"#] {
            let mut matcher = crate::matcher::GrammarMatcher::new(std::rc::Rc::new(loader.compile_grammar(&text, "root").unwrap()));
            assert!(matcher.accept_string(doc), "expected {doc:?} to be accepted by {text}");
            assert!(matcher.accept_eos());
        }

        let mut rejected =
            crate::matcher::GrammarMatcher::new(std::rc::Rc::new(loader.compile_grammar(&text, "root").unwrap()));
        assert!(!rejected.accept_string(br#"{, "b": 2}"#));
    }

    #[test]
    fn enum_and_const_are_json_encoded() {
        let schema = json!({"enum": ["a", "b"]});
        let text = json_schema_to_ebnf(&schema, &strict_config()).unwrap();
        assert!(text.contains("root ::= \"\\\"a\\\"\" | \"\\\"b\\\"\"\n"), "{text}");
    }

    #[test]
    fn all_of_merges_object_arms() {
        let schema = json!({
            "allOf": [
                {"type":"object","properties":{"a":{"type":"integer"}},"required":["a"]},
                {"type":"object","properties":{"b":{"type":"string"}},"required":["b"]}
            ]
        });
        let text = json_schema_to_ebnf(&schema, &strict_config()).unwrap();
        let loader = GrammarCompiler::new(false);
        let compiled = loader.compile_grammar(&text, "root").unwrap();
        let mut matcher = crate::matcher::GrammarMatcher::new(std::rc::Rc::new(compiled));
        assert!(matcher.accept_string(br#"{"a": 1, "b": "x"}"#));
        assert!(matcher.accept_eos());
    }
}
