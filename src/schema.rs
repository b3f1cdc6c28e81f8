//! Schema node data model and `$ref` resolver (spec §3, §4.F).
//!
//! The resolver walks the raw `serde_json::Value` tree exactly once,
//! producing a closed-variant [`Node`] graph where every `$ref` has been
//! replaced by a [`Node::Ref`] naming an already-registered (or
//! forward-declared) rule. [`crate::compiler`] never touches
//! `serde_json::Value` directly past this point.
use crate::error::InvalidSchema;
use ahash::AHashMap;
use serde_json::Value;

/// A single resolved schema node. Closed variant set per spec §3.
#[derive(Debug, Clone)]
pub enum Node {
    Object {
        properties: Vec<(String, Box<Node>)>,
        required: Vec<String>,
        additional_properties: AdditionalProperties,
    },
    Array {
        items: Option<Box<Node>>,
        prefix_items: Vec<Node>,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },
    String {
        pattern: Option<String>,
        format: Option<String>,
        min_length: Option<u64>,
        max_length: Option<u64>,
    },
    Integer {
        minimum: Option<i64>,
        maximum: Option<i64>,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Boolean,
    Null,
    Enum(Vec<Value>),
    Const(Value),
    /// A reference to a rule name already assigned by the resolver.
    Ref(String),
    AnyOf(Vec<Node>),
    OneOf(Vec<Node>),
    AllOf(Vec<Node>),
    /// The empty schema `{}` or `true`.
    Any,
    /// `false`: rejects everything.
    NotRepresentable,
}

/// `additionalProperties`/`unevaluatedProperties`: absent (defaults to
/// `true`, i.e. non-strict mode's leading/trailing extension is driven by
/// `strict_mode` alone), an explicit `false` (always closed, even
/// non-strict), or an explicit schema constraining the extension values.
#[derive(Debug, Clone, Default)]
pub enum AdditionalProperties {
    #[default]
    Absent,
    False,
    Schema(Box<Node>),
}

/// Resolves `$ref`s against `root` and hands back the resolved root
/// [`Node`] plus every named subschema the compiler must also emit a rule
/// for (cyclic or multiply-referenced nodes).
pub struct Resolver<'a> {
    root: &'a Value,
    /// Pointer path (e.g. `"#/$defs/Inner"`) -> assigned rule name. Entries
    /// are inserted *before* recursing into the body so cycles terminate.
    named: AHashMap<String, String>,
    /// Rule name -> resolved node, populated after each named node's body
    /// finishes resolving.
    pub defs: Vec<(String, Node)>,
    strict: bool,
    anon_counter: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(root: &'a Value, strict: bool) -> Self {
        Self { root, named: AHashMap::default(), defs: Vec::new(), strict, anon_counter: 0 }
    }

    /// Resolves the document root, returning its node directly (the
    /// compiler emits it as `root ::= ...`).
    pub fn resolve_root(&mut self) -> Result<Node, InvalidSchema> {
        self.resolve(self.root, "root")
    }

    fn fresh_name(&mut self, hint: &str) -> String {
        self.anon_counter += 1;
        format!("{hint}_anon_{}", self.anon_counter)
    }

    /// Resolves `value` as a schema node. `name_hint` is used only to name
    /// a `$ref` target the first time it's encountered; it otherwise plays
    /// no role (the compiler assigns its own path-derived names to the
    /// structural parts of whatever node comes back).
    pub fn resolve(&mut self, value: &Value, name_hint: &str) -> Result<Node, InvalidSchema> {
        match value {
            Value::Bool(true) => Ok(Node::Any),
            Value::Bool(false) => Ok(Node::NotRepresentable),
            Value::Object(map) => {
                if let Some(Value::String(ptr)) = map.get("$ref") {
                    return self.resolve_ref(ptr);
                }
                self.resolve_object_schema(map, name_hint)
            }
            _ => Err(InvalidSchema::NotAnObject(value.to_string())),
        }
    }

    fn resolve_ref(&mut self, pointer: &str) -> Result<Node, InvalidSchema> {
        if let Some(name) = self.named.get(pointer) {
            return Ok(Node::Ref(name.clone()));
        }
        let target = self.lookup_pointer(pointer)?;
        let name = if pointer == "#" { "root".to_string() } else { rule_name_for_pointer(pointer) };
        self.named.insert(pointer.to_string(), name.clone());
        let resolved = self.resolve(target, &name)?;
        self.defs.push((name.clone(), resolved));
        Ok(Node::Ref(name))
    }

    fn lookup_pointer<'b>(&self, pointer: &'b str) -> Result<&'a Value, InvalidSchema>
    where
        'a: 'b,
    {
        if pointer == "#" {
            return Ok(self.root);
        }
        let rest = pointer
            .strip_prefix("#/")
            .ok_or_else(|| InvalidSchema::UnresolvedRef(pointer.to_string()))?;
        let mut cur = self.root;
        for seg in rest.split('/') {
            let seg = seg.replace("~1", "/").replace("~0", "~");
            cur = match cur {
                Value::Object(m) => m.get(&seg).ok_or_else(|| InvalidSchema::UnresolvedRef(pointer.to_string()))?,
                Value::Array(a) => {
                    let idx: usize = seg.parse().map_err(|_| InvalidSchema::UnresolvedRef(pointer.to_string()))?;
                    a.get(idx).ok_or_else(|| InvalidSchema::UnresolvedRef(pointer.to_string()))?
                }
                _ => return Err(InvalidSchema::UnresolvedRef(pointer.to_string())),
            };
        }
        Ok(cur)
    }

    fn resolve_object_schema(
        &mut self,
        map: &serde_json::Map<String, Value>,
        name_hint: &str,
    ) -> Result<Node, InvalidSchema> {
        if self.strict {
            for key in map.keys() {
                if !RECOGNIZED_KEYWORDS.contains(&key.as_str()) {
                    return Err(InvalidSchema::UnknownKeyword(key.clone()));
                }
            }
        }

        if let Some(v) = map.get("const") {
            return Ok(Node::Const(v.clone()));
        }
        if let Some(Value::Array(values)) = map.get("enum") {
            return Ok(Node::Enum(values.clone()));
        }
        if let Some(Value::Array(arms)) = map.get("anyOf") {
            return Ok(Node::AnyOf(self.resolve_arms(arms, name_hint)?));
        }
        if let Some(Value::Array(arms)) = map.get("oneOf") {
            return Ok(Node::OneOf(self.resolve_arms(arms, name_hint)?));
        }
        if let Some(Value::Array(arms)) = map.get("allOf") {
            return Ok(Node::AllOf(self.resolve_arms(arms, name_hint)?));
        }

        let ty = map.get("type").and_then(Value::as_str);
        match ty {
            Some("object") | None if map.contains_key("properties") || ty == Some("object") => {
                self.resolve_object(map, name_hint)
            }
            Some("array") => self.resolve_array(map, name_hint),
            Some("string") => Ok(Node::String {
                pattern: map.get("pattern").and_then(Value::as_str).map(str::to_string),
                format: map.get("format").and_then(Value::as_str).map(str::to_string),
                min_length: map.get("minLength").and_then(Value::as_u64),
                max_length: map.get("maxLength").and_then(Value::as_u64),
            }),
            Some("integer") => self.resolve_integer(map),
            Some("number") => self.resolve_number(map),
            Some("boolean") => Ok(Node::Boolean),
            Some("null") => Ok(Node::Null),
            Some(other) => Err(InvalidSchema::UnknownKeyword(format!("type:{other}"))),
            None if map.contains_key("items") || map.contains_key("prefixItems") || map.contains_key("unevaluatedItems") => {
                self.resolve_array(map, name_hint)
            }
            None if map.contains_key("additionalProperties") || map.contains_key("unevaluatedProperties") => {
                self.resolve_object(map, name_hint)
            }
            None => Ok(Node::Any),
        }
    }

    fn resolve_arms(&mut self, arms: &[Value], name_hint: &str) -> Result<Vec<Node>, InvalidSchema> {
        arms.iter()
            .enumerate()
            .map(|(i, v)| self.resolve(v, &format!("{name_hint}_case_{i}")))
            .collect()
    }

    fn resolve_object(
        &mut self,
        map: &serde_json::Map<String, Value>,
        name_hint: &str,
    ) -> Result<Node, InvalidSchema> {
        let mut properties = Vec::new();
        if let Some(Value::Object(props)) = map.get("properties") {
            for (i, (key, schema)) in props.iter().enumerate() {
                let child = self.resolve(schema, &format!("{name_hint}_prop_{i}"))?;
                properties.push((key.clone(), Box::new(child)));
            }
        }
        let required = map
            .get("required")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        let additional_properties = match map.get("additionalProperties").or_else(|| map.get("unevaluatedProperties")) {
            None => AdditionalProperties::Absent,
            Some(Value::Bool(false)) => AdditionalProperties::False,
            Some(Value::Bool(true)) => AdditionalProperties::Absent,
            Some(schema) => {
                let hint = self.fresh_name(&format!("{name_hint}_addl"));
                AdditionalProperties::Schema(Box::new(self.resolve(schema, &hint)?))
            }
        };
        Ok(Node::Object { properties, required, additional_properties })
    }

    fn resolve_array(
        &mut self,
        map: &serde_json::Map<String, Value>,
        name_hint: &str,
    ) -> Result<Node, InvalidSchema> {
        let mut prefix_items = Vec::new();
        if let Some(Value::Array(items)) = map.get("prefixItems") {
            for (i, schema) in items.iter().enumerate() {
                prefix_items.push(self.resolve(schema, &format!("{name_hint}_item_{i}"))?);
            }
        }
        let items = match map.get("items").or_else(|| map.get("unevaluatedItems")) {
            Some(Value::Bool(false)) | None if !prefix_items.is_empty() => None,
            Some(schema) if !matches!(schema, Value::Bool(false)) => {
                Some(Box::new(self.resolve(schema, &format!("{name_hint}_item"))?))
            }
            _ => None,
        };
        Ok(Node::Array {
            items,
            prefix_items,
            min_items: map.get("minItems").and_then(Value::as_u64),
            max_items: map.get("maxItems").and_then(Value::as_u64),
        })
    }

    fn resolve_integer(&mut self, map: &serde_json::Map<String, Value>) -> Result<Node, InvalidSchema> {
        let minimum = bound(map, "minimum", "exclusiveMinimum", 1)?;
        let maximum = bound(map, "maximum", "exclusiveMaximum", -1)?;
        Ok(Node::Integer { minimum, maximum })
    }

    fn resolve_number(&mut self, map: &serde_json::Map<String, Value>) -> Result<Node, InvalidSchema> {
        let minimum = map
            .get("minimum")
            .and_then(Value::as_f64)
            .or(map.get("exclusiveMinimum").and_then(Value::as_f64));
        let maximum = map
            .get("maximum")
            .and_then(Value::as_f64)
            .or(map.get("exclusiveMaximum").and_then(Value::as_f64));
        if matches!(map.get("exclusiveMinimum"), Some(Value::Bool(_)))
            || matches!(map.get("exclusiveMaximum"), Some(Value::Bool(_)))
        {
            return Err(InvalidSchema::BooleanExclusiveBound);
        }
        Ok(Node::Number { minimum, maximum })
    }
}

/// Reads an inclusive integer bound from `key`/`exclusive_key`, adjusting
/// an exclusive bound by `adjust` (`+1` for a lower bound, `-1` for an
/// upper bound) to make it inclusive. Open question #4 (spec §9): the
/// draft-04 boolean form of `exclusiveMinimum`/`exclusiveMaximum` is
/// rejected rather than guessed at.
fn bound(
    map: &serde_json::Map<String, Value>,
    key: &str,
    exclusive_key: &str,
    adjust: i64,
) -> Result<Option<i64>, InvalidSchema> {
    if matches!(map.get(exclusive_key), Some(Value::Bool(_))) {
        return Err(InvalidSchema::BooleanExclusiveBound);
    }
    if let Some(v) = map.get(exclusive_key).and_then(Value::as_i64) {
        return Ok(Some(v + adjust));
    }
    Ok(map.get(key).and_then(Value::as_i64))
}

fn rule_name_for_pointer(pointer: &str) -> String {
    let rest = pointer.trim_start_matches("#/");
    let segs: Vec<&str> = rest.split('/').collect();
    match segs.as_slice() {
        ["$defs", name] | ["definitions", name] => format!("defs_{}", sanitize(name)),
        _ => format!("root_{}", segs.iter().map(|s| sanitize(s)).collect::<Vec<_>>().join("_")),
    }
}

fn sanitize(s: &str) -> String {
    s.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect()
}

const RECOGNIZED_KEYWORDS: &[&str] = &[
    "type",
    "properties",
    "required",
    "additionalProperties",
    "unevaluatedProperties",
    "items",
    "prefixItems",
    "unevaluatedItems",
    "minItems",
    "maxItems",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "enum",
    "const",
    "pattern",
    "format",
    "$ref",
    "$defs",
    "definitions",
    "anyOf",
    "oneOf",
    "allOf",
    "title",
    "description",
    "minLength",
    "maxLength",
];
