//! The EBNF AST and its canonical printer.
//!
//! This is the in-memory representation of the grammar dialect the schema
//! compiler ([`crate::compiler`]) emits and the grammar loader
//! ([`crate::grammar`]) consumes: named rules over literals, character
//! classes, references, sequences, alternations, repetitions and a
//! non-consuming lookahead assertion.
use std::fmt::Write as _;

/// One `name ::= expr` production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub expr: Expr,
}

/// A single (possibly negated) byte range inside a character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRange {
    pub lo: u8,
    pub hi: u8,
}

/// An EBNF expression node.
///
/// `Seq`/`Alt` are flattened n-ary nodes rather than nested binary ones, so
/// the printer can lay out `a b c` and `a | b | c` without synthesizing
/// redundant groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A literal byte string, printed with JSON-style double-quote escaping.
    Literal(String),
    /// `[...]` or `[^...]`.
    CharClass { negated: bool, ranges: Vec<CharRange> },
    /// A reference to another rule by name.
    Ref(String),
    /// An embedded regular expression, printed as `#"..."`. Used for format
    /// and `pattern` constrained strings, whose bodies are not naturally
    /// expressible as the structural grammar constructs above (see
    /// DESIGN.md for why this is grounded in the teacher's own KBNF
    /// dialect rather than invented from nothing).
    Regex(String),
    Seq(Vec<Expr>),
    Alt(Vec<Expr>),
    Opt(Box<Expr>),
    Star(Box<Expr>),
    Plus(Box<Expr>),
    /// `(= expr)`: must match what follows without consuming it.
    Lookahead(Box<Expr>),
}

impl Expr {
    pub fn lit(s: impl Into<String>) -> Expr {
        Expr::Literal(s.into())
    }

    pub fn r#ref(name: impl Into<String>) -> Expr {
        Expr::Ref(name.into())
    }

    pub fn seq(parts: impl IntoIterator<Item = Expr>) -> Expr {
        let mut flat = Vec::new();
        for p in parts {
            match p {
                Expr::Seq(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.pop().unwrap()
        } else {
            Expr::Seq(flat)
        }
    }

    pub fn alt(parts: impl IntoIterator<Item = Expr>) -> Expr {
        let mut flat = Vec::new();
        for p in parts {
            match p {
                Expr::Alt(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.pop().unwrap()
        } else {
            Expr::Alt(flat)
        }
    }

    /// The empty alternation `()`, which can never match. Used for
    /// `false`-schemas and `allOf` arms that contradict each other.
    pub fn never() -> Expr {
        Expr::Alt(vec![])
    }
}

/// An ordered collection of rules forming a grammar, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
    pub rules: Vec<Rule>,
}

impl Grammar {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn push(&mut self, name: impl Into<String>, expr: Expr) {
        self.rules.push(Rule { name: name.into(), expr });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name == name)
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Renders the grammar in its canonical textual form: one
    /// `name ::= expr\n` line per rule, in declaration order.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            let _ = writeln!(out, "{} ::= {}", rule.name, print_expr(&rule.expr, false));
        }
        out
    }
}

fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn print_char_class(negated: bool, ranges: &[CharRange]) -> String {
    let mut out = String::from("[");
    if negated {
        out.push('^');
    }
    for r in ranges {
        let lo = escape_class_byte(r.lo);
        if r.lo == r.hi {
            out.push_str(&lo);
        } else {
            out.push_str(&lo);
            out.push('-');
            out.push_str(&escape_class_byte(r.hi));
        }
    }
    out.push(']');
    out
}

fn escape_class_byte(b: u8) -> String {
    let c = b as char;
    match c {
        ']' => "\\]".to_string(),
        '^' => "\\^".to_string(),
        '\\' => "\\\\".to_string(),
        '\n' => "\\n".to_string(),
        '\r' => "\\r".to_string(),
        '\t' => "\\t".to_string(),
        c if (0x20..0x7f).contains(&(c as u32)) => c.to_string(),
        _ => format!("\\x{:02x}", b),
    }
}

/// Prints an expression; `grouped` is true when the caller already requires
/// parentheses around anything but a single atom (e.g. inside `?`/`*`/`+`).
fn print_expr(e: &Expr, grouped: bool) -> String {
    match e {
        Expr::Literal(s) => escape_literal(s),
        Expr::CharClass { negated, ranges } => print_char_class(*negated, ranges),
        Expr::Ref(name) => name.clone(),
        Expr::Regex(pattern) => format!("#{}", escape_literal(pattern)),
        Expr::Seq(parts) => {
            let inner = parts
                .iter()
                .map(|p| print_expr(p, true))
                .collect::<Vec<_>>()
                .join(" ");
            if grouped && parts.len() > 1 {
                format!("({})", inner)
            } else {
                inner
            }
        }
        Expr::Alt(parts) => {
            if parts.is_empty() {
                return "()".to_string();
            }
            let inner = parts
                .iter()
                .map(|p| print_expr(p, false))
                .collect::<Vec<_>>()
                .join(" | ");
            if grouped {
                format!("({})", inner)
            } else {
                inner
            }
        }
        Expr::Opt(inner) => format!("{}?", print_expr(inner, true)),
        Expr::Star(inner) => format!("{}*", print_expr(inner, true)),
        Expr::Plus(inner) => format!("{}+", print_expr(inner, true)),
        Expr::Lookahead(inner) => format!("(= {})", print_expr(inner, false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_basic_integer_rule() {
        let expr = Expr::alt([
            Expr::lit("0"),
            Expr::seq([
                Expr::Opt(Box::new(Expr::lit("-"))),
                Expr::CharClass { negated: false, ranges: vec![CharRange { lo: b'1', hi: b'9' }] },
                Expr::Star(Box::new(Expr::CharClass {
                    negated: false,
                    ranges: vec![CharRange { lo: b'0', hi: b'9' }],
                })),
            ]),
        ]);
        let mut g = Grammar::new();
        g.push("basic_integer", expr);
        assert_eq!(g.to_text(), "basic_integer ::= \"0\" | \"-\"? [1-9] [0-9]*\n");
    }

    #[test]
    fn prints_lookahead_and_negated_class() {
        let mut g = Grammar::new();
        g.push(
            "basic_string_sub",
            Expr::seq([
                Expr::alt([
                    Expr::lit("\""),
                    Expr::CharClass {
                        negated: true,
                        ranges: vec![
                            CharRange { lo: b'"', hi: b'"' },
                            CharRange { lo: b'\\', hi: b'\\' },
                            CharRange { lo: b'\r', hi: b'\r' },
                            CharRange { lo: b'\n', hi: b'\n' },
                        ],
                    },
                ]),
                Expr::Lookahead(Box::new(Expr::CharClass {
                    negated: false,
                    ranges: vec![CharRange { lo: b',', hi: b',' }],
                })),
            ]),
        );
        let text = g.to_text();
        assert!(text.contains("(= [,])"));
        assert!(text.contains("[^\"\\\\\\r\\n]"));
    }
}
