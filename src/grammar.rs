//! Grammar loader (spec §4.H): parses EBNF text (component A's dialect)
//! back into the [`crate::ebnf`] AST, then builds matcher-ready tables —
//! an `Rc`-shared expression tree per rule, with every embedded regex
//! (format/pattern terminals, and lookahead assertions) precompiled into a
//! `regex-automata` dense DFA, exactly as the teacher drives
//! `kbnf_regex_automata`'s dense DFA for its own embedded regexes
//! (`config.rs`, `grammar.rs`).
use std::rc::Rc;

use ahash::AHashMap;
use regex_automata::dfa::dense::DFA;
use regex_automata::dfa::{Automaton, StartKind};
use regex_automata::util::primitives::StateID;
use regex_automata::{Anchored, Input};

use crate::ebnf::{CharRange, Expr, Grammar as EbnfGrammar, Rule};
use crate::error::GrammarParseError;

/// A compiled, `Rc`-shared counterpart of [`crate::ebnf::Expr`]. Built once
/// per [`CompiledGrammar`] and cheaply cloned by the matcher when it forks
/// parse stacks.
#[derive(Debug, Clone)]
pub enum CExpr {
    Literal(Rc<[u8]>),
    CharClass { negated: bool, ranges: Rc<[CharRange]> },
    Ref(Rc<str>),
    Regex(Rc<DFA<Vec<u32>>>),
    Seq(Rc<[CExpr]>),
    Alt(Rc<[CExpr]>),
    Opt(Rc<CExpr>),
    Star(Rc<CExpr>),
    Plus(Rc<CExpr>),
    /// `(= expr)`, with `expr` precompiled to a DFA (spec §4.I: "Lookahead
    /// ... is evaluated as a shadow matcher").
    Lookahead(Rc<DFA<Vec<u32>>>),
}

/// A grammar with every rule resolved into [`CExpr`] and every embedded
/// regex precompiled, ready for [`crate::matcher::GrammarMatcher`].
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    pub(crate) rules: AHashMap<Rc<str>, Rc<CExpr>>,
    pub(crate) root: Rc<str>,
}

/// Compiles EBNF text into a [`CompiledGrammar`] ready for matching.
/// Mirrors the teacher's `GrammarCompiler::compile_grammar` (spec §6).
pub struct GrammarCompiler {
    /// Whether identical rule bodies seen before are deduplicated. Mirrors
    /// the teacher's `cache_enabled` flag (`engine.rs`); this
    /// implementation always shares `Rc`s for rule bodies regardless, so
    /// the flag only controls whether parsing itself is memoized across
    /// repeated `compile_grammar` calls with identical text.
    cache_enabled: bool,
    cache: std::cell::RefCell<AHashMap<String, CompiledGrammar>>,
}

impl GrammarCompiler {
    pub fn new(cache_enabled: bool) -> Self {
        Self { cache_enabled, cache: std::cell::RefCell::new(AHashMap::default()) }
    }

    pub fn compile_grammar(&self, ebnf_text: &str, root_name: &str) -> Result<CompiledGrammar, GrammarParseError> {
        if self.cache_enabled {
            if let Some(cached) = self.cache.borrow().get(ebnf_text) {
                return Ok(cached.clone());
            }
        }
        let grammar = parse(ebnf_text)?;
        let compiled = compile(&grammar, root_name)?;
        if self.cache_enabled {
            self.cache.borrow_mut().insert(ebnf_text.to_string(), compiled.clone());
        }
        Ok(compiled)
    }
}

/// Parses canonical EBNF text (spec §4.A's dialect) into the [`EbnfGrammar`]
/// AST.
pub fn parse(text: &str) -> Result<EbnfGrammar, GrammarParseError> {
    let mut grammar = EbnfGrammar::new();
    let mut seen = ahash::AHashSet::default();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let rule = parser::rule(line).map_err(|e| GrammarParseError::Syntax {
            offset: lineno,
            message: format!("{e}"),
        })?;
        if !seen.insert(rule.name.clone()) {
            return Err(GrammarParseError::DuplicateRule(rule.name));
        }
        grammar.push(rule.name, rule.expr);
    }
    Ok(grammar)
}

/// Resolves the AST's rule references and compiles embedded regexes,
/// producing a [`CompiledGrammar`]. Validates spec §3's grammar
/// invariants: every referenced name is defined, and `root_name` exists.
pub fn compile(grammar: &EbnfGrammar, root_name: &str) -> Result<CompiledGrammar, GrammarParseError> {
    if !grammar.contains(root_name) {
        return Err(GrammarParseError::MissingRoot);
    }
    let mut rules = AHashMap::default();
    for rule in &grammar.rules {
        let compiled = compile_expr(&rule.expr, grammar)?;
        rules.insert(Rc::<str>::from(rule.name.as_str()), Rc::new(compiled));
    }
    for rule in &grammar.rules {
        check_refs(&rule.expr, grammar)?;
    }
    Ok(CompiledGrammar { rules, root: Rc::from(root_name) })
}

fn check_refs(expr: &Expr, grammar: &EbnfGrammar) -> Result<(), GrammarParseError> {
    match expr {
        Expr::Ref(name) => {
            if !grammar.contains(name) {
                return Err(GrammarParseError::UndefinedRule(name.clone()));
            }
            Ok(())
        }
        Expr::Seq(parts) | Expr::Alt(parts) => {
            for p in parts.iter() {
                check_refs(p, grammar)?;
            }
            Ok(())
        }
        Expr::Opt(e) | Expr::Star(e) | Expr::Plus(e) | Expr::Lookahead(e) => check_refs(e, grammar),
        Expr::Literal(_) | Expr::CharClass { .. } | Expr::Regex(_) => Ok(()),
    }
}

fn dense_dfa(pattern: &str) -> Result<DFA<Vec<u32>>, GrammarParseError> {
    DFA::builder()
        .configure(DFA::config().start_kind(StartKind::Anchored))
        .build(pattern)
        .map_err(|e| GrammarParseError::RegexError(pattern.to_string(), e.to_string()))
}

fn compile_expr(expr: &Expr, grammar: &EbnfGrammar) -> Result<CExpr, GrammarParseError> {
    Ok(match expr {
        Expr::Literal(s) => CExpr::Literal(Rc::from(s.as_bytes())),
        Expr::CharClass { negated, ranges } => {
            CExpr::CharClass { negated: *negated, ranges: Rc::from(ranges.as_slice()) }
        }
        Expr::Ref(name) => CExpr::Ref(Rc::from(name.as_str())),
        Expr::Regex(pattern) => CExpr::Regex(Rc::new(dense_dfa(&format!("^(?:{pattern})"))?)),
        Expr::Seq(parts) => {
            let compiled: Result<Vec<_>, _> = parts.iter().map(|p| compile_expr(p, grammar)).collect();
            CExpr::Seq(Rc::from(compiled?))
        }
        Expr::Alt(parts) => {
            let compiled: Result<Vec<_>, _> = parts.iter().map(|p| compile_expr(p, grammar)).collect();
            CExpr::Alt(Rc::from(compiled?))
        }
        Expr::Opt(e) => CExpr::Opt(Rc::new(compile_expr(e, grammar)?)),
        Expr::Star(e) => CExpr::Star(Rc::new(compile_expr(e, grammar)?)),
        Expr::Plus(e) => CExpr::Plus(Rc::new(compile_expr(e, grammar)?)),
        Expr::Lookahead(e) => {
            let pattern = expr_to_regex_pattern(e, grammar, 0)?;
            CExpr::Lookahead(Rc::new(dense_dfa(&format!("^(?:{pattern})"))?))
        }
    })
}

/// Converts a structural `Expr` (no nested `Lookahead`) into an equivalent
/// regex pattern, so a lookahead assertion can be driven as a DFA shadow
/// matcher alongside the main parse (spec §4.I). `depth` bounds `$ref`
/// recursion inside a lookahead, which the grammars this compiler emits
/// never need.
fn expr_to_regex_pattern(expr: &Expr, grammar: &EbnfGrammar, depth: usize) -> Result<String, GrammarParseError> {
    if depth > 8 {
        return Err(GrammarParseError::Syntax { offset: 0, message: "lookahead expression too deeply nested".into() });
    }
    Ok(match expr {
        Expr::Literal(s) => escape_regex_literal(s),
        Expr::CharClass { negated, ranges } => {
            let mut out = String::from("[");
            if *negated {
                out.push('^');
            }
            for r in ranges.iter() {
                out.push_str(&escape_regex_class_byte(r.lo));
                if r.lo != r.hi {
                    out.push('-');
                    out.push_str(&escape_regex_class_byte(r.hi));
                }
            }
            out.push(']');
            out
        }
        Expr::Ref(name) => {
            let rule = grammar
                .rule(name)
                .ok_or_else(|| GrammarParseError::UndefinedRule(name.clone()))?;
            expr_to_regex_pattern(&rule.expr, grammar, depth + 1)?
        }
        Expr::Seq(parts) => {
            let mut out = String::new();
            for p in parts.iter() {
                out.push_str(&format!("(?:{})", expr_to_regex_pattern(p, grammar, depth)?));
            }
            out
        }
        Expr::Alt(parts) => {
            let alts: Result<Vec<_>, _> = parts.iter().map(|p| expr_to_regex_pattern(p, grammar, depth)).collect();
            format!("(?:{})", alts?.join("|"))
        }
        Expr::Opt(e) => format!("(?:{})?", expr_to_regex_pattern(e, grammar, depth)?),
        Expr::Star(e) => format!("(?:{})*", expr_to_regex_pattern(e, grammar, depth)?),
        Expr::Plus(e) => format!("(?:{})+", expr_to_regex_pattern(e, grammar, depth)?),
        // A `Regex` node already carries a raw pattern string (spec §4.E's
        // `pattern`+`format` AND-composition drives one as a lookahead over
        // the other), so it splices in directly.
        Expr::Regex(pattern) => format!("(?:{pattern})"),
        Expr::Lookahead(_) => {
            return Err(GrammarParseError::Syntax {
                offset: 0,
                message: "lookahead expressions may not embed a nested lookahead".into(),
            })
        }
    })
}

/// Escapes a literal string for embedding inside a `regex-automata`
/// pattern (used only to turn a [`crate::ebnf::Expr`] lookahead body into
/// a regex; unrelated to the EBNF-text escaping in [`crate::ebnf`]).
fn escape_regex_literal(s: &str) -> String {
    s.chars().map(escape_regex_char).collect()
}

fn escape_regex_class_byte(b: u8) -> String {
    escape_regex_char(b as char)
}

fn escape_regex_char(c: char) -> String {
    if "\\.+*?()|[]{}^$".contains(c) {
        format!("\\{c}")
    } else {
        c.to_string()
    }
}

/// Returns the DFA's anchored start state, used to begin driving a
/// [`CExpr::Regex`]/[`CExpr::Lookahead`] terminal. Computed via an empty
/// `Input` rather than [`Automaton::universal_start_state`]: the `^`
/// anchor these patterns are built with (`dense_dfa`) makes the start
/// state depend on look-behind (is this truly the start of a match?),
/// which is exactly the "start of haystack" case an empty anchored
/// `Input` always reports, and is never context-independent enough for
/// `universal_start_state` to return `Some`.
pub(crate) fn dfa_start(dfa: &DFA<Vec<u32>>) -> StateID {
    dfa.start_state_forward(&Input::new(b"").anchored(Anchored::Yes)).expect("anchored start state computable")
}

mod parser {
    use super::*;
    use crate::ebnf::Expr;
    use nom::branch::alt;
    use nom::bytes::complete::{tag, take_while, take_while1};
    use nom::character::complete::{char, multispace0, one_of};
    use nom::combinator::{map, opt, value};
    use nom::multi::{many0, many1, separated_list1};
    use nom::sequence::{delimited, preceded, tuple};
    use nom::IResult;

    pub fn rule(input: &str) -> Result<Rule, nom::Err<nom::error::Error<String>>> {
        let (_, (name, expr)) = tuple((ident, preceded(tuple((multispace0, tag("::="), multispace0)), expr)))(input)
            .map_err(|e: nom::Err<nom::error::Error<&str>>| e.to_owned())?;
        Ok(Rule { name: name.to_string(), expr })
    }

    fn ident(input: &str) -> IResult<&str, &str> {
        take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
    }

    fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
    where
        F: FnMut(&'a str) -> IResult<&'a str, O>,
    {
        delimited(multispace0, inner, multispace0)
    }

    fn expr(input: &str) -> IResult<&str, Expr> {
        map(separated_list1(ws(char('|')), seq), Expr::alt)(input)
    }

    fn seq(input: &str) -> IResult<&str, Expr> {
        map(many1(ws(postfix)), Expr::seq)(input)
    }

    fn postfix(input: &str) -> IResult<&str, Expr> {
        let (input, base) = atom(input)?;
        let (input, suffix) = opt(one_of("?*+"))(input)?;
        Ok((
            input,
            match suffix {
                Some('?') => Expr::Opt(Box::new(base)),
                Some('*') => Expr::Star(Box::new(base)),
                Some('+') => Expr::Plus(Box::new(base)),
                _ => base,
            },
        ))
    }

    fn atom(input: &str) -> IResult<&str, Expr> {
        alt((lookahead, group, regex_atom, literal, char_class, reference))(input)
    }

    fn group(input: &str) -> IResult<&str, Expr> {
        delimited(char('('), ws(expr), char(')'))(input)
    }

    fn lookahead(input: &str) -> IResult<&str, Expr> {
        map(delimited(tag("(="), ws(expr), char(')')), |e| Expr::Lookahead(Box::new(e)))(input)
    }

    fn reference(input: &str) -> IResult<&str, Expr> {
        map(ident, Expr::r#ref)(input)
    }

    /// A `"..."` literal with the JSON-style escapes [`crate::ebnf`]'s
    /// printer emits. Hand-rolled rather than `nom::escaped_transform`
    /// because that combinator requires the transform's output type to
    /// match its input slice type, which a `\uXXXX` expansion can't do.
    fn quoted_string(input: &str) -> IResult<&str, String> {
        let (mut rest, _) = char('"')(input)?;
        let mut out = String::new();
        loop {
            match rest.chars().next() {
                None => return Err(nom::Err::Error(nom::error::Error::new(rest, nom::error::ErrorKind::Eof))),
                Some('"') => {
                    rest = &rest[1..];
                    break;
                }
                Some('\\') => {
                    let after_backslash = &rest[1..];
                    let (next_rest, decoded) = escape_char(after_backslash)?;
                    out.push_str(&decoded);
                    rest = next_rest;
                }
                Some(c) => {
                    out.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }
        Ok((rest, out))
    }

    fn escape_char(input: &str) -> IResult<&str, String> {
        alt((
            value("\"".to_string(), char('"')),
            value("\\".to_string(), char('\\')),
            value("/".to_string(), char('/')),
            value("\n".to_string(), char('n')),
            value("\r".to_string(), char('r')),
            value("\t".to_string(), char('t')),
            map(preceded(char('u'), take_while(|c: char| c.is_ascii_hexdigit())), |hex: &str| {
                let code = u32::from_str_radix(hex, 16).unwrap_or(0);
                char::from_u32(code).map(|c| c.to_string()).unwrap_or_default()
            }),
        ))(input)
    }

    fn literal(input: &str) -> IResult<&str, Expr> {
        map(quoted_string, Expr::lit)(input)
    }

    fn regex_atom(input: &str) -> IResult<&str, Expr> {
        map(preceded(char('#'), quoted_string), Expr::Regex)(input)
    }

    fn char_class(input: &str) -> IResult<&str, Expr> {
        let (input, _) = char('[')(input)?;
        let (input, negated) = map(opt(char('^')), |n| n.is_some())(input)?;
        let (input, ranges) = many0(class_range)(input)?;
        let (input, _) = char(']')(input)?;
        Ok((input, Expr::CharClass { negated, ranges }))
    }

    fn class_range(input: &str) -> IResult<&str, CharRange> {
        let (input, lo) = class_byte(input)?;
        let (input, hi) = opt(preceded(char('-'), class_byte))(input)?;
        Ok((input, CharRange { lo, hi: hi.unwrap_or(lo) }))
    }

    fn class_byte(input: &str) -> IResult<&str, u8> {
        alt((
            preceded(
                char('\\'),
                alt((
                    value(b']', char(']')),
                    value(b'^', char('^')),
                    value(b'\\', char('\\')),
                    value(b'-', char('-')),
                    value(b'\n', char('n')),
                    value(b'\r', char('r')),
                    value(b'\t', char('t')),
                    map(preceded(char('x'), take_while(|c: char| c.is_ascii_hexdigit())), |hex: &str| {
                        u8::from_str_radix(hex, 16).unwrap_or(0)
                    }),
                )),
            ),
            map(nom::character::complete::none_of("]"), |c| c as u8),
        ))(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ebnf::Expr;

    #[test]
    fn round_trips_basic_integer() {
        let mut g = EbnfGrammar::new();
        g.push(
            "root",
            Expr::alt([
                Expr::lit("0"),
                Expr::seq([
                    Expr::Opt(Box::new(Expr::lit("-"))),
                    Expr::CharClass { negated: false, ranges: vec![CharRange { lo: b'1', hi: b'9' }] },
                ]),
            ]),
        );
        let text = g.to_text();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.to_text(), text);
    }

    #[test]
    fn compiles_self_referencing_rule() {
        let text = "root ::= \"x\" root | \"y\"\n";
        let grammar = parse(text).unwrap();
        let compiled = compile(&grammar, "root").unwrap();
        assert!(compiled.rules.contains_key("root"));
    }

    #[test]
    fn undefined_rule_reference_errors() {
        let text = "root ::= missing\n";
        let grammar = parse(text).unwrap();
        assert!(matches!(compile(&grammar, "root"), Err(GrammarParseError::UndefinedRule(_))));
    }

    #[test]
    fn missing_root_errors() {
        let text = "other ::= \"a\"\n";
        let grammar = parse(text).unwrap();
        assert!(matches!(compile(&grammar, "root"), Err(GrammarParseError::MissingRoot)));
    }

    #[test]
    fn parses_lookahead_and_char_class() {
        let text = "root ::= [^\",\"]* (= [,])\n";
        let grammar = parse(text).unwrap();
        assert_eq!(grammar.rules.len(), 1);
    }
}
