//! The basic prelude (spec §4.B): fixed rules for JSON primitives, always
//! emitted at the top of a compiled grammar. Parameterized by the
//! [`WhitespacePolicy`] (for the two container rules) and by `strict`,
//! which adds the non-strict empty-container alternatives.
use crate::ebnf::{CharRange, Expr, Grammar};
use crate::whitespace::WhitespacePolicy;

/// Names reserved by the prelude; a schema-derived rule must never shadow
/// one of these (spec §6: "Reserved prelude names: `basic_*`").
pub const RESERVED_NAMES: &[&str] = &[
    "basic_escape",
    "basic_string_sub",
    "basic_string",
    "basic_integer",
    "basic_number",
    "basic_boolean",
    "basic_null",
    "basic_array",
    "basic_object",
    "basic_any",
];

fn class(ranges: &[(u8, u8)]) -> Expr {
    Expr::CharClass {
        negated: false,
        ranges: ranges.iter().map(|&(lo, hi)| CharRange { lo, hi }).collect(),
    }
}

fn neg_class(ranges: &[(u8, u8)]) -> Expr {
    Expr::CharClass {
        negated: true,
        ranges: ranges.iter().map(|&(lo, hi)| CharRange { lo, hi }).collect(),
    }
}

/// Appends the prelude rules to `grammar`, ahead of any schema-derived
/// rules. `depth` is the nesting depth at which the prelude's generic
/// `basic_array`/`basic_object` are anchored; since they admit arbitrarily
/// unconstrained (`basic_any`) contents at every depth, an
/// [`WhitespacePolicy::Indent`] policy can't size their separators exactly,
/// so they fall back to [`WhitespacePolicy::AnyWhitespace`]-style padding
/// in that case (documented in DESIGN.md).
pub fn emit(grammar: &mut Grammar, whitespace: &WhitespacePolicy, strict: bool) {
    grammar.push(
        "basic_escape",
        Expr::alt([
            class(&[(b'"', b'"'), (b'\\', b'\\'), (b'/', b'/'), (b'b', b'b'), (b'f', b'f'), (b'n', b'n'), (b'r', b'r'), (b't', b't')]),
            Expr::seq([
                Expr::lit("u"),
                class(&[(b'A', b'F'), (b'a', b'f'), (b'0', b'9')]),
                class(&[(b'A', b'F'), (b'a', b'f'), (b'0', b'9')]),
                class(&[(b'A', b'F'), (b'a', b'f'), (b'0', b'9')]),
                class(&[(b'A', b'F'), (b'a', b'f'), (b'0', b'9')]),
            ]),
        ]),
    );

    grammar.push(
        "basic_string_sub",
        Expr::seq([
            Expr::alt([
                Expr::lit("\""),
                Expr::seq([neg_class(&[(b'"', b'"'), (b'\\', b'\\'), (b'\r', b'\r'), (b'\n', b'\n')]), Expr::r#ref("basic_string_sub")]),
                Expr::seq([Expr::lit("\\"), Expr::r#ref("basic_escape"), Expr::r#ref("basic_string_sub")]),
            ]),
            Expr::Lookahead(Box::new(Expr::seq([
                WhitespacePolicy::any_ws_expr(),
                class(&[(b',', b','), (b'}', b'}'), (b']', b']'), (b':', b':')]),
            ]))),
        ]),
    );

    grammar.push("basic_string", Expr::seq([Expr::lit("\""), Expr::r#ref("basic_string_sub")]));

    let basic_integer = Expr::alt([
        Expr::lit("0"),
        Expr::seq([Expr::Opt(Box::new(Expr::lit("-"))), class(&[(b'1', b'9')]), Expr::Star(Box::new(class(&[(b'0', b'9')])))]),
    ]);
    grammar.push("basic_integer", basic_integer);

    grammar.push(
        "basic_number",
        Expr::seq([
            Expr::r#ref("basic_integer"),
            Expr::Opt(Box::new(Expr::seq([Expr::lit("."), Expr::Plus(Box::new(class(&[(b'0', b'9')])))]))),
            Expr::Opt(Box::new(Expr::seq([
                class(&[(b'e', b'e'), (b'E', b'E')]),
                Expr::Opt(Box::new(class(&[(b'+', b'+'), (b'-', b'-')]))),
                Expr::Plus(Box::new(class(&[(b'0', b'9')]))),
            ]))),
        ]),
    );

    grammar.push("basic_boolean", Expr::alt([Expr::lit("true"), Expr::lit("false")]));
    grammar.push("basic_null", Expr::lit("null"));

    let container_policy = match whitespace {
        WhitespacePolicy::Indent(_) => WhitespacePolicy::AnyWhitespace,
        other => other.clone(),
    };
    let open_ws = container_policy.open_ws_expr(0);
    let close_ws = container_policy.close_ws_expr(0);
    let item_sep = container_policy.item_sep_expr(0);
    let kv_sep = container_policy.kv_sep_expr(0);

    let mut array_alts = vec![Expr::seq([
        Expr::lit("["),
        open_ws.clone(),
        Expr::r#ref("basic_any"),
        Expr::Star(Box::new(Expr::seq([item_sep.clone(), Expr::r#ref("basic_any")]))),
        close_ws.clone(),
        Expr::lit("]"),
    ])];
    if !strict {
        array_alts.push(Expr::seq([Expr::lit("["), WhitespacePolicy::any_ws_expr(), Expr::lit("]")]));
    }
    grammar.push("basic_array", Expr::alt(array_alts));

    let mut object_alts = vec![Expr::seq([
        Expr::lit("{"),
        open_ws,
        Expr::r#ref("basic_string"),
        kv_sep.clone(),
        Expr::r#ref("basic_any"),
        Expr::Star(Box::new(Expr::seq([
            item_sep,
            Expr::r#ref("basic_string"),
            kv_sep,
            Expr::r#ref("basic_any"),
        ]))),
        close_ws,
        Expr::lit("}"),
    ])];
    if !strict {
        object_alts.push(Expr::seq([Expr::lit("{"), WhitespacePolicy::any_ws_expr(), Expr::lit("}")]));
    }
    grammar.push("basic_object", Expr::alt(object_alts));

    grammar.push(
        "basic_any",
        Expr::alt([
            Expr::r#ref("basic_number"),
            Expr::r#ref("basic_string"),
            Expr::r#ref("basic_boolean"),
            Expr::r#ref("basic_null"),
            Expr::r#ref("basic_array"),
            Expr::r#ref("basic_object"),
        ]),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_strict_compact_grammar() {
        let mut g = Grammar::new();
        emit(&mut g, &WhitespacePolicy::Compact, true);
        let text = g.to_text();
        assert!(text.contains("basic_integer ::= \"0\" | \"-\"? [1-9] [0-9]*\n"));
        assert!(text.contains("basic_boolean ::= \"true\" | \"false\"\n"));
        assert!(text.contains("basic_null ::= \"null\"\n"));
        assert!(text.contains(
            "basic_array ::= \"[\" \"\" basic_any (\", \" basic_any)* \"\" \"]\"\n"
        ));
        assert!(text.contains(
            "basic_object ::= \"{\" \"\" basic_string \": \" basic_any (\", \" basic_string \": \" basic_any)* \"\" \"}\"\n"
        ));
        assert!(!text.contains("\"[\" \"\" \"]\""));
    }

    #[test]
    fn non_strict_adds_empty_container_alternatives() {
        let mut g = Grammar::new();
        emit(&mut g, &WhitespacePolicy::Compact, false);
        let text = g.to_text();
        assert!(text.contains("| \"[\" [ \\n\\t]* \"]\""));
        assert!(text.contains("| \"{\" [ \\n\\t]* \"}\""));
    }
}
