//! Whitespace/separator policy (spec §4.C): decides, for a given compile,
//! the inter-token separators used when laying out arrays and objects.
use crate::ebnf::Expr;
use serde::{Deserialize, Serialize};

/// How whitespace is laid out between JSON tokens. Resolved once per
/// compile and threaded through every array/object production.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WhitespacePolicy {
    /// Every inter-token position accepts arbitrary `[ \n\t]*`.
    AnyWhitespace,
    /// An explicit `(item_sep, kv_sep)` pair, verbatim, with no surrounding
    /// open/close whitespace.
    Separators { item_sep: String, kv_sep: String },
    /// Pretty-printed with `indent` spaces per nesting level.
    Indent(usize),
    /// `", "` / `": "`, no open/close whitespace. The default.
    #[default]
    Compact,
}

/// The three strings needed to lay out a container at a given nesting
/// `depth` (0 = top level): the whitespace right after the opening
/// bracket, the separator between two elements, and the whitespace right
/// before the closing bracket.
pub struct Layout {
    pub open_ws: String,
    pub item_sep: String,
    pub close_ws: String,
    pub kv_sep: String,
}

impl WhitespacePolicy {
    /// Whether inter-token whitespace is unconstrained, i.e. every fixed
    /// separator literal in the grammar should instead become a regex/class
    /// matching any run of spaces, tabs and newlines.
    pub fn is_any_whitespace(&self) -> bool {
        matches!(self, WhitespacePolicy::AnyWhitespace)
    }

    pub fn layout(&self, depth: usize) -> Layout {
        match self {
            WhitespacePolicy::AnyWhitespace => Layout {
                open_ws: String::new(),
                item_sep: String::new(),
                close_ws: String::new(),
                kv_sep: String::new(),
            },
            WhitespacePolicy::Separators { item_sep, kv_sep } => Layout {
                open_ws: String::new(),
                item_sep: item_sep.clone(),
                close_ws: String::new(),
                kv_sep: kv_sep.clone(),
            },
            WhitespacePolicy::Indent(n) => {
                let open_ws = format!("\n{}", " ".repeat(n * (depth + 1)));
                let close_ws = format!("\n{}", " ".repeat(n * depth));
                let item_sep = format!(",{}", open_ws);
                Layout { open_ws, item_sep, close_ws, kv_sep: ": ".to_string() }
            }
            WhitespacePolicy::Compact => Layout {
                open_ws: String::new(),
                item_sep: ", ".to_string(),
                close_ws: String::new(),
                kv_sep: ": ".to_string(),
            },
        }
    }

    /// The zero-or-more-whitespace expression used to pad around brackets,
    /// commas and colons when [`WhitespacePolicy::AnyWhitespace`] is active.
    pub fn any_ws_expr() -> Expr {
        Expr::Star(Box::new(Expr::CharClass {
            negated: false,
            ranges: vec![
                crate::ebnf::CharRange { lo: b' ', hi: b' ' },
                crate::ebnf::CharRange { lo: b'\n', hi: b'\n' },
                crate::ebnf::CharRange { lo: b'\t', hi: b'\t' },
            ],
        }))
    }

    /// `element_sep` as an `Expr`, honoring [`WhitespacePolicy::AnyWhitespace`]
    /// (`[ \n\t]* "," [ \n\t]*`) vs. a fixed literal.
    pub fn item_sep_expr(&self, depth: usize) -> Expr {
        if self.is_any_whitespace() {
            Expr::seq([Self::any_ws_expr(), Expr::lit(","), Self::any_ws_expr()])
        } else {
            Expr::lit(self.layout(depth).item_sep)
        }
    }

    /// `kv_sep` as an `Expr`: `[ \n\t]* ":" [ \n\t]*` under any-whitespace,
    /// else the fixed `": "` (or overridden) literal.
    pub fn kv_sep_expr(&self, depth: usize) -> Expr {
        if self.is_any_whitespace() {
            Expr::seq([Self::any_ws_expr(), Expr::lit(":"), Self::any_ws_expr()])
        } else {
            Expr::lit(self.layout(depth).kv_sep)
        }
    }

    pub fn open_ws_expr(&self, depth: usize) -> Expr {
        if self.is_any_whitespace() {
            Self::any_ws_expr()
        } else {
            Expr::lit(self.layout(depth).open_ws)
        }
    }

    pub fn close_ws_expr(&self, depth: usize) -> Expr {
        if self.is_any_whitespace() {
            Self::any_ws_expr()
        } else {
            Expr::lit(self.layout(depth).close_ws)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_layout() {
        let p = WhitespacePolicy::Compact;
        let l = p.layout(0);
        assert_eq!(l.item_sep, ", ");
        assert_eq!(l.kv_sep, ": ");
        assert_eq!(l.open_ws, "");
    }

    #[test]
    fn indent_layout_nests() {
        let p = WhitespacePolicy::Indent(2);
        let l0 = p.layout(0);
        assert_eq!(l0.open_ws, "\n  ");
        assert_eq!(l0.close_ws, "\n");
        let l1 = p.layout(1);
        assert_eq!(l1.open_ws, "\n    ");
        assert_eq!(l1.close_ws, "\n  ");
    }
}
