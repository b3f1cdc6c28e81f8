//! Grammar matcher (spec §4.I): drives a [`crate::grammar::CompiledGrammar`]
//! incrementally against a byte stream, maintaining the set of live parse
//! stacks as an epsilon-closed frontier of byte-consuming atoms, exactly as
//! the teacher's `engine::Engine` drives `kbnf`'s grammar automaton one byte
//! at a time and exposes `try_accept_new_token`/`update_logits` over it.
//!
//! The frontier is a set of `Thread`s, each a single pending atom (a literal
//! suffix, a character class, or an in-flight regex DFA state) plus the
//! `Cont`, a persistent singly-linked continuation list recording what must
//! still be matched once the atom completes. Epsilon moves (rule references,
//! alternation, optional/repetition, and zero-width lookahead) are resolved
//! eagerly by [`closure`] after every byte, so the frontier always holds only
//! byte-consuming positions (or is empty, in which case the matcher is
//! terminated).
use std::rc::Rc;

use ahash::AHashSet;
use regex_automata::dfa::dense::DFA;
use regex_automata::dfa::Automaton;

use crate::ebnf::CharRange;
use crate::grammar::{dfa_start, CExpr, CompiledGrammar};
use crate::vocabulary::TokenizerInfo;

type Dfa = Rc<DFA<Vec<u32>>>;

/// What remains to be matched after the atom currently at the head of a
/// [`Thread`] completes. `Nil` marks a stack that has fully reduced the
/// root rule: a frontier entry reaching it needs no more input.
#[derive(Debug)]
enum Cont {
    Nil,
    Expr(Rc<CExpr>, Rc<Cont>),
}

/// A shadow DFA riding alongside a real continuation to enforce a
/// `(= expr)` lookahead (spec §4.I): the gated thread dies the instant the
/// shadow DFA goes dead, and drops its gate (reverts to an ordinary,
/// ungated thread) the instant the shadow DFA reaches a match state. Only
/// one gate is tracked per thread; a lookahead encountered while already
/// gated replaces the outer gate, which the grammars this compiler emits
/// never need (documented in DESIGN.md).
#[derive(Debug, Clone)]
struct Gate {
    dfa: Dfa,
    state: regex_automata::util::primitives::StateID,
}

#[derive(Debug, Clone)]
enum Atom {
    Lit(Rc<[u8]>, usize),
    Class(bool, Rc<[CharRange]>),
    Regex(Dfa, regex_automata::util::primitives::StateID),
}

#[derive(Debug, Clone)]
struct Thread {
    atom: Atom,
    cont: Rc<Cont>,
    gate: Option<Gate>,
}

/// A saved matcher state (spec §4.J "fork via snapshot"): cheap to take
/// (an `Rc`-backed frontier clone) and cheap to restore, used by the
/// bitmask projection to speculatively try a token and roll back.
#[derive(Debug, Clone)]
pub struct Snapshot {
    frontier: Vec<Thread>,
    terminated: bool,
}

/// Drives one [`CompiledGrammar`] incrementally (spec §6 `GrammarMatcher`).
#[derive(Debug, Clone)]
pub struct GrammarMatcher {
    grammar: Rc<CompiledGrammar>,
    frontier: Vec<Thread>,
    terminated: bool,
}

impl GrammarMatcher {
    pub fn new(grammar: Rc<CompiledGrammar>) -> Self {
        let mut m = Self { grammar, frontier: Vec::new(), terminated: false };
        m.reset();
        m
    }

    /// Rewinds to the grammar's start state, as if no bytes had been
    /// accepted (spec §6 `reset`).
    pub fn reset(&mut self) {
        let root = Rc::new(CExpr::Ref(self.grammar.root.clone()));
        let cont = Rc::new(Cont::Expr(root, Rc::new(Cont::Nil)));
        let mut frontier = Vec::new();
        let mut terminated = false;
        let mut visited = AHashSet::default();
        closure(&self.grammar, cont, None, &mut frontier, &mut terminated, &mut visited);
        self.frontier = frontier;
        self.terminated = terminated;
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot { frontier: self.frontier.clone(), terminated: self.terminated }
    }

    pub fn restore(&mut self, snap: Snapshot) {
        self.frontier = snap.frontier;
        self.terminated = snap.terminated;
    }

    /// Attempts to consume one byte. Returns `false` and leaves the matcher
    /// state unchanged iff the resulting parse-stack set would be empty
    /// (spec §4.I, §7 "MatcherRejected").
    pub fn accept_byte(&mut self, b: u8) -> bool {
        match step(&self.grammar, &self.frontier, b) {
            Some((frontier, terminated)) => {
                self.frontier = frontier;
                self.terminated = terminated;
                true
            }
            None => false,
        }
    }

    /// Consumes `bytes` left to right, stopping (and leaving the matcher at
    /// whatever prefix succeeded) at the first rejected byte.
    pub fn accept_string(&mut self, bytes: &[u8]) -> bool {
        for &b in bytes {
            if !self.accept_byte(b) {
                return false;
            }
        }
        true
    }

    /// Convenience over [`Self::accept_string`] resolving a token id through
    /// a [`TokenizerInfo`] (spec §6 `accept_token`).
    pub fn accept_token(&mut self, vocab: &TokenizerInfo, id: u32) -> bool {
        match vocab.token_bytes(id) {
            Some(bytes) => self.accept_string(bytes),
            None => false,
        }
    }

    /// `accept_byte` has already performed every epsilon-reduction after
    /// each byte, so end-of-sequence needs no further work: it is
    /// satisfied iff the current state is already terminated.
    pub fn accept_eos(&mut self) -> bool {
        self.terminated
    }

    /// Returns, for each possible next byte, whether some live thread would
    /// survive accepting it (spec §4.J's first-byte pruning fast path).
    /// Not `&mut self`: this performs the same transition `accept_byte`
    /// would, but never commits it.
    pub(crate) fn next_byte_set(&self) -> [bool; 256] {
        let mut set = [false; 256];
        for b in 0u16..256 {
            let byte = b as u8;
            if step(&self.grammar, &self.frontier, byte).is_some() {
                set[b as usize] = true;
            }
        }
        set
    }
}

/// Computes the result of accepting `byte` against `frontier` without
/// mutating anything. Returns `None` iff the resulting set would be empty.
fn step(grammar: &CompiledGrammar, frontier: &[Thread], byte: u8) -> Option<(Vec<Thread>, bool)> {
    let mut new_frontier = Vec::new();
    let mut terminated = false;
    for thread in frontier {
        match &thread.atom {
            Atom::Lit(bytes, pos) => {
                if bytes[*pos] != byte {
                    continue;
                }
                let Some(gate) = advance_gate(thread.gate.clone(), byte) else { continue };
                if pos + 1 == bytes.len() {
                    let mut visited = AHashSet::default();
                    closure(grammar, thread.cont.clone(), gate, &mut new_frontier, &mut terminated, &mut visited);
                } else {
                    new_frontier.push(Thread { atom: Atom::Lit(bytes.clone(), pos + 1), cont: thread.cont.clone(), gate });
                }
            }
            Atom::Class(negated, ranges) => {
                if !class_contains(*negated, ranges, byte) {
                    continue;
                }
                let Some(gate) = advance_gate(thread.gate.clone(), byte) else { continue };
                let mut visited = AHashSet::default();
                closure(grammar, thread.cont.clone(), gate, &mut new_frontier, &mut terminated, &mut visited);
            }
            Atom::Regex(dfa, state) => {
                let next = dfa.next_state(*state, byte);
                if dfa.is_dead_state(next) {
                    continue;
                }
                let Some(gate) = advance_gate(thread.gate.clone(), byte) else { continue };
                if dfa_accepts_here(dfa, next) {
                    let mut visited = AHashSet::default();
                    closure(grammar, thread.cont.clone(), gate.clone(), &mut new_frontier, &mut terminated, &mut visited);
                }
                new_frontier.push(Thread { atom: Atom::Regex(dfa.clone(), next), cont: thread.cont.clone(), gate });
            }
        }
    }
    if new_frontier.is_empty() && !terminated {
        None
    } else {
        Some((new_frontier, terminated))
    }
}

/// Advances a thread's lookahead gate (if any) by one byte. Returns `None`
/// if the gate dies, `Some(None)` if there was no gate or it has already
/// been satisfied, `Some(Some(gate))` if it survives but is still pending.
fn advance_gate(gate: Option<Gate>, byte: u8) -> Option<Option<Gate>> {
    match gate {
        None => Some(None),
        Some(g) => {
            let next = g.dfa.next_state(g.state, byte);
            if g.dfa.is_dead_state(next) {
                None
            } else if dfa_accepts_here(&g.dfa, next) {
                Some(None)
            } else {
                Some(Some(Gate { dfa: g.dfa, state: next }))
            }
        }
    }
}

fn class_contains(negated: bool, ranges: &[CharRange], byte: u8) -> bool {
    let hit = ranges.iter().any(|r| r.lo <= byte && byte <= r.hi);
    hit != negated
}

/// Whether `state` is accepting if the input ended right here, with no
/// further bytes. `regex_automata`'s dense DFA only finalizes a state's
/// match flag once it has looked one transition past it (its `is_match_state`
/// lags a byte behind the true match boundary, by design, so that a
/// greedy quantifier's DFA can keep extending without committing early);
/// `next_eoi_state` is the documented way to ask "if input stopped here,
/// would this be a match" without mutating anything.
fn dfa_accepts_here(dfa: &DFA<Vec<u32>>, state: regex_automata::util::primitives::StateID) -> bool {
    dfa.is_match_state(dfa.next_eoi_state(state))
}

/// Expands `cont`'s head through every epsilon move (rule references,
/// alternation, optional/star/plus, zero-width lookahead), pushing every
/// byte-consuming position reached into `out` and setting `terminated` if
/// any path reduces all the way to [`Cont::Nil`].
///
/// `visited` guards against infinite epsilon loops from left-recursive
/// rules or repetitions over a nullable body; it is keyed by the pointer
/// identity of the `(expr, cont)` pair being re-entered, which is enough to
/// detect a cycle without tracking full derivation history.
fn closure(
    grammar: &CompiledGrammar,
    cont: Rc<Cont>,
    gate: Option<Gate>,
    out: &mut Vec<Thread>,
    terminated: &mut bool,
    visited: &mut AHashSet<(usize, usize)>,
) {
    match &*cont {
        // A pending lookahead gate over an exhausted continuation can never
        // be satisfied (nothing remains to carry the bytes it needs), so it
        // terminates only when ungated.
        Cont::Nil => {
            if gate.is_none() {
                *terminated = true;
            }
        }
        Cont::Expr(head, rest) => match &**head {
            CExpr::Literal(s) if s.is_empty() => closure(grammar, rest.clone(), gate, out, terminated, visited),
            CExpr::Literal(s) => out.push(Thread { atom: Atom::Lit(s.clone(), 0), cont: rest.clone(), gate }),
            CExpr::CharClass { negated, ranges } => {
                out.push(Thread { atom: Atom::Class(*negated, ranges.clone()), cont: rest.clone(), gate })
            }
            CExpr::Ref(name) => {
                let key = (Rc::as_ptr(head) as *const () as usize, Rc::as_ptr(rest) as *const () as usize);
                if !visited.insert(key) {
                    return;
                }
                if let Some(body) = grammar.rules.get(name.as_ref()) {
                    closure(grammar, Rc::new(Cont::Expr(body.clone(), rest.clone())), gate, out, terminated, visited);
                }
            }
            CExpr::Regex(dfa) => {
                let start = dfa_start(dfa);
                out.push(Thread { atom: Atom::Regex(dfa.clone(), start), cont: rest.clone(), gate: gate.clone() });
                if dfa_accepts_here(dfa, start) {
                    closure(grammar, rest.clone(), gate, out, terminated, visited);
                }
            }
            CExpr::Lookahead(dfa) => {
                let start = dfa_start(dfa);
                if dfa_accepts_here(dfa, start) {
                    closure(grammar, rest.clone(), gate, out, terminated, visited);
                } else {
                    let new_gate = Some(Gate { dfa: dfa.clone(), state: start });
                    closure(grammar, rest.clone(), new_gate, out, terminated, visited);
                }
            }
            CExpr::Seq(parts) => {
                let mut c = rest.clone();
                for part in parts.iter().rev() {
                    c = Rc::new(Cont::Expr(Rc::new(part.clone()), c));
                }
                closure(grammar, c, gate, out, terminated, visited);
            }
            CExpr::Alt(parts) => {
                for part in parts.iter() {
                    closure(
                        grammar,
                        Rc::new(Cont::Expr(Rc::new(part.clone()), rest.clone())),
                        gate.clone(),
                        out,
                        terminated,
                        visited,
                    );
                }
            }
            CExpr::Opt(inner) => {
                closure(
                    grammar,
                    Rc::new(Cont::Expr(inner.clone(), rest.clone())),
                    gate.clone(),
                    out,
                    terminated,
                    visited,
                );
                closure(grammar, rest.clone(), gate, out, terminated, visited);
            }
            CExpr::Star(inner) => {
                closure(grammar, rest.clone(), gate.clone(), out, terminated, visited);
                let key = (Rc::as_ptr(inner) as *const () as usize, Rc::as_ptr(rest) as *const () as usize);
                if visited.insert(key) {
                    let looped = Rc::new(Cont::Expr(Rc::new(CExpr::Star(inner.clone())), rest.clone()));
                    closure(grammar, Rc::new(Cont::Expr(inner.clone(), looped)), gate, out, terminated, visited);
                }
            }
            CExpr::Plus(inner) => {
                let looped = Rc::new(Cont::Expr(Rc::new(CExpr::Star(inner.clone())), rest.clone()));
                closure(grammar, Rc::new(Cont::Expr(inner.clone(), looped)), gate, out, terminated, visited);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarCompiler;

    fn matcher(text: &str, root: &str) -> GrammarMatcher {
        let compiler = GrammarCompiler::new(false);
        let compiled = compiler.compile_grammar(text, root).unwrap();
        GrammarMatcher::new(Rc::new(compiled))
    }

    #[test]
    fn accepts_literal_and_terminates() {
        let mut m = matcher("root ::= \"ab\"\n", "root");
        assert!(!m.is_terminated());
        assert!(m.accept_string(b"ab"));
        assert!(m.is_terminated());
        assert!(m.accept_eos());
    }

    #[test]
    fn rejects_mismatched_byte_and_leaves_state_unchanged() {
        let mut m = matcher("root ::= \"ab\"\n", "root");
        assert!(m.accept_byte(b'a'));
        assert!(!m.accept_byte(b'x'));
        assert!(m.accept_byte(b'b'));
        assert!(m.is_terminated());
    }

    #[test]
    fn self_recursive_rule_matches_any_run() {
        let mut m = matcher("root ::= \"x\" root | \"y\"\n", "root");
        assert!(m.accept_string(b"xxxy"));
        assert!(m.is_terminated());
    }

    #[test]
    fn alternation_tries_every_branch() {
        let mut m = matcher("root ::= \"cat\" | \"car\"\n", "root");
        assert!(m.accept_string(b"car"));
        assert!(m.is_terminated());
    }

    #[test]
    fn star_matches_zero_or_more() {
        let mut m = matcher("root ::= [a]*\n", "root");
        assert!(m.is_terminated());
        assert!(m.accept_string(b"aaa"));
        assert!(m.is_terminated());
    }

    #[test]
    fn plus_requires_at_least_one() {
        let m = matcher("root ::= [a]+\n", "root");
        assert!(!m.is_terminated());
    }

    #[test]
    fn regex_terminal_matches_variable_length() {
        let mut m = matcher("root ::= #\"[0-9]+\" \",\"\n", "root");
        assert!(m.accept_string(b"123,"));
        assert!(m.is_terminated());
    }

    #[test]
    fn lookahead_gates_on_following_bytes() {
        let mut m = matcher("root ::= \"a\"* (= \",\") \",\"\n", "root");
        assert!(!m.accept_byte(b'b'));
        assert!(m.accept_string(b"aa"));
        assert!(!m.is_terminated());
        assert!(m.accept_byte(b','));
        assert!(m.is_terminated());
    }

    #[test]
    fn snapshot_and_restore_roll_back_a_speculative_accept() {
        let mut m = matcher("root ::= \"ab\" | \"ac\"\n", "root");
        m.accept_byte(b'a');
        let snap = m.snapshot();
        assert!(m.accept_byte(b'b'));
        assert!(m.is_terminated());
        m.restore(snap);
        assert!(!m.is_terminated());
        assert!(m.accept_byte(b'c'));
        assert!(m.is_terminated());
    }

    #[test]
    fn next_byte_set_reports_live_candidates() {
        let m = matcher("root ::= \"a\" | \"b\"\n", "root");
        let set = m.next_byte_set();
        assert!(set[b'a' as usize]);
        assert!(set[b'b' as usize]);
        assert!(!set[b'c' as usize]);
    }
}
