//! Range-regex generator (spec §4.D): for an integer range `[lo, hi]` with
//! optionally unbounded endpoints, produces a regex matching exactly the
//! decimal representations of integers in that range.

/// Generates a regex, anchored with `^(...)$`, matching exactly the decimal
/// representations of the integers in `[lo, hi]`.
///
/// `lo`/`hi` of `None` mean unbounded in that direction. Returns the
/// always-rejecting `^()$` when `hi < lo`.
pub fn generate_range_regex(lo: Option<i64>, hi: Option<i64>) -> String {
    if let (Some(lo), Some(hi)) = (lo, hi) {
        if hi < lo {
            return "^()$".to_string();
        }
    }
    let mut alts: Vec<String> = Vec::new();

    // Negative part: numbers in [lo, min(hi, -1)], mirrored from the
    // positive magnitude range [-min(hi,-1), -lo].
    let neg_hi = hi.map(|h| h.min(-1)).unwrap_or(-1);
    match lo {
        Some(lo) if lo <= neg_hi => {
            let body = positive_range_regex(-neg_hi as u64, -lo as u64);
            alts.push(format!("-({body})"));
        }
        None => {
            let mag_lo = -neg_hi as u64;
            alts.push(format!("-({})", unbounded_above_regex(mag_lo)));
        }
        _ => {}
    }

    // Zero.
    let includes_zero = lo.map(|l| l <= 0).unwrap_or(true) && hi.map(|h| h >= 0).unwrap_or(true);
    if includes_zero {
        alts.push("0".to_string());
    }

    // Positive part: numbers in [max(lo,1), hi].
    let pos_lo = lo.map(|l| l.max(1)).unwrap_or(1);
    match hi {
        Some(hi) if hi >= pos_lo => {
            alts.push(format!("({})", positive_range_regex(pos_lo as u64, hi as u64)));
        }
        None => {
            alts.push(format!("({})", unbounded_above_regex(pos_lo as u64)));
        }
        _ => {}
    }

    if alts.is_empty() {
        return "^()$".to_string();
    }
    format!("^({})$", alts.join("|"))
}

/// Regex for decimal strings of exactly `n`'s digit length that are `>= n`
/// with no upper bound (e.g. for `n=10`: numbers `10..19` then `2`-`9`
/// followed by any digit... generalized below), used for unbounded-upper
/// ranges: `[a-9]|[1-9]\d+` style, i.e. "any positive integer >= lo".
fn unbounded_above_regex(lo: u64) -> String {
    let digits = lo.to_string();
    let len = digits.len();
    let mut parts = Vec::new();
    // Same digit-length numbers >= lo: walk the digit tree like a bounded
    // range capped at all-9s of the same length.
    let hi_same_len: u64 = 10u64.pow(len as u32) - 1;
    parts.push(walk_digit_tree(&digits, &hi_same_len.to_string()));
    // Any longer number is unconstrained.
    if len < 19 {
        parts.push(format!("[1-9]\\d{{{},}}", len));
    }
    parts.join("|")
}

/// Regex for decimal strings of all positive integers in `[lo, hi]`
/// (`lo >= 1`).
fn positive_range_regex(lo: u64, hi: u64) -> String {
    let lo_s = lo.to_string();
    let hi_s = hi.to_string();
    if lo_s.len() == hi_s.len() {
        return walk_digit_tree(&lo_s, &hi_s);
    }
    let mut parts = Vec::new();
    // Shorter-length numbers, from lo up to all-9s of each intermediate length.
    let mut cur = lo_s.clone();
    for len in lo_s.len()..hi_s.len() {
        let band_hi = "9".repeat(len);
        parts.push(walk_digit_tree(&cur, &band_hi));
        cur = "1".to_string() + &"0".repeat(len);
    }
    parts.push(walk_digit_tree(&cur, &hi_s));
    parts.join("|")
}

/// Classic digit-DFA range decomposition for two same-length decimal
/// strings `lo <= hi`: fixes shared high-order digits and expands the free
/// low-order ones, producing alternatives in increasing magnitude order.
fn walk_digit_tree(lo: &str, hi: &str) -> String {
    assert_eq!(lo.len(), hi.len());
    if lo == hi {
        return format!("\"{}\"", lo).trim_matches('"').to_string();
    }
    let lo_b = lo.as_bytes();
    let hi_b = hi.as_bytes();
    let n = lo_b.len();
    if n == 1 {
        return digit_class(lo_b[0], hi_b[0]);
    }
    let mut alts = Vec::new();
    if lo_b[0] == hi_b[0] {
        let rest = walk_digit_tree(&lo[1..], &hi[1..]);
        alts.push(format!("{}{}", lo_b[0] as char, rest));
    } else {
        // lo band: lo_b[0] fixed, rest ranges from lo[1..] to all-9s.
        let rest_all9 = "9".repeat(n - 1);
        if lo[1..] == rest_all9 {
            alts.push(format!("{}{}", lo_b[0] as char, rest_all9));
        } else {
            alts.push(format!("{}{}", lo_b[0] as char, walk_digit_tree(&lo[1..], &rest_all9)));
        }
        // middle bands: first digit strictly between lo and hi, rest free.
        if hi_b[0] - lo_b[0] >= 2 {
            alts.push(format!("{}\\d{{{}}}", digit_class(lo_b[0] + 1, hi_b[0] - 1), n - 1));
        }
        // hi band: hi_b[0] fixed, rest ranges from all-0s to hi[1..].
        let rest_all0 = "0".repeat(n - 1);
        if hi[1..] == rest_all0 {
            alts.push(format!("{}{}", hi_b[0] as char, rest_all0));
        } else {
            alts.push(format!("{}{}", hi_b[0] as char, walk_digit_tree(&rest_all0, &hi[1..])));
        }
    }
    if alts.len() == 1 {
        alts.pop().unwrap()
    } else {
        format!("({})", alts.join("|"))
    }
}

fn digit_class(lo: u8, hi: u8) -> String {
    if lo == hi {
        (lo as char).to_string()
    } else {
        format!("[{}-{}]", lo as char, hi as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex_automata::dfa::dense::DFA;
    use regex_automata::dfa::Automaton;
    use regex_automata::Input;

    fn accepts(pattern: &str, s: &str) -> bool {
        let dfa = DFA::new(pattern).unwrap();
        dfa.try_search_fwd(&Input::new(s)).unwrap().is_some()
    }

    #[test]
    fn s3_minus5_to_10() {
        let re = generate_range_regex(Some(-5), Some(10));
        assert_eq!(re, "^(-([1-5])|0|([1-9]|10))$");
        for s in ["-3", "0", "10"] {
            assert!(accepts(&re, s), "{s} should be accepted by {re}");
        }
        for s in ["-6", "11", "01"] {
            assert!(!accepts(&re, s), "{s} should be rejected by {re}");
        }
    }

    #[test]
    fn exactness_small_ranges() {
        for lo in -20i64..=20 {
            for hi in lo..=20 {
                let re = generate_range_regex(Some(lo), Some(hi));
                for n in -25i64..=25 {
                    let expect = (lo..=hi).contains(&n);
                    let got = accepts(&re, &n.to_string());
                    assert_eq!(got, expect, "n={n} lo={lo} hi={hi} re={re}");
                }
            }
        }
    }

    #[test]
    fn empty_range_rejects_everything() {
        let re = generate_range_regex(Some(10), Some(5));
        assert_eq!(re, "^()$");
        assert!(!accepts(&re, "7"));
    }

    #[test]
    fn unbounded_upper() {
        let re = generate_range_regex(Some(5), None);
        assert!(accepts(&re, "5"));
        assert!(accepts(&re, "9"));
        assert!(accepts(&re, "10"));
        assert!(accepts(&re, "999999"));
        assert!(!accepts(&re, "4"));
        assert!(!accepts(&re, "-1"));
    }

    #[test]
    fn unbounded_lower() {
        let re = generate_range_regex(None, Some(-5));
        assert!(accepts(&re, "-5"));
        assert!(accepts(&re, "-999999"));
        assert!(!accepts(&re, "-4"));
        assert!(!accepts(&re, "0"));
    }
}
