//! Format-regex library (spec §4.E): the canonical regex for each
//! supported `"format"` keyword value.
use std::sync::OnceLock;

/// Returns the regex body (to be anchored by the caller, e.g. with
/// `^(...)$`) for a supported `format` keyword, or `None` if the format is
/// not in the supported set (spec §6).
pub fn format_regex(name: &str) -> Option<String> {
    Some(match name {
        "email" => EMAIL.to_string(),
        "date" => DATE.to_string(),
        "time" => TIME.to_string(),
        "date-time" => DATE_TIME.to_string(),
        "duration" => DURATION.to_string(),
        "ipv4" => ipv4_pattern().to_string(),
        "ipv6" => ipv6_pattern().to_string(),
        "hostname" => hostname_pattern().to_string(),
        "uuid" => UUID.to_string(),
        "uri" => uri_pattern().to_string(),
        "uri-reference" => URI_REST.to_string(),
        "uri-template" => uri_template_pattern().to_string(),
        "json-pointer" => JSON_POINTER.to_string(),
        "relative-json-pointer" => RELATIVE_JSON_POINTER.to_string(),
        _ => return None,
    })
}

pub const SUPPORTED_FORMATS: &[&str] = &[
    "email",
    "date",
    "time",
    "date-time",
    "duration",
    "ipv4",
    "ipv6",
    "hostname",
    "uuid",
    "uri",
    "uri-reference",
    "uri-template",
    "json-pointer",
    "relative-json-pointer",
];

pub fn is_supported(name: &str) -> bool {
    SUPPORTED_FORMATS.contains(&name)
}

const EMAIL: &str = r"[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*";

const DATE: &str = r"[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])";

const TIME: &str = r"([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]{1,3})?(Z|[+-][0-9]{2}:[0-9]{2})";

const DATE_TIME: &str = r"[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])T([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]{1,3})?(Z|[+-][0-9]{2}:[0-9]{2})";

const DURATION: &str = r"P([0-9]+W|([0-9]+Y([0-9]+M([0-9]+D)?)?|[0-9]+M([0-9]+D)?|[0-9]+D)(T([0-9]+H([0-9]+M([0-9]+S)?)?|[0-9]+M([0-9]+S)?|[0-9]+S))?|T([0-9]+H([0-9]+M([0-9]+S)?)?|[0-9]+M([0-9]+S)?|[0-9]+S))";

const IPV4_OCTET: &str = r"(25[0-5]|2[0-4][0-9]|1[0-9]{2}|0?[0-9]{1,2})";

const HOSTNAME_LABEL: &str = r"[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?";

const UUID: &str = r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

const JSON_POINTER: &str = r"(/([^~/]|~0|~1)*)*";

const RELATIVE_JSON_POINTER: &str = r"(0|[1-9][0-9]*)(#|(/([^~/]|~0|~1)*)*)";

const URI_SCHEME: &str = r"[a-zA-Z][a-zA-Z0-9+.-]*";
const URI_REST: &str = r"[^\s\x00-\x1f<>\\^`{|}\x7f]*";

fn ipv4_pattern() -> &'static str {
    static P: OnceLock<String> = OnceLock::new();
    P.get_or_init(|| format!("{o}\\.{o}\\.{o}\\.{o}", o = IPV4_OCTET))
}

fn hostname_pattern() -> &'static str {
    static P: OnceLock<String> = OnceLock::new();
    P.get_or_init(|| format!("{l}(\\.{l})*", l = HOSTNAME_LABEL))
}

fn uri_pattern() -> &'static str {
    static P: OnceLock<String> = OnceLock::new();
    P.get_or_init(|| format!("{}:{}", URI_SCHEME, URI_REST))
}

fn ipv6_pattern() -> &'static str {
    static P: OnceLock<String> = OnceLock::new();
    P.get_or_init(|| {
        let h = "[0-9a-fA-F]{1,4}";
        let ipv4 = format!("{o}\\.{o}\\.{o}\\.{o}", o = IPV4_OCTET);
        // Full form, a single "::" compression at any position, or a
        // trailing embedded IPv4 literal in either form.
        format!(
            "(({h}:){{7}}{h}|(({h}:)*{h})?::(({h}:)*{h})?|(({h}:){{1,6}}:{ipv4})|::{ipv4})",
            h = h,
            ipv4 = ipv4
        )
    })
}

fn uri_template_pattern() -> &'static str {
    static P: OnceLock<String> = OnceLock::new();
    P.get_or_init(|| r"([^\x00-\x1f{}]|\{[a-zA-Z0-9_,.:/?#\[\]@!$&'()*+;=-]+\})*".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex_automata::dfa::dense::DFA;
    use regex_automata::dfa::Automaton;
    use regex_automata::Input;

    fn full_match(pattern: &str, s: &str) -> bool {
        let anchored = format!("^(?:{})$", pattern);
        let dfa = DFA::new(&anchored).unwrap();
        dfa.try_search_fwd(&Input::new(s)).unwrap().is_some()
    }

    #[test]
    fn ipv4_accepts_and_rejects() {
        let p = format_regex("ipv4").unwrap();
        assert!(full_match(&p, "0.0.0.0"));
        assert!(full_match(&p, "255.255.255.255"));
        assert!(!full_match(&p, "256.0.0.0"));
        assert!(!full_match(&p, "1.1.1"));
    }

    #[test]
    fn ipv6_accepts_full_and_compressed() {
        let p = format_regex("ipv6").unwrap();
        assert!(full_match(&p, "2001:0db8:0000:0000:0000:ff00:0042:8329"));
        assert!(full_match(&p, "::1"));
        assert!(full_match(&p, "::"));
        assert!(!full_match(&p, "not:an:ipv6"));
    }

    #[test]
    fn uuid_matches_canonical_form() {
        let p = format_regex("uuid").unwrap();
        assert!(full_match(&p, "123e4567-e89b-12d3-a456-426614174000"));
        assert!(!full_match(&p, "not-a-uuid"));
    }

    #[test]
    fn hostname_rejects_leading_hyphen() {
        let p = format_regex("hostname").unwrap();
        assert!(full_match(&p, "example.com"));
        assert!(!full_match(&p, "-example.com"));
    }

    #[test]
    fn email_accepts_simple_address() {
        let p = format_regex("email").unwrap();
        assert!(full_match(&p, "user@example.com"));
        assert!(!full_match(&p, "not-an-email"));
    }

    #[test]
    fn date_time_accepts_rfc3339() {
        let p = format_regex("date-time").unwrap();
        assert!(full_match(&p, "2026-07-31T12:00:00Z"));
        assert!(!full_match(&p, "2026-13-01T00:00:00Z"));
    }

    #[test]
    fn duration_requires_at_least_one_component_and_forbids_skipped_designators() {
        let p = format_regex("duration").unwrap();
        for s in ["P1Y2M3D", "P1Y2M3DT4H5M6S", "P1W", "PT5M", "P1D", "PT1S"] {
            assert!(full_match(&p, s), "{s} should match {p}");
        }
        for s in ["P", "PT", "P1Y456D", "PT9H654S"] {
            assert!(!full_match(&p, s), "{s} should not match {p}");
        }
    }

    #[test]
    fn unsupported_format_returns_none() {
        assert!(format_regex("not-a-format").is_none());
        assert!(!is_supported("not-a-format"));
    }

    #[test]
    fn uri_template_matches_variable_expression() {
        let p = uri_template_pattern();
        assert!(full_match(p, "/users/{id}"));
    }
}
