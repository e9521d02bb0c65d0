//! One-shot hostname gate deciding whether the engine activates at all.

use serde::Deserialize;
use tracing::warn;

/// Hostname gate parsed from `allowlist:<p1>,<p2>` or `denylist:<p1>,<p2>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum DomainGate {
    #[default]
    Disabled,
    AllowList(Vec<String>),
    DenyList(Vec<String>),
}

impl DomainGate {
    /// Parses the textual gate.
    ///
    /// Anything without a recognized prefix is reported and treated as no gate.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::Disabled;
        }

        if let Some(list) = text.strip_prefix("allowlist:") {
            Self::AllowList(split_patterns(list))
        } else if let Some(list) = text.strip_prefix("denylist:") {
            Self::DenyList(split_patterns(list))
        } else {
            warn!(
                value = text,
                "Domain gate must start with 'allowlist:' or 'denylist:'; leaving the engine enabled"
            );
            Self::Disabled
        }
    }

    /// Whether the engine may run on `hostname`.
    #[must_use]
    pub fn allows(&self, hostname: &str) -> bool {
        match self {
            Self::Disabled => true,
            Self::AllowList(patterns) => patterns.iter().any(|p| pattern_matches(p, hostname)),
            Self::DenyList(patterns) => !patterns.iter().any(|p| pattern_matches(p, hostname)),
        }
    }
}

impl From<String> for DomainGate {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

fn split_patterns(list: &str) -> Vec<String> {
    list.split(',').map(str::trim).filter(|p| !p.is_empty()).map(str::to_owned).collect()
}

/// Unanchored match where every `*` stands for one or more characters.
fn pattern_matches(pattern: &str, hostname: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };

    boundaries(hostname).any(|start| {
        hostname[start..].starts_with(first) && matches_from(rest, &hostname[start + first.len()..])
    })
}

/// Each remaining segment must start at least one character into `haystack`.
fn matches_from(segments: &[&str], haystack: &str) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return true;
    };

    boundaries(haystack).skip(1).any(|start| {
        haystack[start..].starts_with(segment) && matches_from(rest, &haystack[start + segment.len()..])
    })
}

fn boundaries(text: &str) -> impl Iterator<Item = usize> + '_ {
    text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deny_wildcard_subdomain() {
        let gate = DomainGate::parse("denylist:*.example.com");

        assert!(!gate.allows("app.example.com"));
        assert!(gate.allows("example.org"));
        assert!(gate.allows("example.com"));
    }

    #[test]
    fn test_allow_list() {
        let gate = DomainGate::parse("allowlist:localhost, *.dev.test");

        assert!(gate.allows("localhost"));
        assert!(gate.allows("a.dev.test"));
        assert!(!gate.allows("prod.test"));
    }

    #[test]
    fn test_literal_patterns_match_as_substring() {
        let gate = DomainGate::parse("denylist:example.com");

        assert!(!gate.allows("www.example.com"));
        assert!(!gate.allows("example.com.evil.test"));
        assert!(gate.allows("examplexcom"));
    }

    #[test]
    fn test_star_needs_at_least_one_char() {
        assert!(pattern_matches("a*b", "axb"));
        assert!(!pattern_matches("a*b", "ab"));
        assert!(pattern_matches("*", "x"));
        assert!(!pattern_matches("*", ""));
        assert!(pattern_matches("a**c", "axyc"));
        assert!(!pattern_matches("a**c", "axc"));
        assert!(pattern_matches("*.test", "x.test"));
        assert!(!pattern_matches("*.test", ".test"));
        assert!(pattern_matches("app*", "myapp1"));
        assert!(!pattern_matches("app*", "myapp"));
    }

    #[test]
    fn test_malformed_gate_leaves_engine_enabled() {
        let gate = DomainGate::parse("blocklist:*");

        assert_eq!(gate, DomainGate::Disabled);
        assert!(gate.allows("anything.test"));
    }
}
