//! Pattern-based text normalization for utterance display.

use regex::Regex;
use thiserror::Error;

/// Error raised when a rewrite rule fails to compile.
///
/// Bad patterns are a configuration-time failure; [`TextNormalizer::normalize`]
/// itself never fails.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("invalid rewrite pattern: {0}")]
    BadPattern(#[from] regex::Error),
}

/// The canonical rewrite rules, in application order.
///
/// Order is load-bearing: URL stripping runs before newline collapsing so a
/// URL followed by a newline is removed entirely instead of leaving a stray
/// separator behind.
const DEFAULT_RULES: &[(&str, &str)] = &[
    // URL token followed by whitespace
    (r"https?://\S*\s+", " "),
    // URL token running to the end of the text
    (r"https?://\S*", " "),
    // markdown link-destination opener, `[label](` inclusive
    (r"\[[^\]]*\]\(", " "),
    // period followed by newline run
    (r"\.\n+", ". "),
    // any remaining newline run
    (r"\n+", ". "),
];

/// Applies an ordered list of pattern rewrites to utterance text.
///
/// Each rule is a replace-all pass over the output of the previous rule, so
/// the rules do not commute and the list order is part of the contract.
/// Normalization is deterministic, but idempotence is not guaranteed for
/// arbitrary rule lists: a second application can rewrite further if an
/// earlier rule's output exposes new matches for a later rule.
pub struct TextNormalizer {
    rules: Vec<(Regex, String)>,
}

impl TextNormalizer {
    /// Build a normalizer from an explicit ordered rule list.
    pub fn new(rules: &[(&str, &str)]) -> Result<Self, NormalizeError> {
        let rules = rules
            .iter()
            .map(|(pattern, replacement)| {
                Ok((Regex::new(pattern)?, (*replacement).to_string()))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Normalize raw text into a single-line-oriented display string.
    ///
    /// Pure; empty input yields empty output.
    pub fn normalize(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (pattern, replacement) in &self.rules {
            out = pattern.replace_all(&out, replacement.as_str()).into_owned();
        }
        out
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_RULES).expect("default rewrite rules must compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_with_trailing_newline_fully_removed() {
        let n = TextNormalizer::default();
        // The URL and its trailing newline collapse into one space; the
        // space already present before the URL survives.
        assert_eq!(
            n.normalize("check this http://example.com/path\nout"),
            "check this  out"
        );
    }

    #[test]
    fn test_url_at_end_of_text() {
        let n = TextNormalizer::default();
        assert_eq!(n.normalize("see https://example.com/a?b=c"), "see  ");
    }

    #[test]
    fn test_markdown_link_opener_stripped() {
        let n = TextNormalizer::default();
        assert_eq!(n.normalize("read [the docs](here"), "read  here");
    }

    #[test]
    fn test_newline_runs_collapse_to_period_space() {
        let n = TextNormalizer::default();
        assert_eq!(n.normalize("line one\n\nline two"), "line one. line two");
    }

    #[test]
    fn test_period_newline_keeps_single_period() {
        let n = TextNormalizer::default();
        assert_eq!(n.normalize("done.\n\nnext"), "done. next");
    }

    #[test]
    fn test_empty_and_sentinel_text() {
        let n = TextNormalizer::default();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize("[deleted]"), "[deleted]");
    }

    #[test]
    fn test_deterministic() {
        let n = TextNormalizer::default();
        let input = "a http://b.c\nd\n\ne.";
        assert_eq!(n.normalize(input), n.normalize(input));
    }

    #[test]
    fn test_rule_order_is_load_bearing() {
        // Reversing the newline rules turns every period-newline into two
        // separators instead of one.
        let reversed = TextNormalizer::new(&[(r"\n+", ". "), (r"\.\n+", ". ")]).unwrap();
        let canonical = TextNormalizer::new(&[(r"\.\n+", ". "), (r"\n+", ". ")]).unwrap();
        let input = "end.\nnext";
        assert_eq!(canonical.normalize(input), "end. next");
        assert_eq!(reversed.normalize(input), "end.. next");
    }

    #[test]
    fn test_idempotence_not_guaranteed_for_custom_rules() {
        // A shrinking rule shows why re-running is not a no-op in general.
        let n = TextNormalizer::new(&[("aa", "a")]).unwrap();
        let once = n.normalize("aaaa");
        let twice = n.normalize(&once);
        assert_eq!(once, "aa");
        assert_eq!(twice, "a");
        assert_ne!(once, twice);
    }

    #[test]
    fn test_default_rules_stable_on_second_pass() {
        // The canonical list leaves no newlines or URL tokens behind, so a
        // second pass happens to be a no-op on these inputs. Probed, not
        // assumed.
        let n = TextNormalizer::default();
        for input in [
            "check this http://example.com/path\nout",
            "line one\n\nline two",
            "[a](http://x.y) tail\n",
        ] {
            let once = n.normalize(input);
            assert_eq!(n.normalize(&once), once);
        }
    }

    #[test]
    fn test_bad_pattern_is_configuration_error() {
        assert!(TextNormalizer::new(&[("(", " ")]).is_err());
    }
}
