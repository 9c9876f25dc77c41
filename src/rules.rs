//! Rules Store — a process-wide, lazily-loaded, immutable set of DOM
//! selectors and regex patterns consumed by the Cleaner (`spec.md` §4.2).
//!
//! Built-in defaults only; missing files simply mean "use built-ins" since
//! hot-reload is not required. Consolidated into one table rather than
//! scattered per-function statics, per Design Note "keep the patterns in a
//! single shared table and apply them identically."

use regex::Regex;
use std::sync::LazyLock;

pub struct FormatPatterns {
    pub excessive_newlines: Regex,
    pub any_table_line: Regex,
    pub function_calls_with_pipes: Regex,
    pub escape_chars: Regex,
    pub trailing_backslashes: Regex,
    pub pipe_with_dashes: Regex,
}

impl FormatPatterns {
    fn defaults() -> Self {
        Self {
            excessive_newlines: Regex::new(r"\n{3,}")
                .expect("excessive_newlines: hardcoded regex is valid"),
            any_table_line: Regex::new(r"(?m)^.*\|.*\|.*$")
                .expect("any_table_line: hardcoded regex is valid"),
            function_calls_with_pipes: Regex::new(r"(?m).*_[a-zA-Z0-9_]+.*\|.*$")
                .expect("function_calls_with_pipes: hardcoded regex is valid"),
            escape_chars: Regex::new(r"\\[_\\`']")
                .expect("escape_chars: hardcoded regex is valid"),
            trailing_backslashes: Regex::new(r"(?m)\\$")
                .expect("trailing_backslashes: hardcoded regex is valid"),
            pipe_with_dashes: Regex::new(r"(?m).*\|\s*-{5,}\s*$")
                .expect("pipe_with_dashes: hardcoded regex is valid"),
        }
    }
}

pub struct RulesStore {
    pub header_footer_tags: Vec<&'static str>,
    pub header_footer_classes: Vec<&'static str>,
    pub header_footer_ids: Vec<&'static str>,
    pub contains_in_class_or_id: Vec<&'static str>,
    pub cookies_consent: Vec<&'static str>,
    pub format_patterns: FormatPatterns,
}

impl RulesStore {
    fn defaults() -> Self {
        Self {
            header_footer_tags: vec!["header", "footer", "nav", "aside"],
            header_footer_classes: vec![
                "header", "footer", "nav", "navbar", "sidebar", "breadcrumb", "pagination",
            ],
            header_footer_ids: vec!["header", "footer", "nav", "sidebar"],
            contains_in_class_or_id: vec![
                "cookie", "consent", "advert", "banner", "popup", "modal-overlay", "newsletter",
                "social-share", "related-posts", "comment",
            ],
            cookies_consent: vec![
                "#cookie-consent",
                ".cookie-consent",
                "#cookie-banner",
                ".cookie-banner",
                "[class*=\"cookie-notice\"]",
                "[id*=\"cookie-notice\"]",
            ],
            format_patterns: FormatPatterns::defaults(),
        }
    }
}

pub static RULES: LazyLock<RulesStore> = LazyLock::new(RulesStore::defaults);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_patterns_match_spec_examples() {
        assert!(RULES.format_patterns.excessive_newlines.is_match("a\n\n\n\nb"));
        assert!(RULES.format_patterns.any_table_line.is_match("| a | b |"));
        assert!(RULES.format_patterns.escape_chars.is_match(r"\_"));
        assert!(RULES.format_patterns.trailing_backslashes.is_match("line\\"));
    }

    #[test]
    fn rules_store_is_a_single_shared_singleton() {
        let a = &*RULES as *const RulesStore;
        let b = &*RULES as *const RulesStore;
        assert_eq!(a, b);
    }
}
