//! Heuristic payload inspection.
//!
//! The body is serialized to compact JSON and matched against a fixed rule set
//! covering script injection, inline handlers, `javascript:` URIs, SQL meta
//! sequences and shell metacharacters. This is a best-effort filter that can
//! both miss and over-match; schema validation in the handler is the stronger
//! control.

use regex::Regex;
use serde_json::Value;

/// A named signature.
struct Rule {
    name: &'static str,
    pattern: Regex,
}

const RULES: &[(&str, &str)] = &[
    ("script_tag", r"(?i)<\s*script"),
    ("event_handler", r"(?i)\bon[a-z]{3,}\s*="),
    ("javascript_uri", r"(?i)javascript\s*:"),
    ("sql_quote_equals", r"(?i)'\s*=|'\s*(or|and)\s+[^=]{0,32}="),
    ("sql_comment", r"'\s*--|/\*|\*/"),
    ("sql_stacked_statement", r"(?i);\s*(drop|delete|insert|update|select|truncate|alter)\b"),
    ("sql_union_select", r"(?i)\bunion\s+(all\s+)?select\b"),
    ("shell_substitution", r"\$\(|`"),
    ("shell_chaining", r"&&|\|\||;\s*(rm|curl|wget|cat|sh|bash|nc)\b|\|\s*(sh|bash|nc)\b"),
];

/// Scans request bodies for injection signatures. Pure; holds only compiled rules.
pub struct PayloadInspector {
    rules: Vec<Rule>,
}

impl PayloadInspector {
    pub fn new() -> Self {
        let rules = RULES
            .iter()
            .map(|&(name, pattern)| Rule {
                name,
                pattern: Regex::new(pattern).expect("built-in inspector pattern must compile"),
            })
            .collect();
        Self { rules }
    }

    /// Returns `true` if any rule matches the serialized body.
    pub fn is_suspicious(&self, body: &Value) -> bool {
        self.first_match(body).is_some()
    }

    /// Name of the first matching rule, if any.
    pub fn first_match(&self, body: &Value) -> Option<&'static str> {
        let text = body.to_string();
        self.first_match_in(&text)
    }

    pub fn first_match_in(&self, text: &str) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(text))
            .map(|rule| rule.name)
    }
}

impl Default for PayloadInspector {
    fn default() -> Self {
        Self::new()
    }
}
