// ABOUTME: Placeholder syntax, caller definitions and the substitution plan
// ABOUTME: Decides which found keys are replaced, removed as optional, or reported as undefined

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `{{KEY}}`; `.` stops at line breaks so a token never spans one.
static CURLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("valid placeholder pattern"));

/// `[[KEY]]`
static SQUARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("valid placeholder pattern"));

/// Delimiter pair wrapping a placeholder key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DelimiterStyle {
    /// `{{KEY}}`
    #[default]
    Curly,
    /// `[[KEY]]`
    Square,
}

impl DelimiterStyle {
    pub fn open(&self) -> &'static str {
        match self {
            DelimiterStyle::Curly => "{{",
            DelimiterStyle::Square => "[[",
        }
    }

    pub fn close(&self) -> &'static str {
        match self {
            DelimiterStyle::Curly => "}}",
            DelimiterStyle::Square => "]]",
        }
    }

    pub fn wrap(&self, key: &str) -> String {
        format!("{}{}{}", self.open(), key, self.close())
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            DelimiterStyle::Curly => &CURLY_RE,
            DelimiterStyle::Square => &SQUARE_RE,
        }
    }
}

pub const DEFAULT_OPTIONAL_PREFIX: &str = "ADDL_";

/// A placeholder occurrence inside a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Byte range of the whole token, delimiters included
    pub start: usize,
    pub end: usize,
    pub key: String,
}

/// Matching rules shared by scanning and substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSyntax {
    style: DelimiterStyle,
    optional_prefix: String,
}

impl PlaceholderSyntax {
    pub fn new(style: DelimiterStyle, optional_prefix: impl Into<String>) -> Self {
        Self {
            style,
            optional_prefix: optional_prefix.into(),
        }
    }

    pub fn style(&self) -> DelimiterStyle {
        self.style
    }

    pub fn optional_prefix(&self) -> &str {
        &self.optional_prefix
    }

    pub fn is_optional(&self, key: &str) -> bool {
        !self.optional_prefix.is_empty() && key.starts_with(&self.optional_prefix)
    }

    /// Tokens in `text`, left to right, non-overlapping. The shortest match
    /// wins, a token never spans a line break, keys are trimmed and empty keys
    /// are skipped.
    pub fn tokens(&self, text: &str) -> Vec<Token> {
        self.style
            .pattern()
            .captures_iter(text)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let key = captures.get(1)?.as_str().trim();
                (!key.is_empty()).then(|| Token {
                    start: whole.start(),
                    end: whole.end(),
                    key: key.to_string(),
                })
            })
            .collect()
    }

    pub fn plan(&self, found: &BTreeSet<String>, definitions: &Definitions) -> PlaceholderPlan {
        let mut undefined = BTreeSet::new();
        let mut removals = BTreeSet::new();

        for key in found.iter().filter(|key| !definitions.contains(key)) {
            if self.is_optional(key) {
                removals.insert(key.clone());
            } else {
                undefined.insert(key.clone());
            }
        }

        PlaceholderPlan {
            found: found.clone(),
            undefined,
            removals,
        }
    }
}

impl Default for PlaceholderSyntax {
    fn default() -> Self {
        Self::new(DelimiterStyle::default(), DEFAULT_OPTIONAL_PREFIX)
    }
}

/// Replacement values supplied by the caller. Last write wins per key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definitions {
    values: BTreeMap<String, String>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Definitions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut definitions = Definitions::new();
        for (key, value) in iter {
            definitions.insert(key, value);
        }
        definitions
    }
}

/// What happens to each placeholder found in a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderPlan {
    pub found: BTreeSet<String>,
    /// Found, not defined, not optional: left in place and reported
    pub undefined: BTreeSet<String>,
    /// Found, not defined, optional: replaced with nothing
    pub removals: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_trim_keys_and_skip_empty() {
        let syntax = PlaceholderSyntax::default();
        let tokens = syntax.tokens("Hi {{ NAME }}, {{}} from {{COMPANY}}");

        let keys: Vec<&str> = tokens.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["NAME", "COMPANY"]);
        assert_eq!(tokens[0].start, 3);
        assert_eq!(tokens[0].end, 13);
    }

    #[test]
    fn test_token_does_not_cross_line_break() {
        let syntax = PlaceholderSyntax::default();
        let tokens = syntax.tokens("{{BROKEN\n}} then {{OK}}");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].key, "OK");
    }

    #[test]
    fn test_shortest_match_wins() {
        let syntax = PlaceholderSyntax::default();
        let tokens = syntax.tokens("{{A}}{{B}} and {{ {{C}}");
        let keys: Vec<&str> = tokens.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "{{C"]);
        assert_eq!((tokens[1].start, tokens[1].end), (5, 10));
    }

    #[test]
    fn test_unterminated_token_is_ignored() {
        let syntax = PlaceholderSyntax::default();
        assert!(syntax.tokens("{{NAME} and more").is_empty());
    }

    #[test]
    fn test_square_style_ignores_curly_tokens() {
        let syntax = PlaceholderSyntax::new(DelimiterStyle::Square, "ADDL_");
        let tokens = syntax.tokens("[[CITY]] and {{STATE}}");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].key, "CITY");
        assert_eq!(DelimiterStyle::Square.wrap("CITY"), "[[CITY]]");
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let syntax = PlaceholderSyntax::default();
        let found: BTreeSet<String> = ["Company".to_string()].into_iter().collect();
        let definitions: Definitions = [("COMPANY", "Acme")].into_iter().collect();

        let plan = syntax.plan(&found, &definitions);
        assert!(plan.undefined.contains("Company"));
    }

    #[test]
    fn test_plan_splits_optional_and_reportable() {
        let syntax = PlaceholderSyntax::default();
        let found: BTreeSet<String> = ["COMPANY", "ADDL_NOTE", "UNDEFINED_FIELD", "ADDL_PS"]
            .iter()
            .map(|k| k.to_string())
            .collect();
        let definitions: Definitions = [("COMPANY", "Acme"), ("ADDL_PS", "P.S.")]
            .into_iter()
            .collect();

        let plan = syntax.plan(&found, &definitions);

        assert_eq!(plan.found.len(), 4);
        assert_eq!(
            plan.undefined.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["UNDEFINED_FIELD"]
        );
        assert_eq!(plan.removals.iter().map(String::as_str).collect::<Vec<_>>(), vec!["ADDL_NOTE"]);
    }

    #[test]
    fn test_definitions_last_write_wins() {
        let definitions: Definitions = [("KEY", "first"), ("KEY", "second")].into_iter().collect();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions.get("KEY"), Some("second"));
    }
}
