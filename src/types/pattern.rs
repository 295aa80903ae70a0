use std::fmt;

use regex::Regex;
use serde::{Deserialize, Deserializer};

/// A name matcher that must match the entire input.
///
/// Patterns in rule documents are regular expressions anchored at both ends,
/// so `"sales"` matches only `sales` and never `sales_eu`. Literal patterns are
/// used for rules the engine synthesizes itself.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    matcher: Matcher,
}

#[derive(Clone)]
enum Matcher {
    Regex(Regex),
    Literal,
}

impl Pattern {
    /// Compile a full-match regular expression.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if `source` is not a valid expression.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_owned(),
            matcher: Matcher::Regex(regex),
        })
    }

    /// A pattern that matches exactly `value` and nothing else.
    #[must_use]
    pub fn literal(value: &str) -> Self {
        Self {
            source: value.to_owned(),
            matcher: Matcher::Literal,
        }
    }

    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        match &self.matcher {
            Matcher::Regex(regex) => regex.is_match(value),
            Matcher::Literal => self.source == value,
        }
    }

    /// Match `value` and expand `$1`-style group references in `template`
    /// with the captured text. Returns `None` if `value` does not match.
    #[must_use]
    pub fn expand(&self, value: &str, template: &str) -> Option<String> {
        match &self.matcher {
            Matcher::Regex(regex) => {
                let captures = regex.captures(value)?;
                Some(expand_groups(&captures, template))
            }
            Matcher::Literal => (self.source == value).then(|| template.to_owned()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the source contains a `$N` group reference, making it a
    /// template for [`expand`](Self::expand) rather than a fixed pattern.
    #[must_use]
    pub fn has_group_references(&self) -> bool {
        self.source
            .as_bytes()
            .windows(2)
            .any(|pair| pair[0] == b'$' && pair[1].is_ascii_digit())
    }
}

/// Replace `$N` with the text of group `N`; a `$` not followed by a digit is
/// kept as is. Only numeric references are recognised, so `$1_user` is group
/// 1 followed by `_user`.
fn expand_groups(captures: &regex::Captures<'_>, template: &str) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(at) = rest.find('$') {
        expanded.push_str(&rest[..at]);
        let after = &rest[at + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            expanded.push('$');
        } else if let Ok(index) = after[..digits].parse::<usize>() {
            if let Some(group) = captures.get(index) {
                expanded.push_str(group.as_str());
            }
        }
        rest = &after[digits..];
    }
    expanded.push_str(rest);
    expanded
}

/// An absent matcher matches anything.
pub(crate) fn matches(pattern: Option<&Pattern>, value: &str) -> bool {
    pattern.map_or(true, |p| p.is_match(value))
}

/// An absent matcher matches anything, including an empty set; a present
/// matcher needs at least one member to match.
pub(crate) fn matches_any<'a>(
    pattern: Option<&Pattern>,
    mut values: impl Iterator<Item = &'a String>,
) -> bool {
    pattern.map_or(true, |p| values.any(|v| p.is_match(v)))
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}
