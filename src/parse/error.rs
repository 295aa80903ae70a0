use winnow::error::{ContextError, StrContext};

/// A configuration value that did not parse, with the position of the first
/// character that could not be consumed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{input}' is invalid at offset {offset}: expected {expected}")]
pub struct ParseError {
    input: String,
    offset: usize,
    expected: String,
}

impl ParseError {
    pub(crate) fn from_winnow(error: &winnow::error::ParseError<&str, ContextError>) -> Self {
        let expected: Vec<String> = error
            .inner()
            .context()
            .filter_map(|context| match context {
                StrContext::Expected(value) => Some(value.to_string()),
                _ => None,
            })
            .collect();
        // Nothing expected means the value parsed but was followed by more text.
        let expected = if expected.is_empty() {
            "end of input".to_owned()
        } else {
            expected.join(" or ")
        };
        Self {
            input: (*error.input()).to_owned(),
            offset: error.offset(),
            expected,
        }
    }

    /// The full value that was being parsed.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Byte offset into [`input`](Self::input) where parsing stopped.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }
}
