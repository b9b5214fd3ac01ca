use thiserror::Error;

/// The error kinds the configuration subsystem distinguishes.
///
/// Every failing operation in this crate returns one of these. Most carry
/// enough context (a byte index into the source, an offending token, a
/// directive or module name) to build a human-readable message; `dispatch`
/// additionally knows how to turn a [`CfgError::Syntax`] into a source
/// snippet via [`CfgError::render`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CfgError {
    /// The tokenizer or the entry parser could not advance.
    #[error("syntax error at byte {index}: {message}")]
    Syntax { message: String, index: usize },

    /// An entry collected more values or attributes than its fixed cap.
    #[error("entry `{name}` exceeds the {limit} maximum number of {kind}")]
    Capacity {
        name: String,
        kind: &'static str,
        limit: usize,
    },

    /// A directive name or an attribute key was not a valid identifier.
    #[error("`{text}` is not a valid identifier")]
    InvalidIdentifier { text: String },

    /// No spec in the current scope claims this directive name.
    #[error("unknown directive `{name}`")]
    UnknownDirective { name: String },

    /// A non-repeatable spec matched a second time.
    #[error("directive `{name}` may only appear once")]
    Duplicate { name: String },

    /// A spec with no default and `allow_none == false` was never matched.
    #[error("required directive `{name}` is missing")]
    MissingRequired { name: String },

    /// A stock handler's value was outside its configured range.
    #[error("value `{value}` for `{name}` is out of range ({min}..={max})")]
    ValueOutOfRange {
        name: String,
        value: String,
        min: i64,
        max: i64,
    },

    /// A stock handler rejected a value that was syntactically fine but
    /// semantically wrong (bad boolean keyword, unknown enum variant, string
    /// too long, not a multiple of N, ...).
    #[error("bad value `{value}` for `{name}`: {reason}")]
    BadValue {
        name: String,
        value: String,
        reason: String,
    },

    /// The nested-block recursion depth guard tripped.
    #[error("recursion limit ({limit}) reached while parsing nested blocks")]
    RecursionLimit { limit: usize },

    /// A module lifecycle hook returned an error.
    #[error("module `{module}` failed during {phase}: {message}")]
    Lifecycle {
        module: String,
        phase: &'static str,
        message: String,
    },

    /// `Coordinator::toggle` was given anything other than `start`/`stop`.
    #[error("invalid control value `{value}`, expected `start` or `stop`")]
    InvalidControlValue { value: String },

    /// Registration was attempted while the coordinator is running.
    #[error("cannot register module `{name}` while the system is running")]
    RegisterWhileRunning { name: String },
}

impl CfgError {
    /// Render a [`CfgError::Syntax`] as a source snippet with a caret
    /// pointing at the failing byte offset: up to 80 bytes of context before
    /// the position, the position itself, and a `^` marker on the line below.
    ///
    /// Non-syntax variants render as their `Display` message with no
    /// snippet, since they are not anchored to a single input position.
    pub fn render(&self, source: &str) -> String {
        let CfgError::Syntax { index, .. } = self else {
            return self.to_string();
        };
        let index = (*index).min(source.len());
        let mut start = index.saturating_sub(80);
        while start < index && !source.is_char_boundary(start) {
            start += 1;
        }
        let end = source[index..]
            .char_indices()
            .nth(1)
            .map(|(i, _)| index + i)
            .unwrap_or(source.len());
        let snippet = &source[start..end];
        let caret_offset = source[start..index].chars().count();
        let caret_line = format!("{}^", " ".repeat(caret_offset));
        format!("{self}\n{snippet}\n{caret_line}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_points_at_the_failing_byte() {
        let err = CfgError::Syntax {
            message: "unexpected token".into(),
            index: 5,
        };
        let rendered = err.render("abcdefgh;");
        assert!(rendered.contains("abcdefgh;"));
        assert!(rendered.ends_with('^'));
    }

    #[test]
    fn non_syntax_errors_render_as_display() {
        let err = CfgError::Duplicate {
            name: "dup".into(),
        };
        assert_eq!(err.render("anything"), err.to_string());
    }

    #[test]
    fn render_window_stays_within_80_bytes_for_multibyte_content() {
        // Each "é" is 2 bytes; 60 of them is 120 bytes, well past the window,
        // so the byte cutoff falls mid-character and must round forward.
        let source = format!("{}name \"abc", "é".repeat(60));
        let index = source.len();
        let err = CfgError::Syntax {
            message: "unterminated quoted literal".into(),
            index,
        };
        let rendered = err.render(&source);
        let snippet = rendered.lines().nth(1).unwrap();
        assert!(snippet.len() <= 80, "snippet was {} bytes", snippet.len());
    }
}
