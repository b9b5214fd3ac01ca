/// Maximum number of values one entry may carry (spec §3).
pub const MAX_VALS: usize = 16;
/// Maximum number of attributes one entry may carry (spec §3).
pub const MAX_ATTRS: usize = 16;

/// A parsed directive: a name, its ordered values, its ordered attributes,
/// and whether it is immediately followed by a `{ ... }` block.
///
/// `Entry` is built incrementally by [`crate::parser::EntryParser`], handed
/// to exactly one handler by the dispatcher, and then dropped — nothing
/// downstream retains it past that single call, so the owned `String`s here
/// are freed the moment dispatch moves on to the next directive. A handler
/// that wants to keep a value past its own call must copy it out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub values: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub has_children: bool,
}

impl Entry {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            values: Vec::new(),
            attributes: Vec::new(),
            has_children: false,
        }
    }

    /// `name` is unset, meaning the parser hit clean EOF before finding a
    /// directive — this is how `dispatch` tells "no more entries" apart from
    /// "an entry with an empty name" (which can never be constructed, since
    /// [`Entry::new`] is only called with the text of a `Literal` token).
    pub(crate) fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// An identifier is non-empty, starts with an ASCII letter, and continues
/// with ASCII alphanumerics or underscores (spec §3).
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_rules() {
        assert!(is_identifier("a"));
        assert!(is_identifier("entry_1"));
        assert!(is_identifier("Entry1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1entry"));
        assert!(!is_identifier("entry-1"));
        assert!(!is_identifier("_entry"));
    }
}
