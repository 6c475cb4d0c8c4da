//! Selection flags (focus, solo, skip) and the leading-space name convention.

/// How a node takes part in a run.
///
/// Exactly one variant applies to a node and it never changes after
/// registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Normal,
    /// Narrows its parent's run to focused members ("only").
    Focused,
    /// Restricts the whole run to this node's subtree.
    Solo,
    /// Excluded from both execution and reporting.
    Skip,
}

impl Selection {
    /// Derive the selection from a raw node name.
    ///
    /// ```text
    /// " name"    -> Focused
    /// "  name"   -> Solo
    /// "   name"  -> Skip
    /// "name"     -> Normal
    /// ```
    ///
    /// The most specific prefix wins: only the first three characters are
    /// looked at.
    pub fn from_name(name: &str) -> Self {
        let mut chars = name.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(' '), Some(' '), Some(' ')) => Selection::Skip,
            (Some(' '), Some(' '), _) => Selection::Solo,
            (Some(' '), _, _) => Selection::Focused,
            _ => Selection::Normal,
        }
    }

    /// An explicit selection wins over whatever the name prefix says.
    pub(crate) fn resolve(self, name: &str) -> Self {
        match self {
            Selection::Normal => Selection::from_name(name),
            explicit => explicit,
        }
    }

    pub fn is_focused(self) -> bool {
        self == Selection::Focused
    }

    pub fn is_solo(self) -> bool {
        self == Selection::Solo
    }

    pub fn is_skip(self) -> bool {
        self == Selection::Skip
    }
}

/// The name shown in reports: trimmed, and reduced to the last path
/// segment when it looks like a path.
pub fn display_name(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.starts_with('/') {
        match trimmed.rsplit('/').next() {
            Some(last) if !last.is_empty() => last,
            _ => trimmed,
        }
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_prefixes() {
        assert_eq!(Selection::from_name("a"), Selection::Normal);
        assert_eq!(Selection::from_name(" a"), Selection::Focused);
        assert_eq!(Selection::from_name("  a"), Selection::Solo);
        assert_eq!(Selection::from_name("   a"), Selection::Skip);
        assert_eq!(Selection::from_name("      a"), Selection::Skip);
    }

    #[test]
    fn test_flags_are_exclusive() {
        let solo = Selection::from_name("  a");
        assert!(solo.is_solo());
        assert!(!solo.is_focused());
        assert!(!solo.is_skip());

        let focused = Selection::from_name(" a");
        assert!(focused.is_focused());
        assert!(!focused.is_solo());
    }

    #[test]
    fn test_short_names() {
        assert_eq!(Selection::from_name(""), Selection::Normal);
        assert_eq!(Selection::from_name(" "), Selection::Focused);
        assert_eq!(Selection::from_name("  "), Selection::Solo);
        assert_eq!(Selection::from_name("a "), Selection::Normal);
    }

    #[test]
    fn test_explicit_selection_wins() {
        assert_eq!(Selection::Skip.resolve(" a"), Selection::Skip);
        assert_eq!(Selection::Normal.resolve("  a"), Selection::Solo);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("  padded  "), "padded");
        assert_eq!(display_name("/src/math/add.rs"), "add.rs");
        assert_eq!(display_name(" /src/dir/"), "/src/dir/");
        assert_eq!(display_name("a/b"), "a/b");
    }
}
