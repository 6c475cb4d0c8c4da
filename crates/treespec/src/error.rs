use std::fmt;

/// Which hook list a failing hook belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Before,
    After,
    BeforeEach,
    AfterEach,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookKind::Before => "before",
            HookKind::After => "after",
            HookKind::BeforeEach => "before_each",
            HookKind::AfterEach => "after_each",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A hook returned an error or panicked. Hook failures abort the
    /// enclosing suite instead of being recorded on a single test.
    #[error("{kind} hook failed in `{suite}`: {message}")]
    Hook {
        kind: HookKind,
        suite: String,
        message: String,
    },

    #[error("failed to start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
