//! # treespec: a minimal hierarchical test runner
//!
//! Organize async tests into nested suites with inherited hooks, narrow a run
//! with focus/solo/skip, and get a nested, collapsible report.
//!
//! ## Quick example
//!
//! ```rust,no_run
//! fn main() {
//!     let result = treespec::run(|ctx| {
//!         ctx.describe("Calculator", |ctx| {
//!             ctx.before_each(|t| t.input().set_attribute("value", "2"));
//!
//!             ctx.it("adds two numbers", |t| async move {
//!                 t.assert(2 + 3 == 5, "2 + 3 = 5");
//!             });
//!
//!             ctx.describe("with negative numbers", |ctx| {
//!                 ctx.fit("handles negatives", |t| async move {
//!                     t.assert(-1 + 1 == 0, "-1 + 1 = 0");
//!                 });
//!             });
//!         });
//!     });
//!     if result.failed() {
//!         std::process::exit(1);
//!     }
//! }
//! ```
//!
//! ## Selection
//!
//! - `fit` / `fdescribe`, or one leading space in the name, focus a node:
//!   its parent only runs focused members.
//! - `sit` / `sdescribe`, or two leading spaces, make a node solo: only its
//!   subtree runs, reported expanded.
//! - `xit` / `xdescribe`, or three leading spaces, skip a node entirely.
//!
//! ## Features
//!
//! - `macros` (default): the [`suite!`] DSL
//! - `googletest`: re-exports `googletest` matchers via `treespec::matchers`

pub mod console;
mod context;
mod error;
pub mod report;
mod result;
pub mod runner;
pub mod sandbox;
mod scope;
mod selection;
mod spy;
pub mod tree;

pub use context::{Context, ItBuilder};
pub use error::{Error, HookKind, Result};
pub use result::TestResult;
pub use runner::{run, RunConfig, Runner};
pub use scope::{IntoOutcome, TestContext};
pub use selection::{display_name, Selection};
pub use spy::{SpyGuard, Spyable};
pub use tree::{Node, Suite, Test};

/// Re-export for test bodies and hooks that return `anyhow::Result<()>`.
pub use anyhow;

#[cfg(feature = "macros")]
pub use treespec_macros::suite;

/// Re-export of the [`googletest`] crate. Available with the `googletest` feature.
#[cfg(feature = "googletest")]
pub use googletest;

/// Composable matchers re-exported from [`googletest::prelude`].
#[cfg(feature = "googletest")]
pub mod matchers {
    pub use googletest::prelude::*;
}

use std::time::Duration;

/// A drop guard that runs cleanup code even if the surrounding code panics.
pub struct Guard<F: FnOnce()> {
    f: Option<F>,
}

impl<F: FnOnce()> Guard<F> {
    pub fn new(f: F) -> Self {
        Guard { f: Some(f) }
    }
}

impl<F: FnOnce()> Drop for Guard<F> {
    fn drop(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}

/// Resolve after `duration` has elapsed.
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Yield to the timer for a moment (4 ms).
pub async fn defer() {
    sleep(Duration::from_millis(4)).await;
}
