//! The driver: build the root suite, initialize it, run it and report it.
//!
//! ```text
//! ▾ 🦆 🦄 TESTS 🦄 (1/2)
//!   ▸ ✅ Calculator (2/2)
//!   ▾ 🙉 Parser (0/1)
//!     ▾ rejects garbage (3ms)
//!       expected an error
//! ```

use crate::console::{Console, LogLine, LogSink, TerminalSink};
use crate::context::Context;
use crate::error::Result;
use crate::report::{FailureGlyphs, Reporter};
use crate::result::TestResult;
use crate::sandbox::{DetachedSandbox, Sandbox};
use crate::tree::{Env, Node, Suite};
use std::rc::Rc;

/// Name of the suite that holds everything registered through [`run`].
pub const ROOT_NAME: &str = "🦄 TESTS 🦄";

// ============================================================================
// Configuration
// ============================================================================

/// Configuration parsed from command-line args and the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub root_name: String,
    /// Render the whole report expanded.
    pub open: bool,
    pub color: bool,
    /// Only print the tree that would run.
    pub list: bool,
    /// Fixes the starting offset of the failure glyph ring.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            root_name: ROOT_NAME.to_string(),
            open: false,
            color: false,
            list: false,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Parse from the process args (compatible with `cargo test -- <args>`)
    /// and environment.
    pub fn from_args() -> Self {
        let mut config = Self::parse(std::env::args().skip(1), |key| std::env::var(key).ok());
        config.color = config.color && std::io::IsTerminal::is_terminal(&std::io::stdout());
        config
    }

    /// Parse `args` (without the binary name), reading variables through `env`.
    ///
    /// Recognized: `--open`, `--no-color`, `--list`, `--seed <n>`,
    /// `TREESPEC_OPEN`, `TREESPEC_SEED`, `NO_COLOR`. Everything else is
    /// ignored.
    pub fn parse(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut config = RunConfig {
            open: env("TREESPEC_OPEN").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
            color: env("NO_COLOR").is_none(),
            seed: env("TREESPEC_SEED").and_then(|v| v.parse().ok()),
            ..RunConfig::default()
        };

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--open" => config.open = true,
                "--no-color" => config.color = false,
                "--list" => config.list = true,
                "--seed" => {
                    if let Some(seed) = args.next().and_then(|v| v.parse().ok()) {
                        config.seed = Some(seed);
                    }
                }
                _ => {} // ignore unknown flags and filters
            }
        }
        config
    }
}

// ============================================================================
// Runner
// ============================================================================

pub struct Runner {
    config: RunConfig,
    console: Rc<Console>,
    sandbox: Rc<dyn Sandbox>,
    glyphs: FailureGlyphs,
}

impl Runner {
    /// A runner printing to stdout with a detached sandbox.
    pub fn new(config: RunConfig) -> Self {
        let glyphs = match config.seed {
            Some(seed) => FailureGlyphs::with_offset(seed as usize),
            None => FailureGlyphs::random(),
        };
        Runner {
            console: Rc::new(Console::new(Rc::new(TerminalSink::stdout(config.color)))),
            sandbox: Rc::new(DetachedSandbox::new()),
            glyphs,
            config,
        }
    }

    pub fn with_sink(mut self, sink: Rc<dyn LogSink>) -> Self {
        self.console = Rc::new(Console::new(sink));
        self
    }

    pub fn with_sandbox(mut self, sandbox: Rc<dyn Sandbox>) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Build the root suite from a registration closure.
    pub fn build(&self, body: impl FnOnce(&mut Context<'_>)) -> Suite {
        let mut root = Suite::new(self.config.root_name.as_str());
        body(&mut Context::new(&mut root));
        root
    }

    /// Initialize, run and report `root`.
    ///
    /// When a solo node exists, only it runs and it is reported expanded.
    /// Hook failures that reach this level become the failing root result.
    pub async fn execute(&self, root: &mut Suite) -> TestResult {
        root.init();
        let env = Env::new(Rc::clone(&self.console), Rc::clone(&self.sandbox));
        let reporter = Reporter::new(&self.console, &self.glyphs);

        if let Some((hooks, node)) = root.solo_mut() {
            let result = settle(node.run(hooks, &env).await);
            reporter.node(node, true);
            return result;
        }

        let result = settle(root.run(&env).await);
        reporter.suite(root, self.config.open);
        result
    }

    /// Build, run and report on a current-thread runtime.
    pub fn run(&self, body: impl FnOnce(&mut Context<'_>)) -> Result<TestResult> {
        let mut root = self.build(body);
        if self.config.list {
            self.list(&root);
            return Ok(TestResult::pass(root.name()));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        Ok(runtime.block_on(self.execute(&mut root)))
    }

    /// Print the display names of the nodes a run would execute.
    pub fn list(&self, root: &Suite) {
        match root.child_solo() {
            Some(node) => self.list_node(node, 0),
            None => self.list_children(root, 0),
        }
    }

    fn list_node(&self, node: &Node, depth: usize) {
        let indent = "  ".repeat(depth);
        self.console
            .log(LogLine::plain(format!("{indent}{}", node.display_name())));
        if let Node::Suite(suite) = node {
            self.list_children(suite, depth + 1);
        }
    }

    fn list_children(&self, suite: &Suite, depth: usize) {
        for child in suite.children_to_run() {
            self.list_node(child, depth);
        }
    }
}

fn settle(outcome: Result<TestResult>) -> TestResult {
    outcome.unwrap_or_else(|err| TestResult::fail(err.to_string()))
}

/// Build and run a test tree with configuration from the command line.
///
/// This is the main entry point for treespec. Call it from `fn main()` in a
/// test target with `harness = false`. The returned root result says whether
/// everything passed; turning it into an exit code is up to the caller.
///
/// # Example
///
/// ```rust,no_run
/// fn main() {
///     let result = treespec::run(|ctx| {
///         ctx.describe("Calculator", |ctx| {
///             ctx.it("adds", |t| async move { t.assert(2 + 3 == 5, "adds") });
///         });
///     });
///     if result.failed() {
///         std::process::exit(1);
///     }
/// }
/// ```
pub fn run(body: impl FnOnce(&mut Context<'_>)) -> TestResult {
    let runner = Runner::new(RunConfig::from_args());
    match runner.run(body) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("treespec: {err}");
            TestResult::fail(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_defaults() {
        let config = RunConfig::parse(args(&[]), |_| None);
        assert_eq!(
            config,
            RunConfig {
                color: true,
                ..RunConfig::default()
            }
        );
    }

    #[test]
    fn test_parse_flags_and_ignores_unknown() {
        let config = RunConfig::parse(
            args(&["--open", "filter", "--nocapture", "--seed", "3", "--list", "--no-color"]),
            |_| None,
        );
        assert!(config.open);
        assert!(config.list);
        assert!(!config.color);
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn test_parse_environment() {
        let config = RunConfig::parse(args(&[]), |key| match key {
            "NO_COLOR" => Some(String::new()),
            "TREESPEC_OPEN" => Some("true".into()),
            "TREESPEC_SEED" => Some("7".into()),
            _ => None,
        });
        assert!(!config.color);
        assert!(config.open);
        assert_eq!(config.seed, Some(7));
    }
}
