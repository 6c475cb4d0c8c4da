//! The suite/test tree: selection, hook inheritance and execution.

use crate::console::{Console, LogEvent, MemorySink, Style};
use crate::error::{Error, HookKind, Result};
use crate::result::{all_passed, TestResult};
use crate::sandbox::{Fixture, Sandbox};
use crate::scope::{IntoOutcome, TestContext};
use crate::selection::{display_name, Selection};
use crate::Guard;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use std::time::{Duration, Instant};

pub type SuiteHook = Rc<dyn Fn() -> anyhow::Result<()>>;
pub type EachHook = Rc<dyn Fn(&TestContext) -> anyhow::Result<()>>;
pub(crate) type TestFn = Box<dyn Fn(TestContext) -> LocalBoxFuture<'static, anyhow::Result<()>>>;

pub(crate) fn boxed_body<F, Fut, O>(body: F) -> TestFn
where
    F: Fn(TestContext) -> Fut + 'static,
    Fut: Future<Output = O> + 'static,
    O: IntoOutcome,
{
    Box::new(move |ctx| body(ctx).map(IntoOutcome::into_outcome).boxed_local())
}

/// Shared services a run needs: the console and the sandbox.
#[derive(Clone)]
pub struct Env {
    console: Rc<Console>,
    sandbox: Rc<dyn Sandbox>,
}

impl Env {
    pub fn new(console: Rc<Console>, sandbox: Rc<dyn Sandbox>) -> Self {
        Env { console, sandbox }
    }
}

// ============================================================================
// Hooks
// ============================================================================

/// The four hook lists of a suite, ancestors' hooks first once initialized.
#[derive(Clone, Default)]
pub struct Hooks {
    owner: String,
    pub(crate) before: Vec<SuiteHook>,
    pub(crate) after: Vec<SuiteHook>,
    pub(crate) before_each: Vec<EachHook>,
    pub(crate) after_each: Vec<EachHook>,
}

impl Hooks {
    fn owned_by(owner: &str) -> Self {
        Hooks {
            owner: owner.to_string(),
            ..Hooks::default()
        }
    }

    pub fn before_len(&self) -> usize {
        self.before.len()
    }

    pub fn after_len(&self) -> usize {
        self.after.len()
    }

    pub fn before_each_len(&self) -> usize {
        self.before_each.len()
    }

    pub fn after_each_len(&self) -> usize {
        self.after_each.len()
    }

    /// Put the parent's lists in front of this suite's own.
    fn inherit(&mut self, parent: &Hooks) {
        fn prepend<T: Clone>(own: &mut Vec<T>, inherited: &[T]) {
            own.splice(0..0, inherited.iter().cloned());
        }
        prepend(&mut self.before, &parent.before);
        prepend(&mut self.after, &parent.after);
        prepend(&mut self.before_each, &parent.before_each);
        prepend(&mut self.after_each, &parent.after_each);
    }

    fn run_suite_hooks(&self, kind: HookKind) -> Result<()> {
        let hooks = match kind {
            HookKind::Before => &self.before,
            _ => &self.after,
        };
        for hook in hooks {
            self.call(kind, || hook())?;
        }
        Ok(())
    }

    fn run_each_hooks(&self, kind: HookKind, ctx: &TestContext) -> Result<()> {
        let hooks = match kind {
            HookKind::BeforeEach => &self.before_each,
            _ => &self.after_each,
        };
        for hook in hooks {
            self.call(kind, || hook(ctx))?;
        }
        Ok(())
    }

    fn call(&self, kind: HookKind, hook: impl FnOnce() -> anyhow::Result<()>) -> Result<()> {
        let message = match catch_unwind(AssertUnwindSafe(hook)) {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(err)) => format!("{err:#}"),
            Err(payload) => panic_message(&*payload),
        };
        Err(Error::Hook {
            kind,
            suite: self.owner.clone(),
            message,
        })
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// Node state shared by tests and suites
// ============================================================================

struct Status {
    passed: bool,
    time: Duration,
    results: Vec<TestResult>,
    initialized: bool,
    /// Set once the node has been entered in the current run.
    ran: bool,
}

impl Default for Status {
    fn default() -> Self {
        Status {
            passed: true,
            time: Duration::ZERO,
            results: Vec::new(),
            initialized: false,
            ran: false,
        }
    }
}

impl Status {
    /// Forget the outcome of the previous run.
    fn reset(&mut self) {
        self.passed = true;
        self.time = Duration::ZERO;
        self.results.clear();
        self.ran = false;
    }
}

/// A test or a suite.
pub enum Node {
    Test(Test),
    Suite(Suite),
}

impl From<Test> for Node {
    fn from(test: Test) -> Self {
        Node::Test(test)
    }
}

impl From<Suite> for Node {
    fn from(suite: Suite) -> Self {
        Node::Suite(suite)
    }
}

impl Node {
    fn parts(&self) -> (&str, Selection, &Status) {
        match self {
            Node::Test(t) => (&t.name, t.selection, &t.status),
            Node::Suite(s) => (&s.name, s.selection, &s.status),
        }
    }

    pub fn name(&self) -> &str {
        self.parts().0
    }

    pub fn display_name(&self) -> &str {
        display_name(self.name())
    }

    pub fn selection(&self) -> Selection {
        self.parts().1
    }

    /// Effective focus; for suites this includes focused descendants.
    pub fn only(&self) -> bool {
        match self {
            Node::Test(t) => t.only(),
            Node::Suite(s) => s.only(),
        }
    }

    pub fn passed(&self) -> bool {
        self.parts().2.passed
    }

    pub fn time(&self) -> Duration {
        self.parts().2.time
    }

    pub fn results(&self) -> &[TestResult] {
        &self.parts().2.results
    }

    pub fn is_initialized(&self) -> bool {
        self.parts().2.initialized
    }

    /// Whether the node was entered during the last run. Children of a
    /// suite aborted by a hook failure were not.
    pub fn ran(&self) -> bool {
        self.parts().2.ran
    }

    fn reset(&mut self) {
        match self {
            Node::Test(t) => t.reset(),
            Node::Suite(s) => s.reset(),
        }
    }

    pub fn as_suite(&self) -> Option<&Suite> {
        match self {
            Node::Suite(s) => Some(s),
            Node::Test(_) => None,
        }
    }

    pub fn as_test(&self) -> Option<&Test> {
        match self {
            Node::Test(t) => Some(t),
            Node::Suite(_) => None,
        }
    }

    pub fn init(&mut self) {
        match self {
            Node::Test(t) => t.init(),
            Node::Suite(s) => s.init(),
        }
    }

    /// Run the node. `parent` supplies the `*_each` hooks a test runs with;
    /// suites carry their own.
    pub fn run<'a>(
        &'a mut self,
        parent: &'a Hooks,
        env: &'a Env,
    ) -> LocalBoxFuture<'a, Result<TestResult>> {
        match self {
            Node::Test(t) => t.run(parent, env).boxed_local(),
            Node::Suite(s) => s.run(env),
        }
    }
}

// ============================================================================
// Test
// ============================================================================

/// A leaf: one work function, run in isolation.
pub struct Test {
    name: String,
    selection: Selection,
    status: Status,
    log: Vec<LogEvent>,
    body: TestFn,
}

impl Test {
    pub fn new<F, Fut, O>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(TestContext) -> Fut + 'static,
        Fut: Future<Output = O> + 'static,
        O: IntoOutcome,
    {
        Self::from_boxed(name.into(), Selection::Normal, boxed_body(body))
    }

    pub(crate) fn from_boxed(name: String, selection: Selection, body: TestFn) -> Self {
        Test {
            selection: selection.resolve(&name),
            name,
            status: Status::default(),
            log: Vec::new(),
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        display_name(&self.name)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn focused(&self) -> bool {
        self.selection.is_focused()
    }

    pub fn solo(&self) -> bool {
        self.selection.is_solo()
    }

    pub fn skip(&self) -> bool {
        self.selection.is_skip()
    }

    pub fn only(&self) -> bool {
        self.focused()
    }

    pub fn passed(&self) -> bool {
        self.status.passed
    }

    pub fn failed(&self) -> bool {
        !self.status.passed
    }

    pub fn time(&self) -> Duration {
        self.status.time
    }

    pub fn results(&self) -> &[TestResult] {
        &self.status.results
    }

    pub fn passing_results(&self) -> impl Iterator<Item = &TestResult> {
        self.status.results.iter().filter(|r| r.passed())
    }

    pub fn failing_results(&self) -> impl Iterator<Item = &TestResult> {
        self.status.results.iter().filter(|r| r.failed())
    }

    /// Everything the test wrote to the console during its last run.
    pub fn log(&self) -> &[LogEvent] {
        &self.log
    }

    pub fn is_initialized(&self) -> bool {
        self.status.initialized
    }

    pub fn init(&mut self) {
        self.status.initialized = true;
    }

    pub fn ran(&self) -> bool {
        self.status.ran
    }

    fn reset(&mut self) {
        self.status.reset();
        self.log.clear();
    }

    /// Run the body once with `hooks`' `before_each`/`after_each` around it.
    ///
    /// Failures of the body are recorded as results. Hook failures are
    /// returned as errors after cleanup.
    pub async fn run(&mut self, hooks: &Hooks, env: &Env) -> Result<TestResult> {
        self.reset();
        self.status.ran = true;
        let start = Instant::now();

        let buffer = Rc::new(MemorySink::new());
        let fixture = Fixture::acquire(Rc::clone(&env.sandbox));
        let ctx = TestContext::open(&self.name, Rc::clone(&env.console), fixture);

        let failure = {
            let _redirect = env.console.redirect(buffer.clone());
            let _release = Guard::new(|| ctx.release());

            let failure = hooks.run_each_hooks(HookKind::BeforeEach, &ctx).err();
            if failure.is_none() {
                self.call_body(&ctx).await;
            }
            let after = hooks.run_each_hooks(HookKind::AfterEach, &ctx);
            let failure = failure.or(after.err());
            if let Some(err) = &failure {
                ctx.log_styled(format!("ERROR: {err}"), Style::Fail);
            }
            failure
        };

        let mut results = ctx.finish();
        if let Some(err) = &failure {
            results.push(TestResult::fail(err.to_string()));
        }
        self.status.passed = all_passed(&results);
        self.status.results = results;
        self.log = buffer.take();
        self.status.time = start.elapsed();

        match failure {
            Some(err) => Err(err),
            None => Ok(TestResult::new(self.status.passed, self.name.clone())),
        }
    }

    async fn call_body(&self, ctx: &TestContext) {
        let body = &self.body;
        let outcome = AssertUnwindSafe(async { body(ctx.clone()).await })
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => ctx.fail(format!("{err:#}"), format!("{err:?}")),
            Err(payload) => {
                let message = panic_message(&*payload);
                ctx.fail(message.clone(), message);
            }
        }
    }
}

// ============================================================================
// Suite
// ============================================================================

/// A container of tests and suites with its own hook lists.
pub struct Suite {
    name: String,
    selection: Selection,
    status: Status,
    hooks: Hooks,
    entries: Vec<Node>,
    aborted: Option<TestResult>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_selection(name, Selection::Normal)
    }

    pub fn with_selection(name: impl Into<String>, selection: Selection) -> Self {
        let name = name.into();
        Suite {
            selection: selection.resolve(&name),
            hooks: Hooks::owned_by(&name),
            name,
            status: Status::default(),
            entries: Vec::new(),
            aborted: None,
        }
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.entries.push(node.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        display_name(&self.name)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn focused(&self) -> bool {
        self.selection.is_focused()
    }

    pub fn solo(&self) -> bool {
        self.selection.is_solo()
    }

    pub fn skip(&self) -> bool {
        self.selection.is_skip()
    }

    pub fn passed(&self) -> bool {
        self.status.passed
    }

    pub fn failed(&self) -> bool {
        !self.status.passed
    }

    pub fn time(&self) -> Duration {
        self.status.time
    }

    pub fn results(&self) -> &[TestResult] {
        &self.status.results
    }

    pub fn passing_results(&self) -> impl Iterator<Item = &TestResult> {
        self.status.results.iter().filter(|r| r.passed())
    }

    pub fn failing_results(&self) -> impl Iterator<Item = &TestResult> {
        self.status.results.iter().filter(|r| r.failed())
    }

    pub fn is_initialized(&self) -> bool {
        self.status.initialized
    }

    pub fn ran(&self) -> bool {
        self.status.ran
    }

    /// The hook failure that stopped the last run of this suite, if any.
    pub fn aborted(&self) -> Option<&TestResult> {
        self.aborted.as_ref()
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    fn reset(&mut self) {
        self.status.reset();
        self.aborted = None;
        for node in &mut self.entries {
            node.reset();
        }
    }

    pub(crate) fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    fn visible(&self) -> impl Iterator<Item = (usize, &Node)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.selection().is_skip())
    }

    /// Children in registration order, skipped ones left out.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.visible().map(|(_, node)| node)
    }

    /// Own focus, or any focused descendant.
    pub fn only(&self) -> bool {
        self.focused() || self.children().any(Node::only)
    }

    /// Children carrying their own focus flag. Focus narrows each level
    /// independently: a focused grandchild does not narrow this suite.
    pub fn children_only(&self) -> impl Iterator<Item = &Node> {
        self.children().filter(|node| node.selection().is_focused())
    }

    fn indices_to_run(&self) -> Vec<usize> {
        let focused: Vec<usize> = self
            .visible()
            .filter(|(_, node)| node.selection().is_focused())
            .map(|(i, _)| i)
            .collect();
        if self.only() && !focused.is_empty() {
            focused
        } else {
            self.visible().map(|(i, _)| i).collect()
        }
    }

    /// The children a run executes (and a report shows).
    pub fn children_to_run(&self) -> Vec<&Node> {
        self.indices_to_run()
            .into_iter()
            .map(|i| &self.entries[i])
            .collect()
    }

    /// First solo child, else the first solo found depth-first in child
    /// suites.
    pub fn child_solo(&self) -> Option<&Node> {
        let path = self.solo_path()?;
        let (last, parents) = path.split_last()?;
        let mut suite = self;
        for &i in parents {
            suite = suite.entries.get(i)?.as_suite()?;
        }
        suite.entries.get(*last)
    }

    fn solo_path(&self) -> Option<Vec<usize>> {
        if let Some((i, _)) = self.visible().find(|(_, node)| node.selection().is_solo()) {
            return Some(vec![i]);
        }
        self.visible().find_map(|(i, node)| {
            let mut path = node.as_suite()?.solo_path()?;
            path.insert(0, i);
            Some(path)
        })
    }

    /// The solo node together with the hooks of the suite that holds it.
    pub(crate) fn solo_mut(&mut self) -> Option<(&Hooks, &mut Node)> {
        let path = self.solo_path()?;
        let (last, parents) = path.split_last()?;
        let mut suite = self;
        for &i in parents {
            suite = match suite.entries.get_mut(i)? {
                Node::Suite(s) => s,
                Node::Test(_) => return None,
            };
        }
        let Suite { hooks, entries, .. } = suite;
        Some((&*hooks, entries.get_mut(*last)?))
    }

    /// Push this suite's hooks down to every child suite, recursively.
    /// Runs once; later calls do nothing.
    pub fn init(&mut self) {
        if self.status.initialized {
            return;
        }
        let Suite {
            hooks,
            entries,
            status,
            ..
        } = self;
        for node in entries.iter_mut().filter(|n| !n.selection().is_skip()) {
            if let Node::Suite(child) = node {
                child.hooks.inherit(hooks);
            }
            node.init();
        }
        status.initialized = true;
    }

    /// Run `before` hooks, then the selected children in order, then `after`
    /// hooks.
    ///
    /// A child suite aborted by a hook failure counts as one failing result.
    /// A failing hook of this suite aborts it and is returned as an error.
    pub fn run<'a>(&'a mut self, env: &'a Env) -> LocalBoxFuture<'a, Result<TestResult>> {
        async move {
            if !self.status.initialized {
                self.init();
            }
            self.reset();
            self.status.ran = true;
            let start = Instant::now();
            let walked = self.walk(env).await;
            self.status.time = start.elapsed();

            match walked {
                Ok(()) => {
                    self.status.passed = all_passed(&self.status.results);
                    Ok(TestResult::new(self.status.passed, self.name.clone()))
                }
                Err(err) => {
                    let failure = TestResult::fail(err.to_string());
                    self.status.results.push(failure.clone());
                    self.aborted = Some(failure);
                    self.status.passed = false;
                    Err(err)
                }
            }
        }
        .boxed_local()
    }

    async fn walk(&mut self, env: &Env) -> Result<()> {
        self.hooks.run_suite_hooks(HookKind::Before)?;
        for index in self.indices_to_run() {
            let Suite {
                hooks,
                entries,
                status,
                ..
            } = &mut *self;
            let child = &mut entries[index];
            let is_suite = matches!(child, Node::Suite(_));
            let outcome = child.run(hooks, env).await;
            let result = match outcome {
                Ok(result) => result,
                Err(err) if is_suite => TestResult::fail(err.to_string()),
                Err(err) => return Err(err),
            };
            status.results.push(result);
        }
        self.hooks.run_suite_hooks(HookKind::After)
    }
}
