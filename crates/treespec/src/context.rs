//! Closure-based registration API: Context and ItBuilder.

use crate::scope::{IntoOutcome, TestContext};
use crate::selection::Selection;
use crate::tree::{boxed_body, Suite, Test, TestFn};
use std::future::Future;
use std::rc::Rc;

// ============================================================================
// Context: the user-facing handle
// ============================================================================

/// The suite currently being defined.
///
/// Everything registered through a `Context` is attached to its suite, in
/// registration order. `describe` hands a fresh `Context` for the nested
/// suite to its body.
///
/// # Example
/// ```rust,no_run
/// fn main() {
///     treespec::run(|ctx| {
///         ctx.describe("Calculator", |ctx| {
///             ctx.before_each(|t| t.div().set_text("0"));
///             ctx.it("adds", |t| async move { t.assert(2 + 3 == 5, "2 + 3 = 5") });
///         });
///     });
/// }
/// ```
pub struct Context<'s> {
    suite: &'s mut Suite,
}

impl<'s> Context<'s> {
    pub fn new(suite: &'s mut Suite) -> Self {
        Context { suite }
    }

    // ---- Describe --------------------------------------------------------

    /// Define a nested suite. `body` runs immediately.
    ///
    /// Leading spaces in `name` select the suite: one space focuses it, two
    /// make it solo, three or more skip it.
    pub fn describe(&mut self, name: &str, body: impl FnOnce(&mut Context<'_>)) {
        self.describe_with(Selection::Normal, name, body);
    }

    pub fn fdescribe(&mut self, name: &str, body: impl FnOnce(&mut Context<'_>)) {
        self.describe_with(Selection::Focused, name, body);
    }

    pub fn sdescribe(&mut self, name: &str, body: impl FnOnce(&mut Context<'_>)) {
        self.describe_with(Selection::Solo, name, body);
    }

    pub fn xdescribe(&mut self, name: &str, body: impl FnOnce(&mut Context<'_>)) {
        self.describe_with(Selection::Skip, name, body);
    }

    pub fn context(&mut self, name: &str, body: impl FnOnce(&mut Context<'_>)) {
        self.describe(name, body);
    }

    pub fn describe_with(
        &mut self,
        selection: Selection,
        name: &str,
        body: impl FnOnce(&mut Context<'_>),
    ) {
        let mut suite = Suite::with_selection(name, selection);
        body(&mut Context::new(&mut suite));
        self.suite.push(suite);
    }

    // ---- It --------------------------------------------------------------

    /// Define a test. The body is stored and only called when the test runs.
    ///
    /// ```rust,no_run
    /// # fn main() { treespec::run(|ctx| {
    /// ctx.it("works", |t| async move { t.assert(true, "works") });
    ///
    /// ctx.it("reads a file", |_| async move {
    ///     std::fs::read_to_string("Cargo.toml")?;
    ///     Ok::<(), std::io::Error>(())
    /// })
    /// .focus();
    /// # }); }
    /// ```
    pub fn it<F, Fut, O>(&mut self, name: &str, body: F) -> ItBuilder<'_>
    where
        F: Fn(TestContext) -> Fut + 'static,
        Fut: Future<Output = O> + 'static,
        O: IntoOutcome,
    {
        ItBuilder::new(self.suite, name, boxed_body(body))
    }

    pub fn fit<F, Fut, O>(&mut self, name: &str, body: F) -> ItBuilder<'_>
    where
        F: Fn(TestContext) -> Fut + 'static,
        Fut: Future<Output = O> + 'static,
        O: IntoOutcome,
    {
        self.it(name, body).focus()
    }

    pub fn sit<F, Fut, O>(&mut self, name: &str, body: F) -> ItBuilder<'_>
    where
        F: Fn(TestContext) -> Fut + 'static,
        Fut: Future<Output = O> + 'static,
        O: IntoOutcome,
    {
        self.it(name, body).solo()
    }

    pub fn xit<F, Fut, O>(&mut self, name: &str, body: F) -> ItBuilder<'_>
    where
        F: Fn(TestContext) -> Fut + 'static,
        Fut: Future<Output = O> + 'static,
        O: IntoOutcome,
    {
        self.it(name, body).skip()
    }

    // ---- Hooks -----------------------------------------------------------

    /// Runs once before this suite's children (and before each nested suite's).
    pub fn before<O: IntoOutcome>(&mut self, hook: impl Fn() -> O + 'static) {
        self.suite
            .hooks_mut()
            .before
            .push(Rc::new(move || hook().into_outcome()));
    }

    pub fn after<O: IntoOutcome>(&mut self, hook: impl Fn() -> O + 'static) {
        self.suite
            .hooks_mut()
            .after
            .push(Rc::new(move || hook().into_outcome()));
    }

    /// Runs before every test below this suite, with the test's context.
    pub fn before_each<O: IntoOutcome>(&mut self, hook: impl Fn(&TestContext) -> O + 'static) {
        self.suite
            .hooks_mut()
            .before_each
            .push(Rc::new(move |t: &TestContext| hook(t).into_outcome()));
    }

    pub fn after_each<O: IntoOutcome>(&mut self, hook: impl Fn(&TestContext) -> O + 'static) {
        self.suite
            .hooks_mut()
            .after_each
            .push(Rc::new(move |t: &TestContext| hook(t).into_outcome()));
    }
}

// ============================================================================
// ItBuilder: selection decorators, registers the test on Drop
// ============================================================================

/// Builder returned by [`Context::it`]. The test is registered when the
/// builder is dropped, normally at the end of the statement.
pub struct ItBuilder<'c> {
    suite: &'c mut Suite,
    name: String,
    selection: Selection,
    body: Option<TestFn>,
}

impl<'c> ItBuilder<'c> {
    fn new(suite: &'c mut Suite, name: &str, body: TestFn) -> Self {
        ItBuilder {
            suite,
            name: name.to_string(),
            selection: Selection::Normal,
            body: Some(body),
        }
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Narrow the suite's run to focused tests.
    pub fn focus(self) -> Self {
        self.selection(Selection::Focused)
    }

    /// Run only this test.
    pub fn solo(self) -> Self {
        self.selection(Selection::Solo)
    }

    pub fn skip(self) -> Self {
        self.selection(Selection::Skip)
    }
}

impl Drop for ItBuilder<'_> {
    fn drop(&mut self) {
        if let Some(body) = self.body.take() {
            let name = std::mem::take(&mut self.name);
            self.suite
                .push(Test::from_boxed(name, self.selection, body));
        }
    }
}
