//! The per-test handle passed to test bodies and `*_each` hooks.

use crate::console::{Console, LogLine, Style};
use crate::result::TestResult;
use crate::sandbox::{Element, Fixture};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Return types accepted from test bodies and hooks.
///
/// `()` always succeeds; any `Result<(), E>` with `E: Into<anyhow::Error>`
/// fails with its error.
pub trait IntoOutcome: 'static {
    fn into_outcome(self) -> anyhow::Result<()>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E: Into<anyhow::Error> + 'static> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

struct Scope {
    name: String,
    console: Rc<Console>,
    open: Cell<bool>,
    results: RefCell<Vec<TestResult>>,
    fixture: RefCell<Option<Fixture>>,
    div: Rc<Element>,
    span: Rc<Element>,
    input: Rc<Element>,
}

/// Routes assertions and log output to the test that is currently running.
///
/// Cheap to clone. Once the test has finished, [`TestContext::assert`] is a
/// no-op and the sandbox elements are removed.
#[derive(Clone)]
pub struct TestContext {
    scope: Rc<Scope>,
}

impl TestContext {
    pub(crate) fn open(name: &str, console: Rc<Console>, fixture: Fixture) -> Self {
        TestContext {
            scope: Rc::new(Scope {
                name: name.to_string(),
                console,
                open: Cell::new(true),
                results: RefCell::new(Vec::new()),
                div: fixture.div(),
                span: fixture.span(),
                input: fixture.input(),
                fixture: RefCell::new(Some(fixture)),
            }),
        }
    }

    /// Raw name of the running test.
    pub fn name(&self) -> &str {
        &self.scope.name
    }

    pub fn is_running(&self) -> bool {
        self.scope.open.get()
    }

    /// Record a pass/fail result against this test and echo it to the log.
    pub fn assert(&self, passed: bool, message: impl Into<String>) {
        if !self.is_running() {
            return;
        }
        let result = TestResult::new(passed, message);
        self.scope
            .console
            .log(LogLine::new(result.label(), Style::for_outcome(passed)));
        self.scope.results.borrow_mut().push(result);
    }

    pub fn log(&self, text: impl Into<String>) {
        self.scope.console.log(LogLine::plain(text));
    }

    pub fn log_styled(&self, text: impl Into<String>, style: Style) {
        self.scope.console.log(LogLine::new(text, style));
    }

    /// Block container scratch element.
    pub fn div(&self) -> Rc<Element> {
        Rc::clone(&self.scope.div)
    }

    /// Inline container scratch element.
    pub fn span(&self) -> Rc<Element> {
        Rc::clone(&self.scope.span)
    }

    /// Input scratch element.
    pub fn input(&self) -> Rc<Element> {
        Rc::clone(&self.scope.input)
    }

    /// Record a caught body failure.
    pub(crate) fn fail(&self, message: String, detail: String) {
        self.log_styled(format!("ERROR: {detail}"), Style::Fail);
        self.scope.results.borrow_mut().push(TestResult::fail(message));
    }

    pub(crate) fn release(&self) {
        self.scope.fixture.borrow_mut().take();
    }

    /// Close the scope and hand back everything it recorded.
    pub(crate) fn finish(&self) -> Vec<TestResult> {
        self.scope.open.set(false);
        self.release();
        std::mem::take(&mut *self.scope.results.borrow_mut())
    }
}
