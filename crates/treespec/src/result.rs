//! Pass/fail records produced by assertions and node runs.

/// An immutable pass/fail outcome with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    passed: bool,
    message: String,
}

impl TestResult {
    pub fn new(passed: bool, message: impl Into<String>) -> Self {
        TestResult {
            passed,
            message: message.into(),
        }
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(true, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(false, message)
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn failed(&self) -> bool {
        !self.passed
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The message, or `passed`/`failed` when it is empty.
    pub fn label(&self) -> &str {
        match (self.message.is_empty(), self.passed) {
            (false, _) => &self.message,
            (true, true) => "passed",
            (true, false) => "failed",
        }
    }
}

/// `true` when no result in the slice failed. An empty slice passes.
pub fn all_passed(results: &[TestResult]) -> bool {
    results.iter().all(TestResult::passed)
}
