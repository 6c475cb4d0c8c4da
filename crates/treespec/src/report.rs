//! Nested, collapsible rendering of a finished run.

use crate::console::{Console, LogEvent, LogLine, Style};
use crate::tree::{Node, Suite, Test};
use rand::Rng;
use std::cell::Cell;
use std::time::Duration;

const GLYPHS: [&str; 4] = ["🦆", "🙉", "🐱", "🦄"];

/// Ring of markers for failing suites, so consecutive failures look
/// different at a glance.
#[derive(Debug)]
pub struct FailureGlyphs {
    cursor: Cell<usize>,
}

impl FailureGlyphs {
    pub fn with_offset(offset: usize) -> Self {
        FailureGlyphs {
            cursor: Cell::new(offset % GLYPHS.len()),
        }
    }

    pub fn random() -> Self {
        Self::with_offset(rand::thread_rng().gen_range(0..GLYPHS.len()))
    }

    /// Advance the ring and return the glyph it lands on.
    pub fn next(&self) -> &'static str {
        let next = (self.cursor.get() + 1) % GLYPHS.len();
        self.cursor.set(next);
        GLYPHS[next]
    }
}

pub struct Reporter<'a> {
    console: &'a Console,
    glyphs: &'a FailureGlyphs,
}

impl<'a> Reporter<'a> {
    pub fn new(console: &'a Console, glyphs: &'a FailureGlyphs) -> Self {
        Reporter { console, glyphs }
    }

    /// `open` renders the node and everything below it expanded.
    pub fn node(&self, node: &Node, open: bool) {
        match node {
            Node::Test(test) => self.test(test, open),
            Node::Suite(suite) => self.suite(suite, open),
        }
    }

    pub fn suite(&self, suite: &Suite, open: bool) {
        let style = Style::for_outcome(suite.passed());
        let title = format!(
            "{} ({}/{})",
            suite.display_name(),
            suite.passing_results().count(),
            suite.results().len()
        );

        let grouped = if suite.failed() {
            let line = LogLine::new(format!("{} {title}", self.glyphs.next()), style);
            self.console.group(line, false);
            true
        } else if suite.results().is_empty() {
            self.console.log(LogLine::new(format!("✅ {title}"), style));
            false
        } else {
            let collapsed = !(open || suite.only());
            self.console
                .group(LogLine::new(format!("✅ {title}"), style), collapsed);
            true
        };

        if let Some(failure) = suite.aborted() {
            self.console
                .log(LogLine::new(format!("ERROR: {}", failure.message()), Style::Fail));
        }
        // Children left behind by an aborted suite have nothing to show.
        for child in suite.children_to_run().into_iter().filter(|c| c.ran()) {
            self.node(child, open);
        }
        if grouped {
            self.console.group_end();
        }
    }

    pub fn test(&self, test: &Test, open: bool) {
        let title = if test.time() > Duration::from_millis(1) {
            format!("{} ({}ms)", test.display_name(), test.time().as_millis())
        } else {
            test.display_name().to_string()
        };
        let collapsed = !open && test.passed() && !test.only();
        self.console
            .group(LogLine::new(title, Style::for_outcome(test.passed())), collapsed);

        for event in test.log() {
            match event {
                LogEvent::Line(line) => self.console.log(line.clone()),
                LogEvent::Group { line, collapsed } => self.console.group(line.clone(), *collapsed),
                LogEvent::GroupEnd => self.console.group_end(),
            }
        }
        self.console.group_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_ring_wraps() {
        let glyphs = FailureGlyphs::with_offset(2);
        assert_eq!(glyphs.next(), "🦄");
        assert_eq!(glyphs.next(), "🦆");
        assert_eq!(glyphs.next(), "🙉");
    }

    #[test]
    fn test_consecutive_glyphs_differ() {
        let glyphs = FailureGlyphs::random();
        let first = glyphs.next();
        assert_ne!(first, glyphs.next());
    }
}
