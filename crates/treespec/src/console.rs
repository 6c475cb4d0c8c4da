//! Grouped console logging with a swappable sink.
//!
//! Everything the runner prints goes through a [`Console`]. While a test runs
//! its console is redirected into a [`MemorySink`] so the test's output can be
//! replayed inside its report group afterwards.

use colored::Colorize;
use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    Plain,
    Pass,
    Fail,
}

impl Style {
    pub fn for_outcome(passed: bool) -> Self {
        if passed {
            Style::Pass
        } else {
            Style::Fail
        }
    }
}

/// A single line of styled text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub text: String,
    pub style: Style,
}

impl LogLine {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        LogLine {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::Plain)
    }
}

/// What a [`MemorySink`] records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Line(LogLine),
    Group { line: LogLine, collapsed: bool },
    GroupEnd,
}

/// Destination for console output.
pub trait LogSink {
    fn log(&self, line: LogLine);

    /// Open a nested group. A collapsed group hides its contents until the
    /// reader expands it.
    fn group(&self, line: LogLine, collapsed: bool);

    fn group_end(&self);
}

/// The process console: forwards to the current sink, which can be
/// temporarily replaced with [`Console::redirect`].
pub struct Console {
    sink: RefCell<Rc<dyn LogSink>>,
}

impl Console {
    pub fn new(sink: Rc<dyn LogSink>) -> Self {
        Console {
            sink: RefCell::new(sink),
        }
    }

    fn current(&self) -> Rc<dyn LogSink> {
        Rc::clone(&self.sink.borrow())
    }

    pub fn log(&self, line: LogLine) {
        self.current().log(line);
    }

    pub fn group(&self, line: LogLine, collapsed: bool) {
        self.current().group(line, collapsed);
    }

    pub fn group_end(&self) {
        self.current().group_end();
    }

    /// Send all output to `sink` until the returned guard is dropped.
    pub fn redirect(&self, sink: Rc<dyn LogSink>) -> Redirect<'_> {
        let previous = self.sink.replace(sink);
        Redirect {
            console: self,
            previous: Some(previous),
        }
    }
}

/// Restores the previous sink when dropped.
pub struct Redirect<'a> {
    console: &'a Console,
    previous: Option<Rc<dyn LogSink>>,
}

impl Drop for Redirect<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.console.sink.replace(previous);
        }
    }
}

/// Records every event in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<LogEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Plain-text rendering of the recorded events, two spaces per group level.
    /// Collapsed groups are marked with `▸`, expanded ones with `▾`.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        let mut depth = 0usize;
        for event in self.events.borrow().iter() {
            match event {
                LogEvent::Line(line) => {
                    out.push_str(&"  ".repeat(depth));
                    out.push_str(&line.text);
                    out.push('\n');
                }
                LogEvent::Group { line, collapsed } => {
                    out.push_str(&"  ".repeat(depth));
                    out.push_str(if *collapsed { "▸ " } else { "▾ " });
                    out.push_str(&line.text);
                    out.push('\n');
                    depth += 1;
                }
                LogEvent::GroupEnd => depth = depth.saturating_sub(1),
            }
        }
        out
    }
}

impl LogSink for MemorySink {
    fn log(&self, line: LogLine) {
        self.events.borrow_mut().push(LogEvent::Line(line));
    }

    fn group(&self, line: LogLine, collapsed: bool) {
        self.events
            .borrow_mut()
            .push(LogEvent::Group { line, collapsed });
    }

    fn group_end(&self) {
        self.events.borrow_mut().push(LogEvent::GroupEnd);
    }
}

/// Indented, colored output. The contents of collapsed groups are not
/// printed; only their header line is.
pub struct TerminalSink<W: Write = io::Stdout> {
    out: RefCell<W>,
    color: bool,
    depth: Cell<usize>,
    /// Depth from which output is hidden by a collapsed group.
    hidden_from: Cell<Option<usize>>,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, color: bool) -> Self {
        TerminalSink {
            out: RefCell::new(out),
            color,
            depth: Cell::new(0),
            hidden_from: Cell::new(None),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn hidden(&self) -> bool {
        self.hidden_from.get().is_some()
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if !self.color {
            return text.to_string();
        }
        match style {
            Style::Plain => text.to_string(),
            Style::Pass => text.truecolor(0x9e, 0xce, 0x6a).to_string(),
            Style::Fail => text.truecolor(0xf7, 0x76, 0x8e).to_string(),
        }
    }

    fn write(&self, marker: &str, line: &LogLine) {
        let indent = "  ".repeat(self.depth.get());
        let mut out = self.out.borrow_mut();
        let parts: Vec<&str> = if line.text.is_empty() {
            vec![""]
        } else {
            line.text.lines().collect()
        };
        for (i, part) in parts.into_iter().enumerate() {
            let lead = if i == 0 { marker } else { "  " };
            // Console output is best effort.
            let _ = writeln!(out, "{indent}{lead}{}", self.paint(part, line.style));
        }
    }
}

impl<W: Write> LogSink for TerminalSink<W> {
    fn log(&self, line: LogLine) {
        if !self.hidden() {
            self.write("", &line);
        }
    }

    fn group(&self, line: LogLine, collapsed: bool) {
        if !self.hidden() {
            self.write(if collapsed { "▸ " } else { "▾ " }, &line);
            if collapsed {
                self.hidden_from.set(Some(self.depth.get() + 1));
            }
        }
        self.depth.set(self.depth.get() + 1);
    }

    fn group_end(&self) {
        let depth = self.depth.get().saturating_sub(1);
        self.depth.set(depth);
        if matches!(self.hidden_from.get(), Some(from) if depth < from) {
            self.hidden_from.set(None);
        }
    }
}
