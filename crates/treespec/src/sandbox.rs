//! Disposable per-test elements.
//!
//! Every test gets three fresh, hidden elements (a block container, an
//! inline container and an input). They are removed when the test ends,
//! whatever way it ends.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// `div`
    Block,
    /// `span`
    Inline,
    /// `input`
    Input,
}

/// A scratch element a test can freely mutate.
#[derive(Debug)]
pub struct Element {
    role: Role,
    hidden: bool,
    removed: Cell<bool>,
    text: RefCell<String>,
    attributes: RefCell<BTreeMap<String, String>>,
}

impl Element {
    pub fn new(role: Role) -> Self {
        Element {
            role,
            hidden: true,
            removed: Cell::new(false),
            text: RefCell::new(String::new()),
            attributes: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_removed(&self) -> bool {
        self.removed.get()
    }

    pub fn remove(&self) {
        self.removed.set(true);
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.borrow_mut() = text.into();
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.borrow_mut().insert(name.into(), value.into());
    }
}

/// Host environment that hands out and reclaims elements.
pub trait Sandbox {
    fn create(&self, role: Role) -> Rc<Element>;
    fn release(&self, element: &Element);
}

/// In-memory sandbox; elements are never attached to anything visible.
#[derive(Debug, Default)]
pub struct DetachedSandbox {
    live: Cell<usize>,
    created: Cell<usize>,
}

impl DetachedSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements handed out and not yet released.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    pub fn created(&self) -> usize {
        self.created.get()
    }
}

impl Sandbox for DetachedSandbox {
    fn create(&self, role: Role) -> Rc<Element> {
        self.live.set(self.live.get() + 1);
        self.created.set(self.created.get() + 1);
        Rc::new(Element::new(role))
    }

    fn release(&self, element: &Element) {
        if !element.is_removed() {
            element.remove();
            self.live.set(self.live.get().saturating_sub(1));
        }
    }
}

/// The three elements of one test. Released on drop.
pub struct Fixture {
    sandbox: Rc<dyn Sandbox>,
    div: Rc<Element>,
    span: Rc<Element>,
    input: Rc<Element>,
}

impl Fixture {
    pub fn acquire(sandbox: Rc<dyn Sandbox>) -> Self {
        Fixture {
            div: sandbox.create(Role::Block),
            span: sandbox.create(Role::Inline),
            input: sandbox.create(Role::Input),
            sandbox,
        }
    }

    pub fn div(&self) -> Rc<Element> {
        Rc::clone(&self.div)
    }

    pub fn span(&self) -> Rc<Element> {
        Rc::clone(&self.span)
    }

    pub fn input(&self) -> Rc<Element> {
        Rc::clone(&self.input)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        for element in [&self.div, &self.span, &self.input] {
            self.sandbox.release(element);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_releases_on_drop() {
        let sandbox = Rc::new(DetachedSandbox::new());
        let fixture = Fixture::acquire(sandbox.clone());
        let div = fixture.div();
        assert_eq!(sandbox.live(), 3);
        assert_eq!(div.role(), Role::Block);
        assert!(div.is_hidden());

        drop(fixture);
        assert_eq!(sandbox.live(), 0);
        assert!(div.is_removed());
    }

    #[test]
    fn test_elements_are_fresh_per_fixture() {
        let sandbox = Rc::new(DetachedSandbox::new());
        let first = Fixture::acquire(sandbox.clone());
        first.input().set_attribute("value", "typed");
        drop(first);

        let second = Fixture::acquire(sandbox.clone());
        assert_eq!(second.input().attribute("value"), None);
        assert_eq!(sandbox.created(), 6);
    }
}
