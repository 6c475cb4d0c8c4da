//! Call interception for swappable functions.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Callable<A, R> = Rc<dyn Fn(A) -> R>;

/// A function slot that can be spied on.
///
/// Code under test calls through [`Spyable::call`]; a test installs a spy with
/// [`Spyable::spy`] to observe every call and its return value.
///
/// ```
/// use treespec::Spyable;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let double = Spyable::new(|x: i32| x * 2);
/// let seen = Rc::new(Cell::new(0));
/// {
///     let seen = seen.clone();
///     let _spy = double.spy(move |value: &i32, _args: &i32| seen.set(*value));
///     assert_eq!(double.call(21), 42);
/// }
/// assert_eq!(seen.get(), 42);
/// ```
pub struct Spyable<A, R> {
    current: RefCell<Callable<A, R>>,
}

impl<A: 'static, R: 'static> Spyable<A, R> {
    pub fn new(f: impl Fn(A) -> R + 'static) -> Self {
        Spyable {
            current: RefCell::new(Rc::new(f)),
        }
    }

    pub fn call(&self, args: A) -> R {
        let f = Rc::clone(&self.current.borrow());
        f(args)
    }

    /// Wrap the current function so `callback` sees the return value and the
    /// arguments of every call. The return value is passed through unchanged.
    ///
    /// The original is restored when the guard is dropped or
    /// [`SpyGuard::restore`] is called. Spies stack and are meant to be
    /// released last-in first-out. A guard released while a later spy is
    /// still installed stops observing but leaves the slot alone; its wrapper
    /// stays in the chain as a plain passthrough.
    pub fn spy(&self, callback: impl Fn(&R, &A) + 'static) -> SpyGuard<'_, A, R>
    where
        A: Clone,
    {
        let original = Rc::clone(&self.current.borrow());
        let inner = Rc::clone(&original);
        let active = Rc::new(Cell::new(true));
        let observing = Rc::clone(&active);
        let installed: Callable<A, R> = Rc::new(move |args: A| {
            let value = inner(args.clone());
            if observing.get() {
                callback(&value, &args);
            }
            value
        });
        self.current.replace(Rc::clone(&installed));
        SpyGuard {
            slot: self,
            installed,
            active,
            original: Some(original),
        }
    }
}

/// Holds the original function of a spied [`Spyable`].
pub struct SpyGuard<'a, A, R> {
    slot: &'a Spyable<A, R>,
    installed: Callable<A, R>,
    active: Rc<Cell<bool>>,
    original: Option<Callable<A, R>>,
}

impl<A, R> SpyGuard<'_, A, R> {
    pub fn restore(self) {}
}

impl<A, R> Drop for SpyGuard<'_, A, R> {
    fn drop(&mut self) {
        self.active.set(false);
        let Some(original) = self.original.take() else {
            return;
        };
        let on_top = Rc::ptr_eq(&self.slot.current.borrow(), &self.installed);
        if on_top {
            self.slot.current.replace(original);
        }
    }
}
