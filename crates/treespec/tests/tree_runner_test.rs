use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use treespec::Spyable;

fn main() {
    let result = treespec::run(|ctx| {
        // =================================================================
        // Basic describe / context / it
        // =================================================================
        ctx.describe("Calculator", |ctx| {
            ctx.it("adds two numbers", |t| async move {
                let (a, b) = (2, 3);
                t.assert(a + b == 5, "2 + 3 = 5");
            });

            ctx.it("multiplies", |t| async move {
                t.assert(3 * 4 == 12, "3 * 4 = 12");
            });

            ctx.context("with negative numbers", |ctx| {
                ctx.it("handles negatives", |t| async move {
                    t.assert(-1 + 3 == 2, "-1 + 3 = 2");
                });
            });
        });

        // =================================================================
        // Hooks
        // =================================================================
        ctx.describe("Hooks", |ctx| {
            static BEFORE: AtomicU32 = AtomicU32::new(0);
            static BEFORE_EACH: AtomicU32 = AtomicU32::new(0);

            ctx.before(|| {
                BEFORE.fetch_add(1, Ordering::SeqCst);
            });
            ctx.before_each(|t| {
                BEFORE_EACH.fetch_add(1, Ordering::SeqCst);
                t.div().set_text("ready");
            });

            ctx.it("before ran once for this suite", |t| async move {
                t.assert(BEFORE.load(Ordering::SeqCst) == 1, "one before call");
            });

            ctx.it("before_each ran for every test", |t| async move {
                t.assert(BEFORE_EACH.load(Ordering::SeqCst) == 2, "two before_each calls");
                t.assert(t.div().text() == "ready", "div seeded by the hook");
            });

            ctx.context("nested", |ctx| {
                ctx.before_each(|t| t.span().set_text("inner"));

                ctx.it("sees both hooks", |t| async move {
                    t.assert(t.div().text() == "ready", "outer hook ran");
                    t.assert(t.span().text() == "inner", "inner hook ran");
                });
            });
        });

        // =================================================================
        // Async bodies
        // =================================================================
        ctx.describe("Async", |ctx| {
            ctx.it("awaits timers", |t| async move {
                treespec::sleep(Duration::from_millis(2)).await;
                treespec::defer().await;
                t.assert(t.is_running(), "still running after the wait");
            });

            ctx.it("propagates errors with ?", |t| async move {
                let n: i32 = "42".parse()?;
                t.assert(n == 42, "parsed");
                Ok::<(), std::num::ParseIntError>(())
            });
        });

        // =================================================================
        // Spies
        // =================================================================
        ctx.describe("Spies", |ctx| {
            ctx.it("observes calls and restores", |t| async move {
                let double = Spyable::new(|x: i32| x * 2);
                let seen = Rc::new(Cell::new(0));
                let spy = {
                    let seen = Rc::clone(&seen);
                    double.spy(move |value: &i32, _args: &i32| seen.set(*value))
                };
                t.assert(double.call(4) == 8, "value passes through");
                t.assert(seen.get() == 8, "spy saw the value");
                spy.restore();

                double.call(5);
                t.assert(seen.get() == 8, "restored function is not observed");
            });
        });

        // =================================================================
        // Selection
        // =================================================================
        ctx.xdescribe("Skipped", |ctx| {
            ctx.it("never runs", |t| async move { t.assert(false, "skipped") });
        });

        ctx.it("   skipped by name", |t| async move { t.assert(false, "skipped") });

        // =================================================================
        // DSL
        // =================================================================
        ctx.describe("DSL", treespec::suite! {
            it "works from the macro" {
                t.assert(true, "macro body ran");
            }
        });
    });

    if result.failed() {
        std::process::exit(1);
    }
}
