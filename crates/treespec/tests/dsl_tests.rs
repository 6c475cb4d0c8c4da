use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use pretty_assertions::assert_eq;
use treespec::console::MemorySink;
use treespec::{Node, RunConfig, Runner, Selection, Suite, TestResult};

fn runner() -> Runner {
    Runner::new(RunConfig {
        seed: Some(0),
        ..RunConfig::default()
    })
    .with_sink(Rc::new(MemorySink::new()))
}

fn child<'a>(parent: &'a Suite, name: &str) -> &'a Node {
    parent.children().find(|node| node.name() == name).unwrap()
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_macro_builds_the_declared_tree() {
    let root = runner().build(treespec::suite! {
        before { }
        describe "outer" {
            fit "focused" { }
            sit "solo" { }
            xit "skipped" { }
            context "inner" {
                it "plain" { }
            }
        }
        fdescribe "focused suite" { }
        sdescribe "solo suite" { }
        xdescribe "skipped suite" { }
    });

    let names: Vec<&str> = root.children().map(Node::name).collect();
    assert_eq!(names, vec!["outer", "focused suite", "solo suite"]);
    assert_eq!(child(&root, "focused suite").selection(), Selection::Focused);
    assert_eq!(child(&root, "solo suite").selection(), Selection::Solo);
    assert_eq!(root.hooks().before_len(), 1);

    let outer = child(&root, "outer").as_suite().unwrap();
    let selections: Vec<Selection> = outer.children().map(Node::selection).collect();
    assert_eq!(
        selections,
        vec![Selection::Focused, Selection::Solo, Selection::Normal]
    );
}

// ============================================================================
// Execution
// ============================================================================

static BEFORE_EACH: AtomicU32 = AtomicU32::new(0);
static AFTER_EACH: AtomicU32 = AtomicU32::new(0);
static AFTER: AtomicU32 = AtomicU32::new(0);

#[tokio::test]
async fn test_macro_bodies_run_with_hooks_and_context() {
    let runner = runner();
    let mut root = runner.build(treespec::suite! {
        describe "Calculator" {
            before_each {
                BEFORE_EACH.fetch_add(1, Ordering::SeqCst);
                t.input().set_attribute("value", "2");
            }
            after_each |cx| {
                AFTER_EACH.fetch_add(1, Ordering::SeqCst);
                cx.log("cleaned up");
            }
            after {
                AFTER.fetch_add(1, Ordering::SeqCst);
            }

            it "adds" {
                let seeded: i32 = t.input().attribute("value").unwrap_or_default().parse()?;
                t.assert(seeded + 3 == 5, "2 + 3 = 5");
            }

            it "waits" |cx| {
                treespec::defer().await;
                cx.assert(true, "resumed");
            }
        }
    });

    let result = runner.execute(&mut root).await;
    assert!(result.passed());
    assert_eq!(BEFORE_EACH.load(Ordering::SeqCst), 2);
    assert_eq!(AFTER_EACH.load(Ordering::SeqCst), 2);
    assert_eq!(AFTER.load(Ordering::SeqCst), 1);

    let calculator = child(&root, "Calculator").as_suite().unwrap();
    let adds = child(calculator, "adds").as_test().unwrap();
    assert_eq!(adds.results(), &[TestResult::pass("2 + 3 = 5")]);
    assert_eq!(adds.log().len(), 2);
}

#[tokio::test]
async fn test_macro_question_mark_fails_test_or_hook() {
    let runner = runner();
    let mut root = runner.build(treespec::suite! {
        describe "bodies" {
            it "bad number" {
                let _: i32 = "seven".parse()?;
            }
        }
        describe "hooks" {
            before_each {
                let _: i32 = "".parse()?;
            }
            it "never reached" {
                t.assert(false, "body ran");
            }
        }
    });

    let result = runner.execute(&mut root).await;
    assert!(result.failed());

    let bodies = child(&root, "bodies").as_suite().unwrap();
    let bad = child(bodies, "bad number").as_test().unwrap();
    assert_eq!(
        bad.results(),
        &[TestResult::fail("invalid digit found in string")]
    );

    assert_eq!(
        root.results()[1],
        TestResult::fail("before_each hook failed in `hooks`: cannot parse integer from empty string")
    );
}
