use std::rc::Rc;

use pretty_assertions::assert_eq;
use treespec::console::{MemorySink, TerminalSink};
use treespec::{Context, RunConfig, Runner};

/// Run `body` and return the report transcript with test timings removed.
async fn report(config: RunConfig, body: impl FnOnce(&mut Context<'_>)) -> String {
    let sink = Rc::new(MemorySink::new());
    let runner = Runner::new(config).with_sink(sink.clone());
    let mut root = runner.build(body);
    runner.execute(&mut root).await;
    strip_timings(&sink.transcript())
}

fn seeded() -> RunConfig {
    RunConfig {
        seed: Some(0),
        ..RunConfig::default()
    }
}

fn strip_timings(transcript: &str) -> String {
    transcript
        .lines()
        .map(|line| match line.rfind(" (") {
            Some(at) if line.ends_with("ms)") => &line[..at],
            _ => line,
        })
        .map(|line| format!("{line}\n"))
        .collect()
}

#[tokio::test]
async fn test_passing_tree_is_collapsed() {
    let transcript = report(seeded(), |ctx| {
        ctx.describe("math", |ctx| {
            ctx.it("adds", |t| async move { t.assert(1 + 1 == 2, "ok") });
            ctx.it("subtracts", |_| async {});
        });
        ctx.it("top", |_| async {});
    })
    .await;

    assert_eq!(
        transcript,
        "\
▸ ✅ 🦄 TESTS 🦄 (2/2)
  ▸ ✅ math (2/2)
    ▸ adds
      ok
    ▸ subtracts
  ▸ top
"
    );
}

#[tokio::test]
async fn test_failures_are_expanded_with_rotating_glyphs() {
    let transcript = report(seeded(), |ctx| {
        ctx.describe("parser", |ctx| {
            ctx.it("rejects garbage", |t| async move {
                t.assert(false, "expected an error");
            });
        });
        ctx.describe("lexer", |ctx| {
            ctx.it("ok", |t| async move { t.assert(true, "fine") });
        });
    })
    .await;

    assert_eq!(
        transcript,
        "\
▾ 🙉 🦄 TESTS 🦄 (1/2)
  ▾ 🐱 parser (0/1)
    ▾ rejects garbage
      expected an error
  ▸ ✅ lexer (1/1)
    ▸ ok
      fine
"
    );
}

#[tokio::test]
async fn test_focused_path_is_expanded() {
    let transcript = report(seeded(), |ctx| {
        ctx.describe("a", |ctx| {
            ctx.it("t1", |_| async {});
            ctx.fit("t2", |_| async {});
        });
        ctx.describe("b", |ctx| {
            ctx.it("t3", |_| async {});
        });
    })
    .await;

    assert_eq!(
        transcript,
        "\
▾ ✅ 🦄 TESTS 🦄 (2/2)
  ▾ ✅ a (1/1)
    ▾ t2
  ▸ ✅ b (1/1)
    ▸ t3
"
    );
}

#[tokio::test]
async fn test_solo_node_is_reported_alone_and_open() {
    let transcript = report(seeded(), |ctx| {
        ctx.describe("a", |ctx| {
            ctx.it("one", |_| async {});
            ctx.sit("two", |t| async move { t.assert(true, "fine") });
        });
    })
    .await;

    assert_eq!(transcript, "▾ two\n  fine\n");
}

#[tokio::test]
async fn test_open_config_expands_everything() {
    let config = RunConfig {
        open: true,
        ..seeded()
    };
    let transcript = report(config, |ctx| {
        ctx.describe("/specs/empty", |_| {});
        ctx.describe("full", |ctx| {
            ctx.it("works", |_| async {});
        });
    })
    .await;

    assert_eq!(
        transcript,
        "\
▾ ✅ 🦄 TESTS 🦄 (2/2)
  ✅ empty (0/0)
  ▾ ✅ full (1/1)
    ▾ works
"
    );
}

#[tokio::test]
async fn test_body_errors_are_logged_in_the_test_group() {
    let transcript = report(seeded(), |ctx| {
        ctx.it("breaks", |t| async move {
            t.log("before the error");
            Err::<(), _>(treespec::anyhow::anyhow!("disk on fire"))
        });
    })
    .await;

    let lines: Vec<&str> = transcript.lines().collect();
    assert_eq!(lines[0], "▾ 🙉 🦄 TESTS 🦄 (0/1)");
    assert_eq!(lines[1], "  ▾ breaks");
    assert_eq!(lines[2], "    before the error");
    assert!(lines[3].starts_with("    ERROR: disk on fire"));
}

#[tokio::test]
async fn test_hook_failures_are_reported_and_unrun_tests_hidden() {
    let transcript = report(seeded(), |ctx| {
        ctx.describe("a", |ctx| {
            ctx.before(|| Err::<(), _>(treespec::anyhow::anyhow!("no database")));
            ctx.it("a1", |t| async move { t.assert(true, "never") });
        });
        ctx.describe("b", |ctx| {
            ctx.before_each(|_| Err::<(), _>(treespec::anyhow::anyhow!("seed failed")));
            ctx.it("b1", |t| async move { t.assert(true, "never") });
            ctx.it("b2", |t| async move { t.assert(true, "never") });
        });
    })
    .await;

    assert_eq!(
        transcript,
        "\
▾ 🙉 🦄 TESTS 🦄 (0/2)
  ▾ 🐱 a (0/1)
    ERROR: before hook failed in `a`: no database
  ▾ 🦄 b (0/1)
    ERROR: before_each hook failed in `b`: seed failed
    ▾ b1
      ERROR: before_each hook failed in `b`: seed failed
"
    );
}

#[tokio::test]
async fn test_terminal_hides_collapsed_contents() {
    let sink = Rc::new(TerminalSink::new(Vec::new(), false));
    let runner = Runner::new(seeded()).with_sink(sink.clone());
    let mut root = runner.build(|ctx| {
        ctx.describe("quiet", |ctx| {
            ctx.it("passes", |t| async move { t.assert(true, "hidden detail") });
        });
        ctx.describe("loud", |ctx| {
            ctx.it("fails", |t| async move { t.assert(false, "visible detail") });
        });
    });
    runner.execute(&mut root).await;
    drop(runner);

    let sink = Rc::try_unwrap(sink).ok().unwrap();
    let output = String::from_utf8(sink.into_inner()).unwrap();
    assert!(output.contains("✅ quiet (1/1)"));
    assert!(!output.contains("hidden detail"));
    assert!(output.contains("🐱 loud (0/1)"));
    assert!(output.contains("visible detail"));
}
