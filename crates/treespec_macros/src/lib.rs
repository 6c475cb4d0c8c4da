//! Proc macros for the `treespec` test runner.

mod codegen;
mod dsl;

/// A block DSL for registering a test tree.
///
/// Expands to a closure taking `&mut treespec::Context`, so the result can be
/// handed straight to `treespec::run` or `Runner::build`.
///
/// # Example
///
/// ```text
/// fn main() {
///     let result = treespec::run(treespec::suite! {
///         describe "Calculator" {
///             before_each { t.input().set_attribute("value", "2"); }
///
///             it "adds two numbers" {
///                 t.assert(2 + 3 == 5, "2 + 3 = 5");
///             }
///
///             context "with a delay" {
///                 fit "still adds" |cx| {
///                     treespec::defer().await;
///                     cx.assert(-1 + 1 == 0, "-1 + 1 = 0");
///                 }
///             }
///         }
///     });
///     if result.failed() {
///         std::process::exit(1);
///     }
/// }
/// ```
///
/// # Supported DSL keywords
///
/// ## Containers
/// - `describe "name" { ... }` / `context "name" { ... }`
/// - `fdescribe` / `fcontext`: focused
/// - `sdescribe` / `scontext`: solo
/// - `xdescribe` / `xcontext`: skipped
///
/// ## Tests
/// - `it "name" { ... }`: the body is async and may use `?`; the test
///   context is bound as `t`
/// - `it "name" |cx| { ... }`: bind the test context under another name
/// - `fit` / `sit` / `xit`: focused, solo, skipped
///
/// ## Hooks
/// - `before { ... }` / `after { ... }`: around the suite's children, and
///   around every nested suite
/// - `before_each [|t|] { ... }` / `after_each [|t|] { ... }`: around every
///   test below the suite
///
/// Hook bodies may use `?`; an error aborts the enclosing suite.
#[proc_macro]
pub fn suite(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let suite = syn::parse_macro_input!(input as dsl::Suite);
    codegen::generate(suite).into()
}
