//! Code generation: transforms the DSL AST into calls on `treespec::Context`.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

use crate::dsl::*;

// ============================================================================
// Public entry point
// ============================================================================

/// Expand to a registration closure accepted by `treespec::run`.
pub fn generate(suite: Suite) -> TokenStream {
    let ctx = context_ident();
    let items = generate_items(&suite.items);
    quote! {
        |#ctx: &mut ::treespec::Context<'_>| {
            #items
        }
    }
}

fn context_ident() -> Ident {
    Ident::new("__treespec_ctx", Span::mixed_site())
}

fn selection(mark: Mark) -> TokenStream {
    match mark {
        Mark::Normal => quote! { ::treespec::Selection::Normal },
        Mark::Focused => quote! { ::treespec::Selection::Focused },
        Mark::Solo => quote! { ::treespec::Selection::Solo },
        Mark::Skip => quote! { ::treespec::Selection::Skip },
    }
}

// ============================================================================
// Item generation
// ============================================================================

fn generate_items(items: &[DslItem]) -> TokenStream {
    let mut output = TokenStream::new();
    for item in items {
        output.extend(match item {
            DslItem::Describe(block) => generate_describe(block),
            DslItem::It(block) => generate_it(block),
            DslItem::Hook(block) => generate_hook(block),
        });
    }
    output
}

fn generate_describe(block: &DescribeBlock) -> TokenStream {
    let ctx = context_ident();
    let name = &block.name;
    let selection = selection(block.mark);
    let items = generate_items(&block.items);
    quote! {
        #ctx.describe_with(#selection, #name, |#ctx: &mut ::treespec::Context<'_>| {
            #items
        });
    }
}

/// Test bodies run inside an `async` block, so `.await` and `?` both work.
fn generate_it(block: &ItBlock) -> TokenStream {
    let ctx = context_ident();
    let name = &block.name;
    let selection = selection(block.mark);
    let binding = &block.binding;
    let body = &block.body;
    quote! {
        #ctx.it(#name, |#binding: ::treespec::TestContext| async move {
            let _ = &#binding;
            { #body };
            ::core::result::Result::<(), ::treespec::anyhow::Error>::Ok(())
        })
        .selection(#selection);
    }
}

fn generate_hook(block: &HookBlock) -> TokenStream {
    let ctx = context_ident();
    let body = &block.body;
    let ret = quote! { ::core::result::Result::<(), ::treespec::anyhow::Error> };

    match (block.kind, &block.binding) {
        (HookKind::Before, _) => quote! {
            #ctx.before(move || -> #ret { { #body }; Ok(()) });
        },
        (HookKind::After, _) => quote! {
            #ctx.after(move || -> #ret { { #body }; Ok(()) });
        },
        (HookKind::BeforeEach, binding) => {
            let binding = each_binding(binding);
            quote! {
                #ctx.before_each(move |#binding: &::treespec::TestContext| -> #ret {
                    let _ = &#binding;
                    { #body };
                    Ok(())
                });
            }
        }
        (HookKind::AfterEach, binding) => {
            let binding = each_binding(binding);
            quote! {
                #ctx.after_each(move |#binding: &::treespec::TestContext| -> #ret {
                    let _ = &#binding;
                    { #body };
                    Ok(())
                });
            }
        }
    }
}

fn each_binding(binding: &Option<Ident>) -> Ident {
    binding
        .clone()
        .unwrap_or_else(|| Ident::new("t", Span::call_site()))
}
