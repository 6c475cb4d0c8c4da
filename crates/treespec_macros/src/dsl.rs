//! DSL AST types and `syn::parse::Parse` implementations.

use proc_macro2::{Span, TokenStream};
use syn::parse::{Parse, ParseStream};
use syn::{braced, Ident, LitStr, Result, Token};

// ============================================================================
// AST types
// ============================================================================

/// Top-level suite: a list of DSL items registered on the root context.
#[derive(Debug)]
pub struct Suite {
    pub items: Vec<DslItem>,
}

/// A single DSL node.
#[derive(Debug)]
pub enum DslItem {
    Describe(DescribeBlock),
    It(ItBlock),
    Hook(HookBlock),
}

/// Selection carried by the keyword prefix: `f` focus, `s` solo, `x` skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Normal,
    Focused,
    Solo,
    Skip,
}

/// `describe "name" { ... }` / `context "name" { ... }` and their
/// `f`/`s`/`x` variants.
#[derive(Debug)]
pub struct DescribeBlock {
    pub name: LitStr,
    pub mark: Mark,
    pub items: Vec<DslItem>,
}

/// `it "name" [|binding|] { ... }` and `fit` / `sit` / `xit`.
#[derive(Debug)]
pub struct ItBlock {
    pub name: LitStr,
    pub mark: Mark,
    pub binding: Ident,
    pub body: TokenStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Before,
    After,
    BeforeEach,
    AfterEach,
}

/// `before { ... }` / `after { ... }` / `before_each [|binding|] { ... }` /
/// `after_each [|binding|] { ... }`
#[derive(Debug)]
pub struct HookBlock {
    pub kind: HookKind,
    /// Only the `*_each` hooks receive the test context.
    pub binding: Option<Ident>,
    pub body: TokenStream,
}

// ============================================================================
// Parsing
// ============================================================================

impl Parse for Suite {
    fn parse(input: ParseStream) -> Result<Self> {
        let items = parse_items(input)?;
        Ok(Suite { items })
    }
}

/// Parse a sequence of DSL items until the stream is exhausted.
fn parse_items(input: ParseStream) -> Result<Vec<DslItem>> {
    let mut items = Vec::new();
    while !input.is_empty() {
        items.push(input.parse::<DslItem>()?);
    }
    Ok(items)
}

impl Parse for DslItem {
    fn parse(input: ParseStream) -> Result<Self> {
        let ident: Ident = input.parse()?;
        let name = ident.to_string();

        match name.as_str() {
            "describe" | "context" => Ok(DslItem::Describe(parse_describe_block(input, Mark::Normal)?)),
            "fdescribe" | "fcontext" => {
                Ok(DslItem::Describe(parse_describe_block(input, Mark::Focused)?))
            }
            "sdescribe" | "scontext" => Ok(DslItem::Describe(parse_describe_block(input, Mark::Solo)?)),
            "xdescribe" | "xcontext" => Ok(DslItem::Describe(parse_describe_block(input, Mark::Skip)?)),

            "it" => Ok(DslItem::It(parse_it_block(input, Mark::Normal)?)),
            "fit" => Ok(DslItem::It(parse_it_block(input, Mark::Focused)?)),
            "sit" => Ok(DslItem::It(parse_it_block(input, Mark::Solo)?)),
            "xit" => Ok(DslItem::It(parse_it_block(input, Mark::Skip)?)),

            "before" => Ok(DslItem::Hook(parse_hook_block(input, HookKind::Before)?)),
            "after" => Ok(DslItem::Hook(parse_hook_block(input, HookKind::After)?)),
            "before_each" => Ok(DslItem::Hook(parse_hook_block(input, HookKind::BeforeEach)?)),
            "after_each" => Ok(DslItem::Hook(parse_hook_block(input, HookKind::AfterEach)?)),

            _ => Err(syn::Error::new(
                ident.span(),
                format!(
                    "unknown DSL keyword `{name}`. Expected one of: \
                     describe, context, it, before, after, before_each, after_each \
                     (with optional f/s/x prefix on describe, context and it)"
                ),
            )),
        }
    }
}

// ============================================================================
// Block parsers
// ============================================================================

/// Parse: `"name" { items... }`
fn parse_describe_block(input: ParseStream, mark: Mark) -> Result<DescribeBlock> {
    let name: LitStr = input.parse()?;
    let content;
    braced!(content in input);
    let items = parse_items(&content)?;
    Ok(DescribeBlock { name, mark, items })
}

/// Parse: `"name" [|binding|] { body }`
fn parse_it_block(input: ParseStream, mark: Mark) -> Result<ItBlock> {
    let name: LitStr = input.parse()?;
    let binding = parse_binding(input)?.unwrap_or_else(default_binding);
    let body = parse_body(input)?;
    Ok(ItBlock {
        name,
        mark,
        binding,
        body,
    })
}

/// Parse: `[|binding|] { body }`
fn parse_hook_block(input: ParseStream, kind: HookKind) -> Result<HookBlock> {
    let binding = match kind {
        HookKind::Before | HookKind::After => None,
        HookKind::BeforeEach | HookKind::AfterEach => {
            Some(parse_binding(input)?.unwrap_or_else(default_binding))
        }
    };
    let body = parse_body(input)?;
    Ok(HookBlock {
        kind,
        binding,
        body,
    })
}

fn parse_binding(input: ParseStream) -> Result<Option<Ident>> {
    if !input.peek(Token![|]) {
        return Ok(None);
    }
    input.parse::<Token![|]>()?;
    let ident: Ident = input.parse()?;
    input.parse::<Token![|]>()?;
    Ok(Some(ident))
}

fn parse_body(input: ParseStream) -> Result<TokenStream> {
    let content;
    braced!(content in input);
    content.parse()
}

/// The test context is bound as `t` unless named explicitly.
fn default_binding() -> Ident {
    Ident::new("t", Span::call_site())
}
