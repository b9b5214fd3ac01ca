//! Schema-driven dispatch (spec §4.3): walks entries off the shared parser,
//! matches each one to a registered [`Spec`] by name, enforces cardinality,
//! and — once the input is exhausted — applies defaults and checks that
//! every required directive was seen.

use crate::entry::Entry;
use crate::error::CfgError;
use crate::limit::DepthTracker;
use crate::module::Module;
use crate::parser::EntryParser;
use crate::spec::Spec;

/// Bundles what a [`crate::spec::Handler`] needs to recurse into a nested
/// block: the live parser (so a block handler can keep reading from the
/// same token stream its caller is on), the original source text (for
/// error snippets), and a depth guard shared across the whole dispatch.
pub struct DispatchCtx<'p, 'a> {
    pub(crate) parser: &'p mut EntryParser<'a>,
    pub(crate) source: &'a str,
    pub(crate) depth: DepthTracker,
}

impl<'p, 'a> DispatchCtx<'p, 'a> {
    pub(crate) fn new(parser: &'p mut EntryParser<'a>, source: &'a str) -> Self {
        Self {
            parser,
            source,
            depth: DepthTracker::default(),
        }
    }
}

/// Run every registered module's schema against `source` (spec §4.3's
/// top-level dispatch loop). Resets every spec's call counter first, then
/// parses and dispatches one entry at a time, and finally applies defaults
/// and checks required directives across all modules.
pub fn dispatch(source: &str, modules: &[Module]) -> Result<(), CfgError> {
    for spec in modules.iter().flat_map(|m| m.specs.iter()) {
        spec.reset_call_counter();
        spec.validate()?;
    }

    let mut parser = EntryParser::new(source);
    let mut ctx = DispatchCtx::new(&mut parser, source);

    loop {
        let entry = match ctx.parser.parse_entry() {
            Ok(entry) => entry,
            Err(err) => {
                log::error!("{}", err.render(source));
                return Err(err);
            }
        };
        if entry.is_empty() {
            break;
        }
        dispatch_one(modules.iter().flat_map(|m| m.specs.iter()), &entry, &mut ctx)?;
    }

    for module in modules {
        finish(&module.specs, &mut ctx)?;
    }
    Ok(())
}

fn dispatch_one<'s>(
    specs: impl Iterator<Item = &'s Spec>,
    entry: &Entry,
    ctx: &mut DispatchCtx,
) -> Result<(), CfgError> {
    let mut specs = specs;
    match specs.find(|s| s.name == entry.name) {
        Some(spec) => handle_entry(spec, entry, ctx),
        None => Err(CfgError::UnknownDirective {
            name: entry.name.clone(),
        }),
    }
}

pub(crate) fn handle_entry(spec: &Spec, entry: &Entry, ctx: &mut DispatchCtx) -> Result<(), CfgError> {
    if spec.call_count() > 0 && !spec.allow_repeat {
        return Err(CfgError::Duplicate {
            name: spec.name.clone(),
        });
    }
    (spec.handler)(spec, entry, ctx)?;
    spec.mark_called();
    Ok(())
}

/// Drives a nested block's body against its own child schema, re-entering
/// the same loop shape as [`dispatch`] but scoped to one `Vec<Spec>` and
/// guarded by a recursion-depth counter (spec §4.3, §7's block-nesting
/// guard; the depth tracker is adapted from a parser recursion limiter).
pub(crate) fn dispatch_block(specs: &[Spec], ctx: &mut DispatchCtx) -> Result<(), CfgError> {
    ctx.depth.enter();
    if ctx.depth.limited() {
        ctx.depth.exit();
        return Err(CfgError::RecursionLimit {
            limit: ctx.depth.limit,
        });
    }

    for spec in specs {
        spec.reset_call_counter();
        spec.validate()?;
    }

    ctx.parser.consume_lbrace()?;
    loop {
        if ctx.parser.at_rbrace()? {
            break;
        }
        let entry = match ctx.parser.parse_entry() {
            Ok(entry) => entry,
            Err(err) => {
                log::error!("{}", err.render(ctx.source));
                ctx.depth.exit();
                return Err(err);
            }
        };
        if entry.is_empty() {
            ctx.depth.exit();
            return Err(CfgError::Syntax {
                message: "unexpected end of input inside a block".to_string(),
                index: ctx.parser.position(),
            });
        }
        if let Err(err) = dispatch_one(specs.iter(), &entry, ctx) {
            ctx.depth.exit();
            return Err(err);
        }
    }
    ctx.parser.expect_rbrace()?;
    ctx.depth.exit();
    finish(specs, ctx)
}

/// After all input is consumed: any spec never matched either gets its
/// default synthesized and dispatched, is allowed to be absent, or is a
/// [`CfgError::MissingRequired`] (spec §4.3).
fn finish(specs: &[Spec], ctx: &mut DispatchCtx) -> Result<(), CfgError> {
    for spec in specs {
        if spec.call_count() > 0 {
            continue;
        }
        if spec.deflt.is_some() {
            apply_default(spec, ctx)?;
        } else if !spec.allow_none {
            return Err(CfgError::MissingRequired {
                name: spec.name.clone(),
            });
        }
    }
    Ok(())
}

fn apply_default(spec: &Spec, ctx: &mut DispatchCtx) -> Result<(), CfgError> {
    let deflt = spec.deflt.as_ref().expect("called only when deflt is set");
    let synthetic = format!("{} {deflt};", spec.name);
    let mut scratch = EntryParser::new(&synthetic);
    let entry = scratch
        .parse_entry()
        .expect("defaults are checked to parse at Spec::validate time");
    handle_entry(spec, &entry, ctx)
}
