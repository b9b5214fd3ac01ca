use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::entry::is_identifier;
use crate::error::CfgError;
use crate::parser::EntryParser;

/// Per-handler constraints a [`Spec`] carries alongside its `dest` (spec
/// §3's "opaque per-handler constraints (range, length, etc.)"). Kept as a
/// closed enum rather than an `Any` blob: the set of stock handlers is
/// closed, so each handler's constraint shape can be named directly.
#[derive(Debug, Clone, Default)]
pub enum SpecExt {
    #[default]
    None,
    IntConstraint {
        range: Option<(i32, i32)>,
        multiple_of: Option<i32>,
    },
    StringConstraint {
        len_range: Option<(usize, usize)>,
    },
    EnumConstraint(&'static [(&'static str, i32)]),
}

/// The destination storage a handler writes into, addressed through an
/// `Rc`-shared cell so the module that owns it can read the value back out
/// after `dispatch` returns. `Custom` is the escape hatch for a module's own
/// handler and destination shape (see SPEC_FULL.md's note on why this isn't
/// `Any`-only: the stock handlers' destinations are enumerable, so they get
/// their own variants).
#[derive(Clone)]
pub enum Dest {
    Bool(Rc<Cell<bool>>),
    Int(Rc<Cell<i32>>),
    /// Shared string buffer plus its maximum length.
    StringBuf(Rc<RefCell<String>>, usize),
    Enum(Rc<Cell<i32>>),
    /// The child schema set a nested-block spec recurses into.
    Block(Rc<Vec<Spec>>),
    Custom(Rc<dyn Any>),
}

impl fmt::Debug for Dest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dest::Bool(_) => "Bool",
            Dest::Int(_) => "Int",
            Dest::StringBuf(..) => "StringBuf",
            Dest::Enum(_) => "Enum",
            Dest::Block(_) => "Block",
            Dest::Custom(_) => "Custom",
        };
        write!(f, "Dest::{name}")
    }
}

/// The handler callback a [`Spec`] invokes when its directive is matched
/// (spec §3/§4.3). Receives the spec (for `dest`/`spec_ext`) and the parsed
/// entry; recursion into nested blocks reaches back into the active parser
/// through `ctx`.
pub type Handler = fn(&Spec, &crate::entry::Entry, &mut crate::dispatcher::DispatchCtx) -> Result<(), CfgError>;

/// A declarative schema specification binding one directive name to a
/// handler, a destination, constraints, a default, and a cardinality policy
/// (spec §3).
pub struct Spec {
    pub name: String,
    pub handler: Handler,
    pub dest: Dest,
    pub spec_ext: SpecExt,
    /// The literal textual body that would follow `name` up to `;`, used to
    /// synthesize a directive when this spec was never matched.
    pub deflt: Option<String>,
    pub allow_none: bool,
    pub allow_repeat: bool,
    pub(crate) call_counter: Cell<u32>,
}

impl Spec {
    pub fn new(name: impl Into<String>, handler: Handler, dest: Dest) -> Self {
        Self {
            name: name.into(),
            handler,
            dest,
            spec_ext: SpecExt::None,
            deflt: None,
            allow_none: false,
            allow_repeat: false,
            call_counter: Cell::new(0),
        }
    }

    pub fn with_ext(mut self, ext: SpecExt) -> Self {
        self.spec_ext = ext;
        self
    }

    pub fn with_default(mut self, deflt: impl Into<String>) -> Self {
        self.deflt = Some(deflt.into());
        self
    }

    pub fn allow_none(mut self) -> Self {
        self.allow_none = true;
        self
    }

    pub fn allow_repeat(mut self) -> Self {
        self.allow_repeat = true;
        self
    }

    pub(crate) fn call_count(&self) -> u32 {
        self.call_counter.get()
    }

    pub(crate) fn reset_call_counter(&self) {
        self.call_counter.set(0);
    }

    pub(crate) fn mark_called(&self) {
        self.call_counter.set(self.call_counter.get() + 1);
    }

    /// Check the invariants spec §3 requires at registration / parse start:
    /// `name` is a valid identifier, and if `deflt` is set it must itself
    /// parse as a valid directive body.
    pub(crate) fn validate(&self) -> Result<(), CfgError> {
        if !is_identifier(&self.name) {
            return Err(CfgError::InvalidIdentifier {
                text: self.name.clone(),
            });
        }
        if let Some(deflt) = &self.deflt {
            let synthetic = format!("{} {deflt};", self.name);
            let mut p = EntryParser::new(&synthetic);
            p.parse_entry()?;
        }
        Ok(())
    }
}

impl fmt::Debug for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spec")
            .field("name", &self.name)
            .field("dest", &self.dest)
            .field("deflt", &self.deflt)
            .field("allow_none", &self.allow_none)
            .field("allow_repeat", &self.allow_repeat)
            .field("call_counter", &self.call_counter.get())
            .finish()
    }
}
