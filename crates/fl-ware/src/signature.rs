//! Static ware identity: id, kind, declared parameters and capabilities.

use std::fmt;
use std::ops::BitOr;

use fl_core::Step;

// ── Capabilities ──────────────────────────────────────────────────────────────

/// Set of write permissions a ware asks for.
///
/// Reads are always allowed.  Observers are granted [`Capabilities::NONE`]
/// regardless of what their signature declares.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE:            Capabilities = Capabilities(0);
    /// Add/remove units and connections, change process orders.
    pub const GRAPH_MUTATE:    Capabilities = Capabilities(1 << 0);
    /// Declare, append and back-fill variables.
    pub const VARIABLES_WRITE: Capabilities = Capabilities(1 << 1);
    pub const EVENTS_WRITE:    Capabilities = Capabilities(1 << 2);
    /// Set input data (setup phases only).
    pub const INPUT_WRITE:     Capabilities = Capabilities(1 << 3);
    pub const ALL:             Capabilities = Capabilities(0b1111);

    const NAMES: [(Capabilities, &'static str); 4] = [
        (Self::GRAPH_MUTATE, "graph-mutate"),
        (Self::VARIABLES_WRITE, "variables-write"),
        (Self::EVENTS_WRITE, "events-write"),
        (Self::INPUT_WRITE, "input-write"),
    ];

    #[inline]
    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        self.union(rhs)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (cap, name) in Self::NAMES {
            if self.contains(cap) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

// ── Phase ─────────────────────────────────────────────────────────────────────

/// Lifecycle phase a [`WareAccess`][crate::WareAccess] is bound to.
///
/// Parameterization has no phase: `init_params` never sees the simulation
/// state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Check,
    Initialize,
    Step(Step),
    Finalize,
}

impl Phase {
    pub fn step(self) -> Option<Step> {
        match self {
            Phase::Step(s) => Some(s),
            _ => None,
        }
    }

    /// Prepare, check and initialize: the phases where input data may change.
    pub fn is_setup(self) -> bool {
        matches!(self, Phase::Prepare | Phase::Check | Phase::Initialize)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Prepare    => f.write_str("prepare-data"),
            Phase::Check      => f.write_str("check-consistency"),
            Phase::Initialize => f.write_str("initialize-run"),
            Phase::Step(s)    => write!(f, "run-step {s}"),
            Phase::Finalize   => f.write_str("finalize-run"),
        }
    }
}

// ── WareSignature ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WareKind {
    /// Runs in the modeling pass and may write state.
    Simulator,
    /// Runs in the monitoring pass with read-only access.
    Observer,
}

/// A parameter a ware understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    pub name:        String,
    pub description: String,
    /// `None` means the parameter is required.
    pub default:     Option<String>,
}

/// Static description of a ware, returned by its registry entry.
///
/// ```rust,ignore
/// WareSignature::simulator("water.surf.runoff")
///     .describe("routes surface runoff downstream")
///     .requires(Capabilities::VARIABLES_WRITE)
///     .param("coeff", "runoff coefficient", Some("0.3"))
///     .max_threads(4)
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WareSignature {
    pub id:           String,
    pub kind:         WareKind,
    pub description:  String,
    pub params:       Vec<ParamSpec>,
    pub capabilities: Capabilities,
    /// Preferred worker count for `par_for_each_unit`; capped by the engine.
    pub max_threads:  usize,
}

impl WareSignature {
    fn new(id: &str, kind: WareKind) -> Self {
        Self {
            id:           id.to_owned(),
            kind,
            description:  String::new(),
            params:       Vec::new(),
            capabilities: Capabilities::NONE,
            max_threads:  1,
        }
    }

    pub fn simulator(id: &str) -> Self {
        Self::new(id, WareKind::Simulator)
    }

    pub fn observer(id: &str) -> Self {
        Self::new(id, WareKind::Observer)
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = text.to_owned();
        self
    }

    pub fn requires(mut self, caps: Capabilities) -> Self {
        self.capabilities = self.capabilities | caps;
        self
    }

    pub fn param(mut self, name: &str, description: &str, default: Option<&str>) -> Self {
        self.params.push(ParamSpec {
            name:        name.to_owned(),
            description: description.to_owned(),
            default:     default.map(str::to_owned),
        });
        self
    }

    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = n.max(1);
        self
    }

    pub fn is_observer(&self) -> bool {
        self.kind == WareKind::Observer
    }

    /// Capabilities actually handed to the ware.
    pub fn granted(&self) -> Capabilities {
        match self.kind {
            WareKind::Simulator => self.capabilities,
            WareKind::Observer  => Capabilities::NONE,
        }
    }
}
