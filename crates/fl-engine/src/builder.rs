//! Fluent builder for constructing a [`SimulationEngine`].

use fl_core::{RunDescriptor, RunEnv};
use fl_spatial::Repository;
use fl_ware::{Ware, WareParams, WareRegistry, WareSignature, World};

use crate::{EngineConfig, EngineError, EngineResult, ModelInstance, SimulationEngine, WareHost};

/// One model entry waiting for [`EngineBuilder::build`].
enum PendingWare {
    /// Resolved through the registry at build time.
    ById { id: String, params: WareParams },
    /// Supplied directly, already past the ABI check.
    Instance { signature: WareSignature, ware: Box<dyn Ware>, params: WareParams },
}

/// Fluent builder for [`SimulationEngine`].
///
/// # Required inputs
///
/// - [`RunDescriptor`] — run period and step length
/// - [`Repository`] — the populated unit graph
///
/// # Optional inputs (have defaults)
///
/// | Method                  | Default                 |
/// |-------------------------|-------------------------|
/// | `.env(e)`               | empty `RunEnv`          |
/// | `.config(c)`            | `EngineConfig::default()` |
/// | `.ware(id, params)`     | no wares                |
///
/// Wares keep their declared order.  Observers are moved to the monitoring
/// pass; simulators stay in the modeling pass.
///
/// # Example
///
/// ```rust,ignore
/// let mut engine = EngineBuilder::new(run, repository)
///     .env(RunEnv::new().with("dir.output", "out"))
///     .ware("water.rain", WareParams::new().with("mean", "2.5"))
///     .ware("export.vars.csv", WareParams::new().with("vars", "runoff"))
///     .build(&registry)?;
/// let report = engine.run()?;
/// ```
pub struct EngineBuilder {
    run:        RunDescriptor,
    repository: Repository,
    env:        RunEnv,
    config:     EngineConfig,
    wares:      Vec<PendingWare>,
}

impl EngineBuilder {
    pub fn new(run: RunDescriptor, repository: Repository) -> Self {
        Self {
            run,
            repository,
            env:    RunEnv::new(),
            config: EngineConfig::default(),
            wares:  Vec::new(),
        }
    }

    pub fn env(mut self, env: RunEnv) -> Self {
        self.env = env;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a ware looked up by ID in the registry passed to `build`.
    pub fn ware(mut self, id: &str, params: WareParams) -> Self {
        self.wares.push(PendingWare::ById { id: id.to_owned(), params });
        self
    }

    /// Append a ware instance directly, bypassing the registry.
    pub fn ware_instance(mut self, signature: WareSignature, ware: Box<dyn Ware>, params: WareParams) -> Self {
        self.wares.push(PendingWare::Instance { signature, ware, params });
        self
    }

    /// Resolve every ware and return a ready-to-run engine.
    ///
    /// Fails on an unknown ware ID, an ABI mismatch or a ware ID used twice.
    pub fn build(self, registry: &WareRegistry) -> EngineResult<SimulationEngine> {
        if self.config.max_threads == Some(0) {
            return Err(EngineError::Config("max_threads must be at least 1".into()));
        }

        let mut modeling = ModelInstance::new();
        let mut monitoring = ModelInstance::new();
        let mut seen: Vec<String> = Vec::with_capacity(self.wares.len());

        for pending in self.wares {
            let (signature, ware, params) = match pending {
                PendingWare::ById { id, params } => {
                    let (signature, ware) = registry.instantiate(&id)?;
                    (signature, ware, params)
                }
                PendingWare::Instance { signature, ware, params } => (signature, ware, params),
            };
            if seen.contains(&signature.id) {
                return Err(EngineError::Config(format!("ware `{}` appears twice in the model", signature.id)));
            }
            seen.push(signature.id.clone());

            let host = WareHost::new(signature, ware, params);
            if host.is_observer() {
                monitoring.push(host);
            } else {
                modeling.push(host);
            }
        }

        let mut repository = self.repository;
        if repository.is_order_dirty() {
            repository.sort_by_process_order();
        }
        let world = World::new(repository, self.config.write_policy);
        log::debug!(
            "model: [{}] monitoring: [{}]",
            modeling.ids().collect::<Vec<_>>().join(", "),
            monitoring.ids().collect::<Vec<_>>().join(", "),
        );

        Ok(SimulationEngine::new(self.run, self.env, self.config, world, modeling, monitoring))
    }
}
