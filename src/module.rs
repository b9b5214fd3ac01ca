//! Module registration and the four-phase activation lifecycle (spec §4.4,
//! §7): setup, then parse/dispatch, then start — with a reverse-order
//! rollback (stop, then cleanup) on any failure.

use crate::dispatcher::dispatch;
use crate::error::CfgError;
use crate::spec::Spec;

/// Lifecycle hooks a module may implement. Every method defaults to a
/// no-op so a module with no lifecycle needs can skip implementing this
/// trait entirely by using [`NoopHooks`].
pub trait ModuleHooks {
    fn init(&mut self) -> Result<(), CfgError> {
        Ok(())
    }
    fn setup(&mut self) -> Result<(), CfgError> {
        Ok(())
    }
    fn start(&mut self) -> Result<(), CfgError> {
        Ok(())
    }
    /// Best-effort: errors are logged by the coordinator, never propagated.
    fn stop(&mut self) -> Result<(), CfgError> {
        Ok(())
    }
    /// Best-effort: errors are logged by the coordinator, never propagated.
    fn cleanup(&mut self) -> Result<(), CfgError> {
        Ok(())
    }
    /// Best-effort: called once on [`Coordinator::unregister`].
    fn exit(&mut self) -> Result<(), CfgError> {
        Ok(())
    }
}

struct NoopHooks;
impl ModuleHooks for NoopHooks {}

/// One registered module: a name, its schema (the `Spec`s a dispatch pass
/// matches directives against), and the lifecycle hooks it implements.
pub struct Module {
    pub name: String,
    pub specs: Vec<Spec>,
    hooks: Box<dyn ModuleHooks>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            specs: Vec::new(),
            hooks: Box::new(NoopHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: impl ModuleHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn with_spec(mut self, spec: Spec) -> Self {
        self.specs.push(spec);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoordinatorState {
    Idle,
    Running,
}

/// Owns the registered [`Module`]s and drives the activation/teardown
/// contract (spec §4.4). `toggle` is the concrete realization of the
/// external "start"/"stop" control surface (spec §6).
pub struct Coordinator {
    modules: Vec<Module>,
    state: CoordinatorState,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            state: CoordinatorState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == CoordinatorState::Running
    }

    /// Calls the module's `init` hook and validates its schema, then adds
    /// it to the registry. Refuses registration while the system is
    /// running (spec §7: the schema set is fixed once active).
    pub fn register(&mut self, mut module: Module) -> Result<(), CfgError> {
        if self.state == CoordinatorState::Running {
            return Err(CfgError::RegisterWhileRunning { name: module.name });
        }
        module.hooks.init()?;
        for spec in &module.specs {
            spec.validate()?;
        }
        self.modules.push(module);
        Ok(())
    }

    /// Removes a module by name, calling its `exit` hook best-effort. Logs
    /// a warning (rather than refusing) if the system is currently running.
    pub fn unregister(&mut self, name: &str) -> Option<Module> {
        let idx = self.modules.iter().position(|m| m.name == name)?;
        if self.state == CoordinatorState::Running {
            log::warn!("unregistering module `{name}` while the system is running");
        }
        let mut module = self.modules.remove(idx);
        if let Err(err) = module.hooks.exit() {
            log::warn!("module `{name}` exit hook failed: {err}");
        }
        Some(module)
    }

    /// Runs setup on every module, then a single dispatch pass over
    /// `source`, then start on every module — rolling back in reverse
    /// order on any failure (spec §4.4, §7).
    pub fn start_all(&mut self, source: &str) -> Result<(), CfgError> {
        let mut setup_done = Vec::new();
        for i in 0..self.modules.len() {
            match self.modules[i].hooks.setup() {
                Ok(()) => setup_done.push(i),
                Err(err) => {
                    let name = self.modules[i].name.clone();
                    self.rollback(&setup_done, &[]);
                    return Err(CfgError::Lifecycle {
                        module: name,
                        phase: "setup",
                        message: err.to_string(),
                    });
                }
            }
        }

        if let Err(err) = dispatch(source, &self.modules) {
            self.rollback(&setup_done, &[]);
            return Err(err);
        }

        let mut started = Vec::new();
        for i in 0..self.modules.len() {
            match self.modules[i].hooks.start() {
                Ok(()) => started.push(i),
                Err(err) => {
                    let name = self.modules[i].name.clone();
                    self.rollback(&setup_done, &started);
                    return Err(CfgError::Lifecycle {
                        module: name,
                        phase: "start",
                        message: err.to_string(),
                    });
                }
            }
        }

        self.state = CoordinatorState::Running;
        Ok(())
    }

    /// Stops and cleans up every module in reverse registration order,
    /// ignoring hook failures (best-effort teardown).
    pub fn stop_all(&mut self) {
        self.rollback(
            &(0..self.modules.len()).collect::<Vec<_>>(),
            &(0..self.modules.len()).collect::<Vec<_>>(),
        );
        self.state = CoordinatorState::Idle;
    }

    /// Reverse-order `stop` on `started`, then reverse-order `cleanup` on
    /// `setup_done`. Errors from either hook are logged, never propagated
    /// (spec §7: rollback is best-effort once it has begun).
    fn rollback(&mut self, setup_done: &[usize], started: &[usize]) {
        for &i in started.iter().rev() {
            let module = &mut self.modules[i];
            if let Err(err) = module.hooks.stop() {
                log::warn!("module `{}` stop hook failed: {err}", module.name);
            }
        }
        for &i in setup_done.iter().rev() {
            let module = &mut self.modules[i];
            if let Err(err) = module.hooks.cleanup() {
                log::warn!("module `{}` cleanup hook failed: {err}", module.name);
            }
        }
    }

    /// The control-surface contract: `"start"` activates the system
    /// (idempotent if already running), `"stop"` tears it down (idempotent
    /// if already idle), anything else is [`CfgError::InvalidControlValue`].
    /// Matching is case-insensitive (spec §6).
    pub fn toggle(&mut self, value: &str, source: &str) -> Result<(), CfgError> {
        match value.to_ascii_lowercase().as_str() {
            "start" => {
                if self.is_running() {
                    return Ok(());
                }
                self.start_all(source)
            }
            "stop" => {
                if !self.is_running() {
                    return Ok(());
                }
                self.stop_all();
                Ok(())
            }
            _ => Err(CfgError::InvalidControlValue {
                value: value.to_string(),
            }),
        }
    }
}
