//! Environment lifecycle: interpreter startup, callable binding, teardown.
//!
//! The embedded interpreter is process-wide, so the lifecycle is too:
//! `Uninitialized → Running → Finalized`, enforced by a single state value
//! rather than free-floating globals. Re-initialising after finalization is
//! rejected. The CPython runtime itself stays resident once started:
//! finalizing a live interpreter invalidates every value that still aliases
//! its heap, so shutdown is not exposed past releasing our own handles.

use std::collections::HashMap;

use parking_lot::Mutex;
use pyo3::exceptions::PyTypeError;
use pyo3::types::{PyAnyMethods, PyList, PyListMethods, PyModule};
use pyo3::{Py, PyAny, PyResult, Python};
use tracing::info;

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::gil::with_interpreter;
use crate::profile::{Op, Profile};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LifecycleState {
    Uninitialized,
    Running,
    Finalized,
}

impl LifecycleState {
    const fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Running => "running",
            LifecycleState::Finalized => "finalized",
        }
    }
}

struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    const fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
        }
    }

    fn ensure_can_initialize(&self) -> Result<(), BridgeError> {
        match self.state {
            LifecycleState::Uninitialized => Ok(()),
            state => Err(BridgeError::Lifecycle {
                operation: "initialize",
                state: state.as_str(),
            }),
        }
    }

    fn ensure_can_finalize(&self) -> Result<(), BridgeError> {
        match self.state {
            LifecycleState::Running => Ok(()),
            state => Err(BridgeError::Lifecycle {
                operation: "finalize",
                state: state.as_str(),
            }),
        }
    }

    fn mark_running(&mut self) {
        self.state = LifecycleState::Running;
    }

    fn mark_finalized(&mut self) {
        self.state = LifecycleState::Finalized;
    }
}

static LIFECYCLE: Mutex<Lifecycle> = Mutex::new(Lifecycle::new());

/// Process-wide bridge environment: the imported module handle plus one
/// resolved callable per bound operation.
pub(crate) struct Environment {
    module: Py<PyModule>,
    callables: HashMap<Op, Py<PyAny>>,
    profile: Profile,
}

impl Environment {
    /// Starts the interpreter (first use only), extends the module search
    /// path, imports the configured module, and resolves every callable the
    /// profile names. Any failure is fatal and leaves the lifecycle
    /// untouched; partially bound handles are dropped under the lock.
    pub(crate) fn initialize(config: &BridgeConfig) -> Result<Self, BridgeError> {
        with_interpreter(|py| {
            let mut lifecycle = LIFECYCLE.lock();
            lifecycle.ensure_can_initialize()?;
            let env = Environment::bind(py, config)
                .map_err(|err| BridgeError::FatalInit(err.to_string()))?;
            lifecycle.mark_running();
            info!(
                module = %config.module,
                profile = ?config.profile,
                "bridge environment running"
            );
            Ok(env)
        })
    }

    fn bind(py: Python<'_>, config: &BridgeConfig) -> PyResult<Self> {
        let sys_path = py
            .import("sys")?
            .getattr("path")?
            .downcast_into::<PyList>()?;
        sys_path.append(&*config.search_path.to_string_lossy())?;

        let module = py.import(config.module.as_str())?;
        let mut callables = HashMap::with_capacity(config.profile.ops().len());
        for &op in config.profile.ops() {
            let attr = module.getattr(op.symbol())?;
            if !attr.is_callable() {
                return Err(PyTypeError::new_err(format!(
                    "module attribute `{}` is not callable",
                    op.symbol()
                )));
            }
            callables.insert(op, attr.unbind());
        }

        Ok(Self {
            module: module.unbind(),
            callables,
            profile: config.profile,
        })
    }

    pub(crate) fn profile(&self) -> Profile {
        self.profile
    }

    pub(crate) fn callable(&self, op: Op) -> Result<&Py<PyAny>, BridgeError> {
        self.callables.get(&op).ok_or(BridgeError::Unbound {
            operation: op.symbol(),
        })
    }

    /// Releases every bound callable and the module handle, then bars all
    /// further bridge activity. The caller guarantees quiescence; taking the
    /// exclusive permit here means teardown cannot overlap a running call.
    pub(crate) fn finalize(self) -> Result<(), BridgeError> {
        with_interpreter(|py| {
            let mut lifecycle = LIFECYCLE.lock();
            lifecycle.ensure_can_finalize()?;

            let Environment {
                module,
                callables,
                profile,
            } = self;
            for (_, callable) in callables {
                drop(callable.into_bound(py));
            }
            drop(module.into_bound(py));

            lifecycle.mark_finalized();
            info!(?profile, "bridge environment finalized");
            Ok(())
        })
    }
}
