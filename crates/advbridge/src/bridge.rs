//! Call dispatcher: the public operation catalogue.
//!
//! Every operation runs the same template — validate at the boundary, take
//! exclusive interpreter access, marshal arguments, invoke the bound
//! callable, marshal the result. The whole catalogue reduces to four shared
//! call shapes.

use pyo3::exceptions::PyIndexError;
use pyo3::types::PyAnyMethods;
use pyo3::{PyErr, Python};
use tracing::debug;

use crate::buffer::{OwnedCopy, PyView};
use crate::config::BridgeConfig;
use crate::env::Environment;
use crate::error::BridgeError;
use crate::gil::with_interpreter;
use crate::profile::{Op, Profile};

/// Handle to the running bridge environment.
///
/// Cheap to share across host threads by reference; calls serialize at the
/// interpreter boundary. Dropping the handle without [`Bridge::finalize`]
/// leaves the environment running for the rest of the process.
pub struct Bridge {
    env: Environment,
}

impl Bridge {
    /// Starts the embedded interpreter, imports the configured module, and
    /// binds every callable named by the configured profile.
    pub fn initialize(config: BridgeConfig) -> Result<Self, BridgeError> {
        Ok(Self {
            env: Environment::initialize(&config)?,
        })
    }

    pub fn profile(&self) -> Profile {
        self.env.profile()
    }

    /// Selects the interpreter-side compute device. Idempotent.
    pub fn set_device(&self, device: &str) -> Result<(), BridgeError> {
        let op = Op::SetDevice;
        if device.is_empty() {
            return Err(BridgeError::InvalidArgument {
                operation: op.symbol(),
                reason: "device name must be non-empty",
            });
        }
        debug!(op = op.symbol(), device, "bridge call");
        with_interpreter(|py| {
            let callable = self.env.callable(op)?;
            callable
                .bind(py)
                .call1((device,))
                .map_err(|err| call_error(py, op, err))?;
            Ok(())
        })
    }

    /// Runs one batch through the interpreter-side attack. The output
    /// length is independent of the input length.
    pub fn perturb(&self, batch: &[u8]) -> Result<OwnedCopy, BridgeError> {
        self.call_bytes_to_bytes(Op::Perturb, batch)
    }

    /// Replaces the interpreter-side attack state.
    pub fn update_attack(&self, data: &[u8]) -> Result<(), BridgeError> {
        self.call_with_bytes(Op::UpdateAttack, data)
    }

    /// Replaces the interpreter-side model state.
    pub fn update_model(&self, data: &[u8]) -> Result<(), BridgeError> {
        self.call_with_bytes(Op::UpdateModel, data)
    }

    /// Enqueues a clean batch for asynchronous perturbation.
    pub fn push_batch(&self, batch: &[u8]) -> Result<(), BridgeError> {
        self.call_with_bytes(Op::PushBatch, batch)
    }

    /// Dequeues the next adversarial batch; [`BridgeError::EmptyQueue`]
    /// when nothing is queued.
    pub fn pop_batch(&self) -> Result<OwnedCopy, BridgeError> {
        self.call_for_bytes(Op::PopBatch)
    }

    /// Forwards refreshed model weights to the generator.
    pub fn push_model_state(&self, state: &[u8]) -> Result<(), BridgeError> {
        self.call_with_bytes(Op::PushModelState, state)
    }

    /// Reconfigures the full data pipeline (unified naming scheme).
    pub fn update_data(&self, data: &[u8]) -> Result<(), BridgeError> {
        self.call_with_bytes(Op::UpdateData, data)
    }

    /// Reconfigures the dataset (split naming scheme).
    pub fn update_dataset(&self, data: &[u8]) -> Result<(), BridgeError> {
        self.call_with_bytes(Op::UpdateDataset, data)
    }

    /// Reconfigures the dataloader (split naming scheme).
    pub fn update_dataloader(&self, data: &[u8]) -> Result<(), BridgeError> {
        self.call_with_bytes(Op::UpdateDataloader, data)
    }

    /// Number of batches the interpreter-side pipeline currently holds.
    pub fn get_num_batches(&self) -> Result<u64, BridgeError> {
        self.call_for_count(Op::GetNumBatches)
    }

    /// Fetches the next clean batch; [`BridgeError::EmptyQueue`] when the
    /// pipeline has none.
    pub fn get_clean_batch(&self) -> Result<OwnedCopy, BridgeError> {
        self.call_for_bytes(Op::GetCleanBatch)
    }

    /// Tears the environment down. The caller must have drained all
    /// in-flight calls first; the environment cannot be re-initialised
    /// afterwards.
    pub fn finalize(self) -> Result<(), BridgeError> {
        self.env.finalize()
    }

    fn call_with_bytes(&self, op: Op, payload: &[u8]) -> Result<(), BridgeError> {
        ensure_payload(op, payload)?;
        debug!(op = op.symbol(), len = payload.len(), "bridge call");
        with_interpreter(|py| {
            let callable = self.env.callable(op)?;
            let view = PyView::over(py, payload).map_err(|err| view_error(op, err))?;
            callable
                .bind(py)
                .call1((view.as_any(),))
                .map_err(|err| call_error(py, op, err))?;
            Ok(())
        })
    }

    fn call_bytes_to_bytes(&self, op: Op, payload: &[u8]) -> Result<OwnedCopy, BridgeError> {
        ensure_payload(op, payload)?;
        debug!(op = op.symbol(), len = payload.len(), "bridge call");
        with_interpreter(|py| {
            let callable = self.env.callable(op)?;
            let view = PyView::over(py, payload).map_err(|err| view_error(op, err))?;
            let result = callable
                .bind(py)
                .call1((view.as_any(),))
                .map_err(|err| call_error(py, op, err))?;
            OwnedCopy::from_py(op.symbol(), &result, true)
        })
    }

    fn call_for_bytes(&self, op: Op) -> Result<OwnedCopy, BridgeError> {
        debug!(op = op.symbol(), "bridge call");
        with_interpreter(|py| {
            let callable = self.env.callable(op)?;
            let result = callable
                .bind(py)
                .call0()
                .map_err(|err| call_error(py, op, err))?;
            OwnedCopy::from_py(op.symbol(), &result, true)
        })
    }

    fn call_for_count(&self, op: Op) -> Result<u64, BridgeError> {
        debug!(op = op.symbol(), "bridge call");
        with_interpreter(|py| {
            let callable = self.env.callable(op)?;
            let result = callable
                .bind(py)
                .call0()
                .map_err(|err| call_error(py, op, err))?;
            result
                .extract::<u64>()
                .map_err(|err| BridgeError::Conversion {
                    operation: op.symbol(),
                    reason: err.to_string(),
                })
        })
    }
}

fn ensure_payload(op: Op, payload: &[u8]) -> Result<(), BridgeError> {
    if payload.is_empty() {
        return Err(BridgeError::InvalidArgument {
            operation: op.symbol(),
            reason: "payload must be non-empty",
        });
    }
    Ok(())
}

fn view_error(op: Op, err: PyErr) -> BridgeError {
    BridgeError::Conversion {
        operation: op.symbol(),
        reason: err.to_string(),
    }
}

fn call_error(py: Python<'_>, op: Op, err: PyErr) -> BridgeError {
    // IndexError out of a pop-style operation is the empty-queue signal;
    // everything else propagates with the interpreter's own message.
    if matches!(op, Op::PopBatch | Op::GetCleanBatch) && err.is_instance_of::<PyIndexError>(py) {
        return BridgeError::EmptyQueue;
    }
    BridgeError::Call {
        operation: op.symbol(),
        message: err.to_string(),
    }
}
