//! Embedded-Python bridge for distributed adversarial training hosts.
//!
//! A host process embeds a CPython interpreter, imports one worker module,
//! and drives it through a small fixed operation catalogue: select a device,
//! perturb batches, push/pop batch queues, update model/attack state, and
//! query the dataloader. This crate is that bridge layer and nothing else —
//! the perturbation and training logic live in the Python module, and the
//! network plumbing that invokes these calls lives in the embedding host.
//!
//! - lifecycle: [`Bridge::initialize`] binds every callable the configured
//!   [`Profile`] names (missing names fail loudly); [`Bridge::finalize`]
//!   releases them and bars further calls.
//! - locking: every operation holds exclusive interpreter access for its
//!   full duration; host threads block-wait for their turn.
//! - buffers: payloads cross host→interpreter as zero-copy read-only views
//!   that die with the call, and interpreter→host only as defensively
//!   copied [`OwnedCopy`] buffers.

mod bridge;
mod buffer;
mod env;
mod gil;

pub mod config;
pub mod error;
pub mod profile;

pub use bridge::Bridge;
pub use buffer::OwnedCopy;
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use profile::{DataUpdateNaming, Op, Profile};

use std::sync::OnceLock;

use advbridge_config::tracing::{self as config_tracing, InitError};
use tracing::warn;

static TRACE_INIT: OnceLock<Result<(), InitError>> = OnceLock::new();

/// Ensures tracing has been initialised for the current process.
pub fn init_tracing() {
    let result = TRACE_INIT.get_or_init(|| match config_tracing::init_tracing() {
        Ok(()) => Ok(()),
        Err(InitError::AlreadyInitialised) => Ok(()),
        Err(err) => Err(err),
    });

    if let Err(err) = result {
        warn!("failed to initialise tracing subscriber: {err}");
    }
}
