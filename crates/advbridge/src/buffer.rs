//! Buffer marshalling across the interpreter boundary.
//!
//! Host→interpreter is zero-copy: [`PyView`] wraps the payload in a
//! read-only `memoryview` whose lifetime is pinned to both the GIL token and
//! the host borrow, and which is explicitly released when the enclosing call
//! ends. Interpreter→host always copies: [`OwnedCopy`] duplicates the byte
//! payload before the transient handle is dropped, so the result never
//! aliases interpreter storage.

use std::marker::PhantomData;
use std::os::raw::c_char;

use pyo3::types::{PyAnyMethods, PyBytes, PyBytesMethods, PyTypeMethods};
use pyo3::{ffi, Bound, PyAny, PyResult, Python};

use crate::error::BridgeError;

/// Read-only interpreter view over a host-owned buffer.
///
/// The `'a` parameter ties the view to the host borrow, so the compiler
/// rejects any attempt to hand it out past the enclosing bridge call. On
/// drop the underlying `memoryview` is released; interpreter code that
/// stashed a reference gets a `ValueError` on later access instead of
/// reading freed host memory.
pub(crate) struct PyView<'py, 'a> {
    view: Bound<'py, PyAny>,
    _host: PhantomData<&'a [u8]>,
}

impl<'py, 'a> PyView<'py, 'a> {
    pub(crate) fn over(py: Python<'py>, data: &'a [u8]) -> PyResult<Self> {
        let raw = unsafe {
            ffi::PyMemoryView_FromMemory(
                data.as_ptr() as *mut c_char,
                data.len() as ffi::Py_ssize_t,
                ffi::PyBUF_READ,
            )
        };
        let view = unsafe { Bound::from_owned_ptr_or_err(py, raw)? };
        Ok(Self {
            view,
            _host: PhantomData,
        })
    }

    pub(crate) fn as_any(&self) -> &Bound<'py, PyAny> {
        &self.view
    }
}

impl Drop for PyView<'_, '_> {
    fn drop(&mut self) {
        // Invalidates the view even if the callee kept a reference.
        let _ = self.view.call_method0("release");
    }
}

/// A host-owned buffer, fully detached from interpreter storage.
///
/// Produced only by [`OwnedCopy::from_py`], which copies the payload while
/// the source object is still alive. The buffer stays valid across and
/// after environment teardown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedCopy {
    bytes: Box<[u8]>,
}

impl OwnedCopy {
    /// Copies the payload out of an interpreter `bytes` object.
    pub(crate) fn from_py(
        operation: &'static str,
        value: &Bound<'_, PyAny>,
        require_non_empty: bool,
    ) -> Result<Self, BridgeError> {
        let bytes = value
            .downcast::<PyBytes>()
            .map_err(|_| BridgeError::Conversion {
                operation,
                reason: format!("expected bytes, got `{}`", type_name(value)),
            })?;
        let payload = bytes.as_bytes();
        if require_non_empty && payload.is_empty() {
            return Err(BridgeError::Conversion {
                operation,
                reason: "empty result where a payload was required".into(),
            });
        }
        Ok(Self {
            bytes: payload.to_vec().into_boxed_slice(),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes.into_vec()
    }
}

impl std::ops::Deref for OwnedCopy {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for OwnedCopy {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

fn type_name(value: &Bound<'_, PyAny>) -> String {
    value
        .get_type()
        .name()
        .map(|name| name.to_string())
        .unwrap_or_else(|_| "<unknown>".into())
}
