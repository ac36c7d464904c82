// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// The four error kinds produced by the core.
///
/// `Unknown` is never constructed by this crate; it exists so that an
/// adapter sitting on top of the core (e.g. a C FFI boundary forwarding
/// errors from an external image codec) can represent into the same
/// taxonomy without inventing a fifth kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Ok,
    BadAlloc,
    InvalidArgument,
    Runtime,
    Unknown,
}

/// The error type returned by every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A null buffer, a zero dimension, a negative sigma, an unknown
    /// colour-space code, or any other argument that violates an
    /// operation's preconditions. The operation performs no writes.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A transient buffer (FFT scratch space, label array, ...) could
    /// not be allocated.
    #[error("allocation failed: {0}")]
    BadAlloc(String),

    /// A numerical pathology unreachable through normal inputs, such as
    /// a singular matrix while building Savitzky-Golay coefficients.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::BadAlloc(_) => ErrorKind::BadAlloc,
            Error::Runtime(_) => ErrorKind::Runtime,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn alloc(msg: impl Into<String>) -> Self {
        Error::BadAlloc(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Error::Runtime(msg.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

pub(crate) fn try_vec_with_capacity<T: Clone>(len: usize, fill: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| Error::alloc(format!("failed to reserve {len} elements: {e}")))?;
    v.resize(len, fill);
    Ok(v)
}
