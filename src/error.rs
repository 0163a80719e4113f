//! Error taxonomy shared by every kernel.
//!
//! A kernel's return value pairs its result with one of these kinds. User
//! callbacks participate in the same scheme: any callback may return
//! [`Error::Callback`] (or any other kind) to abort the surrounding kernel,
//! and the first error observed on any lane is the one the caller sees.

use thiserror::Error;

/// Everything that can go wrong inside a kernel.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// An allocation-level resource was unavailable (for example, the lane
    /// pool could not be created).
    #[error("out of memory")]
    OutOfMemory,

    /// A user callback reported failure.
    #[error("callback failed: {0}")]
    Callback(String),

    /// The caller violated an API contract, e.g. an empty fold with no
    /// vacuous case, or a mutation mapping two distinct vertices to equal
    /// images.
    #[error("misuse: {0}")]
    Misuse(&'static str),

    /// The kill token was observed set; the kernel drained and stopped.
    #[error("killed")]
    Killed,

    /// Reported only by induction when its zone contains a cycle.
    #[error("zone contains a cycle")]
    Cyclic,

    /// A zone's initial vertex (or a looked-up key) is not in the graph.
    #[error("vertex not found")]
    VertexNotFound,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for failing out of a user callback.
///
/// ```
/// use trestle::{fail, Result};
///
/// fn half(n: u64) -> Result<u64> {
///     if n % 2 == 0 { Ok(n / 2) } else { fail("odd input") }
/// }
/// ```
pub fn fail<T>(reason: impl Into<String>) -> Result<T> {
    Err(Error::Callback(reason.into()))
}
