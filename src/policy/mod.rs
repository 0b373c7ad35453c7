//! Call policies composed around a single chat attempt
//!
//! Retry bounds the number of sequential attempts; the deadline bounds the
//! wall-clock time of the whole logical call. Either can be used alone.

pub mod deadline;
pub mod retry;

pub use deadline::{Deadline, DEFAULT_DEADLINE};
pub use retry::{RetryPolicy, Retrying, DEFAULT_MAX_ATTEMPTS};
