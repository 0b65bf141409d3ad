//! Blocking and async pipelines between readers and writers.

#[cfg(feature = "async")]
pub mod r#async;
pub mod sync;
