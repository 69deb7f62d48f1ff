//! Bindings to the CRS recognition engine
//!
//! This crate wraps the engine's C interface (script identification,
//! language identification and OCR) behind the [`EngineApi`] trait, and
//! layers a lifecycle-safe [`Session`] / [`Document`] / [`Page`] API on top
//! so that callers cannot open overlapping contexts, call a phase after the
//! page was written, or leak the engine session on an error path.
//!
//! Backends:
//! - `native` feature: [`NativeEngine`], linked against `crs-api`.
//! - `mock` feature (default): [`MockEngine`], an in-memory stand-in that
//!   journals every call.

mod api;
mod error;
mod options;
mod session;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "native")]
mod native;

pub use api::{calls, CallResult, EngineApi, CRS_STRING_SIZE, MAX_TEXT_LEN};
pub use error::{check_status, EngineError, ErrorCode, Result};
pub use options::{NoiseFilter, OutputPaths, PageOptions};
pub use session::{Document, Page, Session};

#[cfg(feature = "mock")]
pub use mock::MockEngine;

#[cfg(feature = "native")]
pub use native::NativeEngine;
