//! # redraw-error
//!
//! Unified error handling for redraw, modelled on OpenDAL's error practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: what went wrong (e.g. ConfigInvalid, RenderFailed)
//! - **ErrorStatus**: whether trying again could help (Permanent, Temporary, Persistent)
//! - **Error Context**: key/value pairs that locate the cause
//! - **Error Source**: underlying errors wrapped without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use redraw_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::RenderFailed, "svg has no root element")
//!         .with_operation("raster::rasterize")
//!         .with_context("iteration", "2"))
//! }
//! ```
//!
//! ## Principles
//!
//! - Fallible functions return `Result<T, redraw_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent layers only append context

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the redraw Error
pub type Result<T> = std::result::Result<T, Error>;
