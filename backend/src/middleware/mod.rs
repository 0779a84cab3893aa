//! Request middleware.
//!
//! Purpose: define middleware for request lifecycle concerns. Today that is
//! trace identifier propagation.

pub mod trace;

pub use trace::Trace;
