//! Context module: evaluation of product expressions into targets.
//!
//! Modules:
//! - [`mult_context`]: the `MultContext` dispatcher and the `Target` trait.

pub mod mult_context;
pub use mult_context::{MultContext, Target};
