//! spdmm: sparse (CSR) times dense matrix multiplication
//!
//! This crate evaluates `C op= A * B` for a row-major sparse `A` and a row-major dense `B`,
//! choosing between SIMD, unrolled and plain scalar kernels from the static properties of
//! the operands and the target, restricting work to the structurally nonzero part of triangular
//! and diagonal operands, and running large products across a rayon thread pool.

pub mod parallel;

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod expr;
pub mod kernel;
pub mod matrix;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use context::*;
pub use crate::core::*;
pub use error::*;
pub use expr::*;
pub use kernel::{AssignOp, KernelTier};
pub use matrix::*;
pub use utils::*;
