//! Lazy product expressions and structural declarations.

pub mod product;
pub mod structure;

pub use product::{
    Product, SparseDenseProduct, decl_diag, decl_herm, decl_low, decl_sym, decl_upp, multiply,
};
pub use structure::{DeclFlags, Structure};
