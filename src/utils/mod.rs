pub mod reference;
pub use reference::reference_product;
