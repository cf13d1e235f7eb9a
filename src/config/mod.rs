pub mod options;
pub use options::{DEFAULT_COLUMN_BLOCK, DEFAULT_SMP_THRESHOLD, MultOptions};
