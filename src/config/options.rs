//! Runtime options for sparse-dense multiplication.
//!
//! This module provides the `MultOptions` struct, which controls kernel selection
//! (optimized kernels on/off, column blocking for column-major targets) and the
//! shared-memory parallel path (threshold and thread count).

/// Number of result elements from which the parallel path is considered (70x70).
pub const DEFAULT_SMP_THRESHOLD: usize = 4900;

/// Column block width used by the default kernel on column-major targets.
pub const DEFAULT_COLUMN_BLOCK: usize = 64;

/// Kernel and parallelism parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultOptions {
    /// Allow the unrolled and SIMD kernels (false forces the default kernel)
    pub optimized_kernels: bool,

    /// Minimum `rows * cols` of the result before running in parallel
    pub smp_threshold: usize,

    /// Enable the rayon path (ignored without the `rayon` feature)
    pub parallel: bool,

    /// Worker threads; `None` uses every available CPU
    pub threads: Option<usize>,

    /// Column block width for column-major targets
    pub column_block: usize,
}

impl Default for MultOptions {
    fn default() -> Self {
        Self {
            optimized_kernels: true,
            smp_threshold: DEFAULT_SMP_THRESHOLD,
            parallel: cfg!(feature = "rayon"),
            threads: None,
            column_block: DEFAULT_COLUMN_BLOCK,
        }
    }
}

impl MultOptions {
    /// Options that never leave the calling thread.
    pub fn serial() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn with_optimized_kernels(mut self, enabled: bool) -> Self {
        self.optimized_kernels = enabled;
        self
    }

    pub fn with_smp_threshold(mut self, threshold: usize) -> Self {
        self.smp_threshold = threshold;
        self
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    /// Column block width; clamped to at least one column.
    pub fn with_column_block(mut self, width: usize) -> Self {
        self.column_block = width.max(1);
        self
    }

    /// Whether the parallel path can be taken at all in this build.
    pub fn smp_enabled(&self) -> bool {
        cfg!(feature = "rayon") && self.parallel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_threshold_constants() {
        let opts = MultOptions::default();
        assert!(opts.optimized_kernels);
        assert_eq!(opts.smp_threshold, 4900);
        assert_eq!(opts.column_block, 64);
        assert_eq!(opts.threads, None);
    }

    #[test]
    fn setters_clamp_degenerate_values() {
        let opts = MultOptions::serial().with_column_block(0).with_threads(0);
        assert!(!opts.smp_enabled());
        assert_eq!(opts.column_block, 1);
        assert_eq!(opts.threads, Some(1));
    }
}
