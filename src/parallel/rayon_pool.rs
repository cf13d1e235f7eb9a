// rayon-based thread pool for the parallel kernels

use crate::error::MatError;

/// Dedicated rayon pool; without one the global rayon pool is used.
#[derive(Debug)]
pub struct RayonPool {
    pool: rayon::ThreadPool,
}

impl RayonPool {
    pub fn new(threads: usize) -> Result<Self, MatError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("spdmm-worker-{i}"))
            .build()
            .map_err(|e| MatError::ThreadPool(e.to_string()))?;
        Ok(Self { pool })
    }

    /// One worker per logical CPU.
    pub fn with_available_cpus() -> Result<Self, MatError> {
        Self::new(num_cpus::get())
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        self.pool.install(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_reports_thread_count() {
        let pool = RayonPool::new(3).unwrap();
        assert_eq!(pool.num_threads(), 3);
        assert_eq!(pool.install(|| rayon::current_num_threads()), 3);
    }
}
