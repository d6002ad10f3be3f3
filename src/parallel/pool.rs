//! Rayon thread pool sizing for build search.
//!
//! [WorkerPool::install] runs a closure on a dedicated pool of the configured size, or on
//! Rayon's global pool when the size is 0.

use rayon::ThreadPoolBuilder;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    /// Worker thread count. 0 means Rayon's default (one per core).
    pub workers: usize,
}

impl WorkerPool {
    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }

    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(f),
            Err(error) => {
                warn!(workers = self.workers, %error, "thread pool unavailable, using global pool");
                f()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rayon::prelude::*;

    use super::WorkerPool;

    #[test]
    fn sized_pool_runs_closure() {
        let pool = WorkerPool::with_workers(2);
        let threads = pool.install(rayon::current_num_threads);
        assert_eq!(threads, 2);
        let total: u64 = pool.install(|| (1..=10u64).into_par_iter().sum());
        assert_eq!(total, 55);
    }

    #[test]
    fn zero_workers_uses_global_pool() {
        let total: u64 = WorkerPool::default().install(|| (1..=4u64).into_par_iter().sum());
        assert_eq!(total, 10);
    }
}
