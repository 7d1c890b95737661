//! Parallelism switch for worker-pool sized operations.
//!
//! The boundary accepts a caller-supplied thread count on every ingestion
//! and training call: 0 means "derive from available hardware", 1 forces
//! sequential execution, anything larger runs inside a bounded rayon pool
//! of exactly that many workers (see [`run_with_threads`]). Workers always
//! operate on disjoint row ranges, so the only synchronization is the
//! final join inside rayon.

use rayon::prelude::*;

/// Whether parallel execution is allowed for one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread-count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Run `f` over an iterator, in parallel when allowed.
    ///
    /// Uses a parallel bridge so iterators that do not implement
    /// `IntoParallelIterator` (like `axis_chunks_iter_mut`) still fan out.
    #[inline]
    pub fn maybe_par_bridge_for_each<T, I, F>(self, iter: I, f: F)
    where
        T: Send,
        I: Iterator<Item = T> + Send,
        F: Fn(T) + Sync + Send,
    {
        if self.is_parallel() {
            iter.par_bridge().for_each(f);
        } else {
            iter.for_each(f);
        }
    }
}

/// Run a closure inside a worker pool sized by the thread count.
///
/// - `0` = auto (the global pool, all available cores)
/// - `1` = sequential, on the calling thread
/// - `n > 1` = a bounded pool of exactly `n` workers
#[inline]
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> T {
    match Parallelism::from_threads(n_threads) {
        Parallelism::Sequential => f(Parallelism::Sequential),
        Parallelism::Parallel if n_threads == 0 => f(Parallelism::Parallel),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()
                .expect("Failed to create thread pool");
            pool.install(|| f(Parallelism::Parallel))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_thread_is_sequential() {
        assert_eq!(Parallelism::from_threads(1), Parallelism::Sequential);
        assert!(Parallelism::from_threads(8).is_parallel());
    }

    #[test]
    fn run_with_threads_bounds_the_pool() {
        assert_eq!(run_with_threads(1, |par| par), Parallelism::Sequential);
        let workers = run_with_threads(2, |par| {
            assert!(par.is_parallel());
            rayon::current_num_threads()
        });
        assert_eq!(workers, 2);
    }

    #[test]
    fn bridge_visits_every_item() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let count = AtomicUsize::new(0);
        Parallelism::Parallel.maybe_par_bridge_for_each(0..100, |_| {
            count.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(count.load(Ordering::Relaxed), 100);
    }
}
