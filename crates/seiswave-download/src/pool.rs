//! Bounded worker pool.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;

use crate::RunError;

/// Runs a batch of independent tasks with at most `size` in flight.
///
/// Each item is processed on its own tokio task. Results are returned in
/// submission order regardless of completion order. With `size == 1` items
/// are processed strictly one after another in list order.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    size: usize,
    progress: ProgressBar,
}

impl WorkerPool {
    /// Creates a pool running up to `size` tasks at once (minimum 1).
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            progress: ProgressBar::hidden(),
        }
    }

    /// Reports completed tasks on the given progress bar.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the maximum number of concurrent tasks.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Processes every item and blocks until all tasks have finished.
    ///
    /// # Errors
    ///
    /// Returns an error if a task panicked. The remaining tasks still run to
    /// completion first.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, task: F) -> Result<Vec<R>, RunError>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let total = items.len();
        self.progress.set_length(total as u64);
        self.progress.set_position(0);

        let task = Arc::new(task);
        let mut results: Vec<(usize, Result<R, tokio::task::JoinError>)> =
            stream::iter(items.into_iter().enumerate())
                .map(|(idx, item)| {
                    let task = Arc::clone(&task);
                    let progress = self.progress.clone();
                    async move {
                        let result = tokio::spawn(async move { task(item).await }).await;
                        progress.inc(1);
                        (idx, result)
                    }
                })
                .buffer_unordered(self.size)
                .collect()
                .await;

        self.progress.finish();
        results.sort_by_key(|(idx, _)| *idx);

        results
            .into_iter()
            .map(|(_, result)| result.map_err(|e| RunError::Worker(e.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_in_submission_order() {
        let pool = WorkerPool::new(4);
        let results = pool
            .run((0..8u64).collect(), |n| async move {
                // Later items finish first
                tokio::time::sleep(Duration::from_millis(40 - n * 5)).await;
                n * 10
            })
            .await
            .unwrap();

        assert_eq!(results, vec![0, 10, 20, 30, 40, 50, 60, 70]);
    }

    #[tokio::test]
    async fn test_size_one_is_sequential() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicUsize::new(0));

        let pool = WorkerPool::new(1);
        let log = Arc::clone(&order);
        let active = Arc::clone(&running);
        pool.run(vec!["a", "b", "c"], move |item| {
            let log = Arc::clone(&log);
            let active = Arc::clone(&active);
            async move {
                assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                tokio::time::sleep(Duration::from_millis(5)).await;
                log.lock().unwrap().push(item);
                active.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await
        .unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (active, max) = (Arc::clone(&running), Arc::clone(&peak));
        WorkerPool::new(3)
            .run((0..12).collect::<Vec<u32>>(), move |_| {
                let (active, max) = (Arc::clone(&active), Arc::clone(&max));
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    max.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .await
            .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_progress_counts_completions() {
        let progress = ProgressBar::hidden();
        WorkerPool::new(2)
            .with_progress(progress.clone())
            .run(vec![1, 2, 3], |n| async move { n })
            .await
            .unwrap();

        assert_eq!(progress.position(), 3);
        assert_eq!(progress.length(), Some(3));
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported() {
        let err = WorkerPool::new(2)
            .run(vec![1, 2], |n| async move {
                assert_ne!(n, 2, "boom");
                n
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Worker(_)));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let results: Vec<u8> = WorkerPool::new(4).run(Vec::new(), |n: u8| async move { n }).await.unwrap();
        assert!(results.is_empty());
    }
}
