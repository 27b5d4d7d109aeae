//! # Background Work Queue
//!
//! Fixed pool of worker threads executing boxed jobs and collecting
//! their results for the scheduler to drain once per update.
//!
//! ## Threading model
//!
//! - Jobs flow through an unbounded channel; workers race to receive.
//! - Results land in a mutex-guarded vector; `drain` takes the whole
//!   batch in one lock acquisition.
//! - `pending` counts submitted-but-undrained work, letting tests and
//!   shutdown paths wait for quiescence deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;

/// A boxed unit of background work.
type Job<R> = Box<dyn FnOnce() -> R + Send>;

/// Fixed-size worker pool with batched result collection.
pub struct WorkQueue<R> {
    /// Job submission side; dropped first on shutdown so workers see
    /// the channel close.
    jobs: Option<Sender<Job<R>>>,
    /// Finished results awaiting a drain.
    results: Arc<Mutex<Vec<R>>>,
    /// Jobs submitted but not yet drained.
    pending: Arc<AtomicUsize>,
    /// Worker threads, joined on drop.
    workers: Vec<JoinHandle<()>>,
}

impl<R: Send + 'static> WorkQueue<R> {
    /// Spawns a pool with the given number of workers (minimum one).
    #[must_use]
    pub fn new(workers: usize) -> Self {
        let (sender, receiver) = unbounded::<Job<R>>();
        let results = Arc::new(Mutex::new(Vec::new()));

        let handles = (0..workers.max(1))
            .map(|_| {
                let receiver = receiver.clone();
                let results = Arc::clone(&results);
                std::thread::spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        let result = job();
                        results.lock().push(result);
                    }
                })
            })
            .collect();

        Self {
            jobs: Some(sender),
            results,
            pending: Arc::new(AtomicUsize::new(0)),
            workers: handles,
        }
    }

    /// Submits a job for background execution.
    pub fn submit(&self, job: impl FnOnce() -> R + Send + 'static) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        if let Some(sender) = &self.jobs {
            if sender.send(Box::new(job)).is_ok() {
                return;
            }
        }
        // Shutdown already began; the job never ran.
        self.pending.fetch_sub(1, Ordering::AcqRel);
    }

    /// Takes every finished result, oldest first, and settles the
    /// pending count.
    #[must_use]
    pub fn drain(&self) -> Vec<R> {
        let batch = std::mem::take(&mut *self.results.lock());
        if !batch.is_empty() {
            self.pending.fetch_sub(batch.len(), Ordering::AcqRel);
        }
        batch
    }

    /// Number of jobs submitted but not yet drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

impl<R> Drop for WorkQueue<R> {
    fn drop(&mut self) {
        // Closing the channel lets every worker's recv() fail.
        self.jobs.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wait_for(queue: &WorkQueue<u32>, results: usize) -> Vec<u32> {
        let mut collected = Vec::new();
        for _ in 0..1000 {
            collected.extend(queue.drain());
            if collected.len() >= results {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        collected
    }

    #[test]
    fn test_jobs_produce_results() {
        let queue = WorkQueue::new(2);
        for i in 0..8_u32 {
            queue.submit(move || i * i);
        }
        let mut results = wait_for(&queue, 8);
        results.sort_unstable();
        assert_eq!(results, vec![0, 1, 4, 9, 16, 25, 36, 49]);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_pending_counts_undrained_work() {
        let queue = WorkQueue::new(1);
        queue.submit(|| 1);
        queue.submit(|| 2);
        assert!(queue.pending() >= 1);
        let results = wait_for(&queue, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_drop_joins_workers() {
        let queue = WorkQueue::new(4);
        queue.submit(|| 7);
        drop(queue);
    }
}
