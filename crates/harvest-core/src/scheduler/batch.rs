//! Fixed-size fan-out/fan-in over an ordered work list.

use anyhow::Result;
use std::future::Future;

#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    batch_size: usize,
}

impl BatchScheduler {
    /// A batch size of 0 is treated as 1.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Contiguous, order-preserving batches of at most `batch_size` items.
    pub fn batches<'a, T>(&self, items: &'a [T]) -> std::slice::Chunks<'a, T> {
        items.chunks(self.batch_size)
    }

    /// Number of batches `len` items split into.
    pub fn batch_count(&self, len: usize) -> usize {
        len.div_ceil(self.batch_size)
    }

    /// Run `handler` for every item of `batch` concurrently and wait for all of
    /// them. One item's failure is just its outcome; siblings still complete.
    /// Results come back in input order. Fails only if a handler task panicked.
    pub async fn run_batch<T, R, F, Fut>(&self, batch: &[T], handler: F) -> Result<Vec<(T, R)>>
    where
        T: Clone + Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
    {
        let mut join_set = tokio::task::JoinSet::new();
        for (index, item) in batch.iter().cloned().enumerate() {
            let fut = handler(item);
            join_set.spawn(async move { (index, fut.await) });
        }

        let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(batch.len()).collect();
        while let Some(res) = join_set.join_next().await {
            let (index, outcome) = res.map_err(|e| anyhow::anyhow!("batch task join: {}", e))?;
            slots[index] = Some(outcome);
        }

        batch
            .iter()
            .cloned()
            .zip(slots)
            .map(|(item, slot)| {
                slot.map(|r| (item, r))
                    .ok_or_else(|| anyhow::anyhow!("batch task produced no outcome"))
            })
            .collect()
    }
}
