// ============================================================
// Layer 4: Sequence Loader
// ============================================================
// Walks any Dataset<WindowSample> in index order and hands out
// one SequenceBatch per `batch_size` windows.
//
//   windows: 0 1 2 3 4 5 6 7 8 9      (batch_size = 4)
//   batches: [0 1 2 3] [4 5 6 7] [8 9]
//
// No shuffling: neighbouring batches stay neighbouring in time.
//
// Parallel prefetch (num_workers > 0):
//   The iterator keeps a look-ahead buffer of up to num_workers
//   batches. When it runs dry, the next num_workers batches are
//   built concurrently on a dedicated rayon pool and collected
//   back IN INDEX ORDER, so the sequence of batches is identical
//   to the single-threaded one. Workers only read the shared
//   dataset. A window the dataset cannot produce turns its
//   whole batch into an Err in that batch's slot; the batches
//   around it are unaffected. A panic in a worker resurfaces
//   on the caller.
//
// Reference: Burn Book §4 (DataLoader)
//            rayon crate documentation (ThreadPool::install)

use std::collections::VecDeque;
use std::sync::Arc;

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    prelude::*,
};
use rayon::prelude::*;

use crate::data::batcher::{SequenceBatch, SequenceBatcher};
use crate::data::dataset::{WindowSample, WindowedDataset};
use crate::domain::error::{DataError, DataResult};

pub struct SequenceLoader<B: Backend, D = WindowedDataset> {
    dataset:    Arc<D>,
    batcher:    SequenceBatcher<B>,
    batch_size: usize,
    pool:       Option<Arc<rayon::ThreadPool>>,
    lookahead:  usize,
}

impl<B: Backend, D: Dataset<WindowSample>> SequenceLoader<B, D> {
    pub fn new(
        dataset:     D,
        batcher:     SequenceBatcher<B>,
        batch_size:  usize,
        num_workers: usize,
    ) -> DataResult<Self> {
        if batch_size == 0 {
            return Err(DataError::InvalidConfiguration("batch_size must be at least 1".into()));
        }

        let pool = if num_workers > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(num_workers)
                .thread_name(|i| format!("seq-prefetch-{i}"))
                .build()
                .map_err(|e| {
                    DataError::InvalidConfiguration(format!(
                        "cannot start {num_workers} prefetch workers: {e}"
                    ))
                })?;
            Some(Arc::new(pool))
        } else {
            None
        };

        Ok(Self {
            dataset: Arc::new(dataset),
            batcher,
            batch_size,
            pool,
            lookahead: num_workers.max(1),
        })
    }

    /// Total windows per pass.
    pub fn num_items(&self) -> usize {
        self.dataset.len()
    }

    /// Batches per pass; the last one may be short.
    pub fn num_batches(&self) -> usize {
        self.num_items().div_ceil(self.batch_size)
    }

    /// One pass over the dataset.
    pub fn iter(&self) -> SequenceLoaderIter<'_, B, D> {
        SequenceLoaderIter {
            loader:     self,
            next_batch: 0,
            buffer:     VecDeque::with_capacity(self.lookahead),
        }
    }

    fn load_batch(&self, batch: usize) -> DataResult<SequenceBatch<B>> {
        let start = batch * self.batch_size;
        let end   = (start + self.batch_size).min(self.num_items());

        let len   = self.num_items();
        let items = (start..end)
            .map(|index| {
                self.dataset
                    .get(index)
                    .ok_or(DataError::IndexOutOfRange { index, len })
            })
            .collect::<DataResult<Vec<_>>>()?;

        Ok(self.batcher.batch(items))
    }
}

pub struct SequenceLoaderIter<'a, B: Backend, D> {
    loader:     &'a SequenceLoader<B, D>,
    next_batch: usize,
    buffer:     VecDeque<DataResult<SequenceBatch<B>>>,
}

impl<B: Backend, D: Dataset<WindowSample>> SequenceLoaderIter<'_, B, D> {
    fn refill(&mut self) {
        let loader = self.loader;
        let range  = self.next_batch..(self.next_batch + loader.lookahead).min(loader.num_batches());
        self.next_batch = range.end;

        let batches: Vec<DataResult<SequenceBatch<B>>> = match &loader.pool {
            // Indexed parallel collect keeps batch order
            Some(pool) => pool.install(|| {
                range.into_par_iter().map(|b| loader.load_batch(b)).collect()
            }),
            None => range.map(|b| loader.load_batch(b)).collect(),
        };

        self.buffer.extend(batches);
    }
}

impl<B: Backend, D: Dataset<WindowSample>> Iterator for SequenceLoaderIter<'_, B, D> {
    type Item = DataResult<SequenceBatch<B>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && self.next_batch < self.loader.num_batches() {
            self.refill();
        }
        self.buffer.pop_front()
    }
}
