// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything from the CSV file on disk to tensor batches.
//
// The pipeline flows in this order:
//
//   daily mortality CSV
//       │
//       ▼
//   CsvTableLoader     → parses dates, marks missing cells
//       │
//       ▼
//   Preprocessor       → sort, prune columns, drop incomplete
//       │                rows, derive next-day target
//       ▼
//   SplitRanges        → train / validation / test in time order
//       │
//       ▼
//   StandardScaler     → fitted on train, applied to all splits
//       │
//       ▼
//   WindowedDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   SequenceBatcher    → stacks windows into [N, seq_len, F]
//       │
//       ▼
//   SequenceLoader     → ordered batches, optional prefetch
//
// ForecastDataModule wires the steps together and caches the
// results per lifecycle stage.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads the source CSV into a RawTable
pub mod loader;

/// Sorts, prunes and parses the raw table; derives targets
pub mod preprocessor;

/// Chronological train / validation / test ranges
pub mod splitter;

/// Per-column standardisation fitted on train
pub mod scaler;

/// Implements Burn's Dataset trait over sliding windows
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Ordered batch iterator with parallel prefetch
pub mod dataloader;

/// Lifecycle owner: prepare, setup(stage), per-split loaders
pub mod module;
