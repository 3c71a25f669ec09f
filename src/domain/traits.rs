// ============================================================
// Layer 3: Core Traits (Abstractions)
// ============================================================
// The training framework never inherits from the data module.
// Instead it calls a small capability contract:
//
//   prepare → setup(stage) → {train,val,test}_source
//
// and the data module implements that contract. Where the
// table comes from is hidden behind TableSource, so the
// module only ever sees a RawTable.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Object Oriented Patterns)

use crate::domain::error::DataResult;
use crate::domain::split::Stage;
use crate::domain::table::RawTable;

// ─── TableSource ──────────────────────────────────────────────────────────────
/// Any component that can produce the raw input table.
///
/// Implementations:
///   - CsvTableLoader → reads a delimited file with a header row
pub trait TableSource {
    /// Read the whole table. Called at most once per data module.
    fn load(&self) -> DataResult<RawTable>;
}

// ─── ForecastDataSource ───────────────────────────────────────────────────────
/// Lifecycle contract a training loop drives.
///
/// `Loader` is whatever batch iterator the implementation hands
/// out; the domain layer stays free of tensor types.
pub trait ForecastDataSource {
    type Loader;

    /// Fetch the raw data. Idempotent.
    fn prepare(&mut self) -> DataResult<()>;

    /// Build the splits for `stage` (`None` = every stage).
    /// Repeated calls for a stage that is already built are no-ops.
    fn setup(&mut self, stage: Option<Stage>) -> DataResult<()>;

    fn train_source(&self) -> DataResult<Self::Loader>;

    fn val_source(&self) -> DataResult<Self::Loader>;

    fn test_source(&self) -> DataResult<Self::Loader>;
}
