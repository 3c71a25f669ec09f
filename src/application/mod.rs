// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each:
//
//   prepare_use_case.rs: run the full pipeline once, walk every
//                       loader, save config / scaler / summary
//   inspect_use_case.rs: rebuild the saved pipeline and show a
//                       single window of one split
//
// Rules for this layer:
//   - No data math here (that's Layer 4)
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// Backend the batches are materialised on. CPU is plenty for
/// shaping data; a training loop can swap in its own.
pub type PipelineBackend = burn::backend::NdArray;

/// The full prepare workflow
pub mod prepare_use_case;

/// Single-window inspection against saved artifacts
pub mod inspect_use_case;
