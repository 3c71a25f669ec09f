// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong to the data
// pipeline itself:
//
//   artifacts.rs: Saving and loading run artifacts
//                  Writes the DataModuleConfig, the fitted
//                  scaler parameters and a per-split summary
//                  as JSON, so `inspect` can rebuild the same
//                  pipeline that `prepare` ran.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Config, scaler and split summary persistence
pub mod artifacts;
