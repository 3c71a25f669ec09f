// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that name the core
// concepts of the pipeline: tables, feature matrices, splits,
// lifecycle stages and the errors they can raise.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

// Raw and cleaned tables, and the numeric feature matrix
pub mod table;

// Train / validation / test partitions and lifecycle stages
pub mod split;

// Typed error taxonomy shared by every data-layer component
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
