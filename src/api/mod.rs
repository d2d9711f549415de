//! Purpose: Define the public Rust API boundary for kvpgen.
//! Exports: Config types, the generation entry points, and the error model.
//! Role: Additive-only surface used by the CLI and by callers embedding the generator.
//! Invariants: Internal modules are reachable through `core` but not re-exported piecemeal here.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::config::{GeneratorConfig, LengthRange, Probabilities, RemainderPolicy, Syntax};
pub use crate::core::dictionary::{Dictionary, EntryKind};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::fixture::{Fixture, RunSummary, generate, generate_to_files};
pub use crate::core::noisy::NoisyStats;
