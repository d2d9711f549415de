//! Purpose: Library crate behind the `kvpgen` CLI: noisy KVP fixtures plus canonical JSON.
//! Exports: `core` (generation internals) and `api` (the supported surface).
//! Role: Shared by the binary and integration tests.
//! Invariants: No global state; every run is described by a `GeneratorConfig`.
//! Invariants: Output is a pure function of config and seed.
pub mod api;
pub mod core;
