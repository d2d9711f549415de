//! Shared helpers for integration tests: reference readers for the noisy KVP format.

pub mod reference;

#[allow(unused_imports)]
pub use reference::{split_plain, valid_pairs};
