// Core modules: character classes, record generation, serialization, errors.
pub mod canonical;
pub mod charset;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod fixture;
pub mod noisy;
pub mod parallel;
pub mod rng;
