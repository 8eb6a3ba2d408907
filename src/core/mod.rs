// src/core/mod.rs — Evaluation pipeline core

pub mod playground;
pub mod prompt;
pub mod resolver;
pub mod run;
pub mod types;
pub mod verdict;
