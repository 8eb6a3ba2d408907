// src/lib.rs — Library root for Gavel

pub mod cli;
pub mod core;
pub mod infra;
pub mod provider;
pub mod store;
