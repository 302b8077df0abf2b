// src/content/providers/mod.rs
//! Strategies that take part in the automatic chain.
pub mod direct;
pub mod managed_fn;
