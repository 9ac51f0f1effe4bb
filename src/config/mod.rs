// src/config/mod.rs
//! Configuration system for passwault
//!
//! Central, lazy-loaded global config with TOML + env overrides.

pub use app::{load, Config, Features, KdfSettings, Keys, Paths};

mod app;
mod defaults;
