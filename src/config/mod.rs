// src/config/mod.rs
//! Runtime configuration (TOML file + env overrides).

pub mod engine;

pub use engine::{
    EngineConfig, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH, ENV_MIN_MERGE_SIMILARITY,
    ENV_SIMILARITY_THRESHOLD,
};
