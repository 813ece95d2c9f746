// src/core/mod.rs

pub mod color;
pub mod config_loader;
pub mod flags;
pub mod hide;
pub mod paths;
pub mod pipeline;
pub mod query;
pub mod render;
pub mod selection;
pub mod wrap;
