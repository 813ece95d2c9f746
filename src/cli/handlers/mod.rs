// src/cli/handlers/mod.rs

pub mod bulk;
pub mod commons;
pub mod delete;
pub mod help;
pub mod info;
pub mod record;
pub mod refresh;
pub mod search;
pub mod settings;
