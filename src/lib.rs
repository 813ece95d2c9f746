include!(concat!(env!("OUT_DIR"), "/messages.rs"));

pub mod cli;
pub mod constants;
pub mod core;
pub mod dictionaries;
pub mod models;
pub mod state;
pub mod system;
