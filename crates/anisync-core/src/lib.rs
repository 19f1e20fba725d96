pub mod config;
pub mod decision;
pub mod error;
pub mod matcher;
pub mod models;
pub mod orchestrator;
pub mod relations;

#[cfg(test)]
mod testing;
