pub mod engine;
pub mod execution;
pub mod models;
pub mod namespace;
pub mod pipeline;
pub mod registry;
pub mod runner;
pub mod tasks;
