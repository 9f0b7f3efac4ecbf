//! Bridge between the egui thread and the async order board worker.

pub mod commands;
pub mod runtime;
