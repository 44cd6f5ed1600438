// Core infrastructure modules
pub mod core;

// Feature-specific modules
pub mod cli;
pub mod command;
pub mod config;
pub mod exec;
pub mod postgres;
pub mod table;
