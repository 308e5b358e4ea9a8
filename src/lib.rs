pub mod apply;
pub mod cli;
pub mod commands;
pub mod config;
pub mod editor;
pub mod env;
pub mod error;
pub mod menu;
pub mod output;
pub mod probe;
pub mod settings;
pub mod store;
pub mod telemetry;
pub mod tui;
