pub mod api;
pub mod cli;
pub mod config;
pub mod display;
pub mod errors;
pub mod functions;
pub mod structs;
pub mod utils;
