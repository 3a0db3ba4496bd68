pub mod cache;
pub mod config;
pub mod engine;
pub mod fixtures;
pub mod ingest;
pub mod read_model;
pub mod server;

mod handlers;
mod http_types;
mod server_state;
mod validation;
