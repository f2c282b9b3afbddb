pub mod config;
pub mod download;
pub mod extract;
pub mod http;
pub mod layout;
pub mod progress;
pub mod tasks;
