pub mod assistant;
pub mod chat;
pub mod config;
pub mod platform;
pub mod session;
