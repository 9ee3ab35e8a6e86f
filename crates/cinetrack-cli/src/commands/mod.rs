pub mod browse;
pub mod clear;
pub mod community;
pub mod config;
pub mod context;
pub mod library;
pub mod session;
