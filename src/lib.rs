pub mod api;
pub mod catalog;
pub mod config;
pub mod manifest;
pub mod observability;
pub mod resolver;
pub mod teams;
pub mod thumbnail;
