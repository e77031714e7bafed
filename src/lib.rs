pub mod admin;
pub mod app;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod rewards;
pub mod seed;
pub mod state;
pub mod store;
pub mod visits;
