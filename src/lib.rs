pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod recipes;
pub mod state;
pub mod storage;
