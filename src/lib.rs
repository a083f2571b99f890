pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod response;
pub mod state;
pub mod storage;
pub mod users;
pub mod videos;
