pub mod auth;
pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod types;

pub use context::AppContext;
pub use handlers::app;
