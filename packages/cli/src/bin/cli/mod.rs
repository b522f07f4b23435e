pub mod auth;
pub mod chat;
pub mod context;
pub mod format;
pub mod health;
pub mod sessions;
