pub mod audio;
pub mod auth;
pub mod billing;
pub mod chat;
pub mod health;
pub mod journal;
pub mod lessons;
pub mod mood;
