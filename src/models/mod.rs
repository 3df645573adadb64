pub mod audio;
pub mod chat;
pub mod journal;
pub mod lesson;
pub mod mood;
pub mod tier;
pub mod user;
