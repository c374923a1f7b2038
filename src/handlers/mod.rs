// src/handlers/mod.rs

pub mod articles;
pub mod comments;
pub mod session;
