// src/models/mod.rs

pub mod article;
pub mod author;
pub mod comment;
