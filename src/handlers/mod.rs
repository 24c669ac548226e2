// src/handlers/mod.rs

pub mod achievements;
pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod profile;
pub mod progress;
pub mod search;
pub mod social;
pub mod system;
pub mod tasks;
