// src/models/mod.rs

pub mod achievement;
pub mod contact;
pub mod product;
pub mod progress;
pub mod task;
pub mod test_result;
pub mod user;
