// src/lib.rs

//! bookrank: collects tech articles, detects the books they cite and ranks
//! those books by reader engagement.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
