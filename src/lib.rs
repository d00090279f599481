// src/lib.rs

//! Archive Crawler Library
//!
//! Searches YouTube for full-length concert and interview recordings,
//! filters and enriches the hits, and upserts them into a `VideoStore`.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
