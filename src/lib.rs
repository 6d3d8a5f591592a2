// src/lib.rs

//! Outage schedule monitor library.

pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
