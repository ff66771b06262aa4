pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod scoring;
pub mod storage;
