//! 基础设施层

pub mod config;
#[cfg(feature = "database")]
pub mod database;
pub mod logger;
pub mod store;
