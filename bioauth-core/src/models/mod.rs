pub mod config;
pub mod device;
pub mod error;
pub mod identity;
pub mod match_result;
pub mod sample;
