//! Library crate for portprobe: port set construction, concurrent TCP probing,
//! banner capture and result export.
pub mod config;
pub mod error;
pub mod export;
pub mod ports;
pub mod probe;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod services;
pub mod types;
