pub mod config;
pub mod ir;
pub mod logging;
