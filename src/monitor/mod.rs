// src/monitor/mod.rs
mod monitor;

pub use monitor::DependencyMonitor;
