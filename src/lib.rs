pub mod config;
pub mod job;
pub mod metrics;
pub mod scheduler;
pub mod server;
pub mod telemetry;
