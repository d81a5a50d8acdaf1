// Snapshots, change detection and the host registry
pub mod state;

// Polling scheduler and event delivery
pub mod watch;

// Feed providers (LogMeIn RSS, saved documents)
pub mod feed;

// Configuration file and environment overrides
pub mod config;

// HTTP status API
pub mod api;
