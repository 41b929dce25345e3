//! Wardrobe job orchestration
//!
//! Submits server-executed AI generation jobs (headshots, body shots, outfit
//! renders, tagging), triggers their execution, and learns of completion by
//! polling the job store with backoff, a per-job circuit breaker, and
//! per-job poll deduplication.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod telemetry;
