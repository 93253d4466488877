//! Clipledger library.
//!
//! A service that tracks user-submitted social-media clips pledged against
//! paid campaigns, periodically refreshes their engagement metrics from
//! platform APIs, aggregates per-campaign totals, and generates payouts when
//! a campaign reaches its spending cap.

pub mod audit;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod extractor;
pub mod reconciler;
pub mod status;
pub mod web;
