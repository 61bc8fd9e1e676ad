//! UK rail schedule server.
//!
//! Loads the full-snapshot schedule feed, follows the VSTP stream of
//! real-time amendments, and answers "which plan applies to this train on
//! this day?" by resolving overlays and cancellations at query time.

pub mod config;
pub mod domain;
pub mod feed;
pub mod ingest;
pub mod resolve;
pub mod store;
pub mod vstp;
pub mod web;
