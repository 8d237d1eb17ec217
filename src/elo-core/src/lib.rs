//! Elo Core Library
//!
//! This crate provides the pieces of the Elo client that do not touch the
//! network:
//! - Geohash encoding and radius-to-precision mapping
//! - Wire schema for node, edge and recommendation views
//! - Query builders for list, nearby and recommendation requests
//! - Client configuration

pub mod config;
pub mod geo;
pub mod models;

// Re-export commonly used types
pub use config::ClientConfig;
pub use geo::{encode_geohash, precision_for_km, GeoPoint, GeoPointError};
pub use models::*;
