//! Elo Client Library
//!
//! Blocking HTTP client for the Elo graph database, plus a typed entity
//! layer that maps domain objects onto string-keyed nodes.

mod client;
mod error;
pub mod orm;
pub mod session;

pub use client::{Client, API_KEY_HEADER};
pub use error::{classify, ClientError, Result};
pub use elo_core::{
    encode_geohash, precision_for_km, ClientConfig, Data, EdgeListResult, EdgeQuery, EdgeView,
    GeoPoint, GeoPointError, NearbyQuery, NodeQuery, NodeView, Recommendation,
    RecommendationQuery, SchemaDefinition,
};
pub use orm::{EntityMeta, EntityType, FieldValue, Fields, Node};

/// Re-exported for raw [`Client::request`] calls
pub use reqwest::Method;
