use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::geo::{encode_geohash, precision_for_km};

/// String-keyed, string-valued data carried by nodes and edges
pub type Data = HashMap<String, String>;

/// NodeView is a node as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: String,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub edges: Vec<EdgeView>,
}

/// EdgeView is an outgoing edge embedded in a NodeView
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub to: String,
    #[serde(default)]
    pub data: Data,
}

/// EdgeListResult is one record of an edge listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeListResult {
    #[serde(rename = "from")]
    pub from_id: String,
    #[serde(rename = "to")]
    pub to_id: String,
    #[serde(default)]
    pub data: Data,
}

/// Recommendation is a scored candidate node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub score: f64,
    pub data: Data,
}

/// PathResponse answers a path existence query
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PathResponse {
    #[serde(default)]
    pub exists: bool,
}

/// SchemaDefinition is the declared field list of one entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub entity: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// String-valued query parameters
pub type QueryParams = Vec<(&'static str, String)>;

fn push_opt(params: &mut QueryParams, key: &'static str, value: Option<impl ToString>) {
    if let Some(value) = value {
        params.push((key, value.to_string()));
    }
}

/// Filters for listing nodes
#[derive(Debug, Clone, Default)]
pub struct NodeQuery {
    pub node_type: Option<String>,
    pub hydrate: Option<bool>,
}

impl NodeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    pub fn hydrate(mut self, hydrate: bool) -> Self {
        self.hydrate = Some(hydrate);
        self
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        push_opt(&mut params, "type", self.node_type.as_ref());
        push_opt(&mut params, "hydrate", self.hydrate);
        params
    }
}

/// Filters for listing edges
#[derive(Debug, Clone, Default)]
pub struct EdgeQuery {
    pub edge_type: Option<String>,
    pub from_id: Option<String>,
    pub to_id: Option<String>,
    pub hydrate: Option<bool>,
}

impl EdgeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edge_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    pub fn from_id(mut self, from_id: impl Into<String>) -> Self {
        self.from_id = Some(from_id.into());
        self
    }

    pub fn to_id(mut self, to_id: impl Into<String>) -> Self {
        self.to_id = Some(to_id.into());
        self
    }

    pub fn hydrate(mut self, hydrate: bool) -> Self {
        self.hydrate = Some(hydrate);
        self
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        push_opt(&mut params, "type", self.edge_type.as_ref());
        push_opt(&mut params, "from", self.from_id.as_ref());
        push_opt(&mut params, "to", self.to_id.as_ref());
        push_opt(&mut params, "hydrate", self.hydrate);
        params
    }
}

/// Geohash-prefix proximity query
#[derive(Debug, Clone)]
pub struct NearbyQuery {
    pub node_type: String,
    pub geo_hash_prefix: String,
    pub geo_hash_key: Option<String>,
    pub limit: Option<usize>,
    pub hydrate: Option<bool>,
}

impl NearbyQuery {
    pub fn new(node_type: impl Into<String>, geo_hash_prefix: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            geo_hash_prefix: geo_hash_prefix.into(),
            geo_hash_key: None,
            limit: None,
            hydrate: None,
        }
    }

    /// Query the geohash cell around a point, sized for `radius_km`
    pub fn around(node_type: impl Into<String>, lat: f64, lon: f64, radius_km: f64) -> Self {
        let prefix = encode_geohash(lat, lon, precision_for_km(radius_km));
        Self::new(node_type, prefix)
    }

    pub fn geo_hash_key(mut self, key: impl Into<String>) -> Self {
        self.geo_hash_key = Some(key.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn hydrate(mut self, hydrate: bool) -> Self {
        self.hydrate = Some(hydrate);
        self
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = vec![
            ("type", self.node_type.clone()),
            ("geo_hash_prefix", self.geo_hash_prefix.clone()),
        ];
        push_opt(&mut params, "geo_hash_key", self.geo_hash_key.as_ref());
        push_opt(&mut params, "limit", self.limit);
        push_opt(&mut params, "hydrate", self.hydrate);
        params
    }
}

/// Score-ranked recommendation query starting from one node
#[derive(Debug, Clone)]
pub struct RecommendationQuery {
    pub start: String,
    pub node_type: String,
    pub num_key: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub limit: Option<usize>,
    pub geo_key: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
    pub hydrate: Option<bool>,
}

impl RecommendationQuery {
    pub fn new(start: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            node_type: node_type.into(),
            num_key: None,
            min: None,
            max: None,
            limit: None,
            geo_key: None,
            lat: None,
            lon: None,
            radius_km: None,
            hydrate: None,
        }
    }

    /// Restrict candidates to a numeric data field within [min, max]
    pub fn numeric_range(mut self, key: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        self.num_key = Some(key.into());
        self.min = min;
        self.max = max;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Restrict candidates to `radius_km` around a point
    pub fn near(mut self, lat: f64, lon: f64, radius_km: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self.radius_km = Some(radius_km);
        self
    }

    /// Data field holding each candidate's location
    pub fn geo_key(mut self, key: impl Into<String>) -> Self {
        self.geo_key = Some(key.into());
        self
    }

    pub fn hydrate(mut self, hydrate: bool) -> Self {
        self.hydrate = Some(hydrate);
        self
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = vec![("start", self.start.clone()), ("type", self.node_type.clone())];
        push_opt(&mut params, "num_key", self.num_key.as_ref());
        push_opt(&mut params, "min", self.min);
        push_opt(&mut params, "max", self.max);
        push_opt(&mut params, "limit", self.limit);
        push_opt(&mut params, "geo_key", self.geo_key.as_ref());
        push_opt(&mut params, "lat", self.lat);
        push_opt(&mut params, "lon", self.lon);
        push_opt(&mut params, "radius_km", self.radius_km);
        push_opt(&mut params, "hydrate", self.hydrate);
        params
    }
}
