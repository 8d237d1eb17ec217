//! Typed entities over the string-keyed node model
//!
//! A [`Node<T>`] holds an id and a data map whose values are already in
//! canonical string form. `T` is a marker type implementing [`EntityType`],
//! which supplies the node-type tag and geo field names for that kind of
//! entity.
//!
//! ```rust,no_run
//! use elo_rs::orm::{EntityMeta, EntityType, Node};
//! use elo_rs::{fields, GeoPoint};
//!
//! struct Team;
//!
//! impl EntityType for Team {
//!     const META: EntityMeta = EntityMeta::new().node_type("Team");
//! }
//!
//! fn main() -> elo_rs::Result<()> {
//!     elo_rs::session::setup(&elo_rs::ClientConfig::new("http://127.0.0.1:3000"))?;
//!
//!     let mut team = Node::<Team>::new(
//!         "fla",
//!         fields! { "city" => "Rio", "location" => GeoPoint::new(-22.9068, -43.1729) },
//!     );
//!     team.save()?;
//!
//!     let nearby = Node::<Team>::find_near(-22.9068, -43.1729, 10.0, None)?;
//!     println!("{} teams nearby", nearby.len());
//!     Ok(())
//! }
//! ```

use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::session;
use elo_core::geo::DEFAULT_PRECISION;
use elo_core::{encode_geohash, Data, GeoPoint, NearbyQuery, NodeView};
use std::fmt;
use std::marker::PhantomData;

/// Conversion of a field value into the server's string form
pub trait FieldValue {
    fn to_canonical(&self) -> String;
}

impl FieldValue for str {
    fn to_canonical(&self) -> String {
        self.to_string()
    }
}

impl FieldValue for String {
    fn to_canonical(&self) -> String {
        self.clone()
    }
}

impl<T: FieldValue + ?Sized> FieldValue for &T {
    fn to_canonical(&self) -> String {
        (**self).to_canonical()
    }
}

impl FieldValue for GeoPoint {
    fn to_canonical(&self) -> String {
        self.to_string()
    }
}

macro_rules! display_field_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn to_canonical(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_field_value!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// Field map with values already converted to canonical strings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Data);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl FieldValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl FieldValue) {
        self.0.insert(key.into(), value.to_canonical());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_data(self) -> Data {
        self.0
    }
}

impl<K: Into<String>, V: FieldValue> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}

/// Build [`Fields`] from `key => value` pairs of mixed value types
#[macro_export]
macro_rules! fields {
    () => {
        $crate::orm::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::orm::Fields::new()$(.set($key, $value))+
    };
}

/// Static configuration of one entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityMeta {
    /// Injected as the `type` field on save when the payload has none
    pub node_type: Option<&'static str>,
    /// Data field holding a `"lat,lon"` point
    pub geo_key: &'static str,
    /// Data field holding the geohash derived from `geo_key`
    pub geo_hash_key: &'static str,
    /// Field list registered by `register_schema`
    pub schema_fields: Option<&'static [&'static str]>,
}

impl EntityMeta {
    pub const fn new() -> Self {
        Self {
            node_type: None,
            geo_key: "location",
            geo_hash_key: "geo_hash",
            schema_fields: None,
        }
    }

    pub const fn node_type(self, node_type: &'static str) -> Self {
        Self {
            node_type: Some(node_type),
            ..self
        }
    }

    pub const fn geo_key(self, geo_key: &'static str) -> Self {
        Self { geo_key, ..self }
    }

    pub const fn geo_hash_key(self, geo_hash_key: &'static str) -> Self {
        Self {
            geo_hash_key,
            ..self
        }
    }

    pub const fn schema_fields(self, fields: &'static [&'static str]) -> Self {
        Self {
            schema_fields: Some(fields),
            ..self
        }
    }

    fn configured_node_type(&self) -> Option<&'static str> {
        self.node_type.filter(|t| !t.is_empty())
    }

    /// Add the geohash field when it is missing and the geo field parses
    fn ensure_geo_hash(&self, data: &mut Data) {
        if data.contains_key(self.geo_hash_key) {
            return;
        }
        let Some(point) = data
            .get(self.geo_key)
            .and_then(|value| value.parse::<GeoPoint>().ok())
        else {
            return;
        };
        data.insert(
            self.geo_hash_key.to_string(),
            encode_geohash(point.lat, point.lon, DEFAULT_PRECISION),
        );
    }

    fn prepare(&self, fields: Fields) -> Data {
        let mut data = fields.into_data();
        self.ensure_geo_hash(&mut data);
        data
    }
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self::new()
    }
}

const SCHEMA_ENTITY: &str = "node";

/// Marker for a kind of entity stored as nodes
pub trait EntityType {
    const META: EntityMeta;
}

/// A typed node. The id is always chosen by the caller.
pub struct Node<T> {
    id: String,
    data: Data,
    entity: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("data", &self.data)
            .finish()
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            data: self.data.clone(),
            entity: PhantomData,
        }
    }
}

impl<T> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.data == other.data
    }
}

impl<T: EntityType> Node<T> {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            data: T::META.prepare(fields),
            entity: PhantomData,
        }
    }

    /// Rebuild an entity from a server record, re-reading the geo field as a
    /// point when it parses and keeping the raw string otherwise
    pub fn from_view(view: NodeView) -> Self {
        let geo_key = T::META.geo_key;
        let mut fields = Fields::new();
        for (key, value) in view.data {
            if key == geo_key {
                if let Ok(point) = value.parse::<GeoPoint>() {
                    fields.insert(key, point);
                    continue;
                }
            }
            fields.insert(key, value);
        }
        Self::new(view.id, fields)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// The configured geo field, when present and well-formed
    pub fn geo_point(&self) -> Option<GeoPoint> {
        self.get(T::META.geo_key)?.parse().ok()
    }

    pub fn into_data(self) -> Data {
        self.data
    }

    /// Create this node using the session client
    pub fn save(&mut self) -> Result<()> {
        self.save_with(session::client()?)
    }

    #[tracing::instrument(skip(self, client), fields(id = %self.id))]
    pub fn save_with(&mut self, client: &Client) -> Result<()> {
        let meta = T::META;
        let mut payload = self.data.clone();
        if let Some(node_type) = meta.configured_node_type() {
            payload
                .entry("type".to_string())
                .or_insert_with(|| node_type.to_string());
        }
        meta.ensure_geo_hash(&mut payload);

        client.create_node(&self.id, &payload)?;
        tracing::debug!(fields = payload.len(), "Saved node");
        self.data = payload;
        Ok(())
    }

    /// Patch this node using the session client. No fields means no request.
    pub fn update(&mut self, fields: Fields) -> Result<()> {
        let payload = T::META.prepare(fields);
        if payload.is_empty() {
            return Ok(());
        }
        self.apply_update(session::client()?, payload)
    }

    pub fn update_with(&mut self, client: &Client, fields: Fields) -> Result<()> {
        let payload = T::META.prepare(fields);
        if payload.is_empty() {
            return Ok(());
        }
        self.apply_update(client, payload)
    }

    #[tracing::instrument(skip(self, client, payload), fields(id = %self.id))]
    fn apply_update(&mut self, client: &Client, payload: Data) -> Result<()> {
        client.update_node(&self.id, &payload)?;
        tracing::debug!(fields = payload.len(), "Updated node");
        self.data.extend(payload);
        Ok(())
    }

    /// Create an edge from this node to `to_id` using the session client
    pub fn link(&self, to_id: &str, fields: Fields) -> Result<()> {
        self.link_with(session::client()?, to_id, fields)
    }

    pub fn link_with(&self, client: &Client, to_id: &str, fields: Fields) -> Result<()> {
        client.create_edge(&self.id, to_id, &fields.into_data())
    }

    /// Entities of this type in the geohash cell around a point, using the
    /// session client
    pub fn find_near(lat: f64, lon: f64, radius_km: f64, limit: Option<usize>) -> Result<Vec<Self>> {
        let query = Self::nearby_query(lat, lon, radius_km, limit)?;
        Self::run_nearby(session::client()?, &query)
    }

    pub fn find_near_with(
        client: &Client,
        lat: f64,
        lon: f64,
        radius_km: f64,
        limit: Option<usize>,
    ) -> Result<Vec<Self>> {
        let query = Self::nearby_query(lat, lon, radius_km, limit)?;
        Self::run_nearby(client, &query)
    }

    fn nearby_query(lat: f64, lon: f64, radius_km: f64, limit: Option<usize>) -> Result<NearbyQuery> {
        let meta = T::META;
        let node_type = meta
            .configured_node_type()
            .ok_or_else(|| ClientError::usage("node_type is required for find_near"))?;

        let mut query =
            NearbyQuery::around(node_type, lat, lon, radius_km).geo_hash_key(meta.geo_hash_key);
        query.limit = limit;
        Ok(query)
    }

    fn run_nearby(client: &Client, query: &NearbyQuery) -> Result<Vec<Self>> {
        tracing::debug!(
            node_type = %query.node_type,
            prefix = %query.geo_hash_prefix,
            "Finding nearby nodes"
        );
        let views = client.nearby(query)?;
        Ok(views.into_iter().map(Self::from_view).collect())
    }

    /// Upsert the declared field list; no-op when none is declared
    pub fn register_schema() -> Result<()> {
        match Self::schema() {
            Some((entity, fields)) => session::client()?.upsert_schema(entity, &fields),
            None => Ok(()),
        }
    }

    pub fn register_schema_with(client: &Client) -> Result<()> {
        match Self::schema() {
            Some((entity, fields)) => client.upsert_schema(entity, &fields),
            None => Ok(()),
        }
    }

    /// Schema entries are registered under the shared `node` entity
    fn schema() -> Option<(&'static str, Vec<String>)> {
        let fields = T::META.schema_fields.filter(|f| !f.is_empty())?;
        Some((SCHEMA_ENTITY, fields.iter().map(|f| f.to_string()).collect()))
    }
}
