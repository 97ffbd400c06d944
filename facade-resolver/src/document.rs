//! Panorama image documents as stored upstream.
//!
//! Upstream documents are loosely typed: identifiers may be strings,
//! numbers or `{"$oid": ...}` objects, and any pose field may be null or
//! absent. Deserialization here is lenient: unusable values become `None`
//! and are reported when the pose is built.

use facade_geo::{AddressMatch, CameraPose, GeoPoint};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

use crate::error::{ResolverError, Result};

/// Zoom used for a non-integral zoom value. Not in the zoom table, so it
/// maps to the default base distance.
pub const UNKNOWN_ZOOM: i32 = -1;

/// An image document.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ImageDocument {
    #[serde(default, deserialize_with = "lenient_id")]
    pub image_id: Option<String>,

    /// Camera location
    #[serde(default)]
    pub location: Option<CameraLocation>,

    /// Label groups; only the first one is resolved
    #[serde(default, deserialize_with = "lenient_vec")]
    pub human_labels: Vec<LabelGroup>,

    /// Promoted address text
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
}

/// Camera location as stored (`lng`, not `lon`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct CameraLocation {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lng: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LabelGroup {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub labels: Vec<Label>,
}

/// A label placed on the panorama.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Label {
    #[serde(default, deserialize_with = "lenient_id")]
    pub label_id: Option<String>,

    #[serde(rename = "markerPov", default)]
    pub marker_pov: Option<MarkerPov>,
}

/// Viewing direction at which the label was placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct MarkerPov {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub heading: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pitch: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub zoom: Option<f64>,
}

impl ImageDocument {
    /// Parse a raw stored document.
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }

    /// Labels of the first label group; empty when there is none.
    pub fn first_group_labels(&self) -> &[Label] {
        self.human_labels
            .first()
            .map(|group| group.labels.as_slice())
            .unwrap_or_default()
    }

    /// Labels are present and ready to resolve.
    pub fn has_labels(&self) -> bool {
        !self.first_group_labels().is_empty()
    }

    /// Any label in any group with this id.
    pub fn find_label(&self, label_id: &str) -> Option<&Label> {
        self.human_labels
            .iter()
            .flat_map(|group| group.labels.iter())
            .find(|label| label.id() == Some(label_id))
    }

    /// Camera location, if both coordinates are present.
    pub fn camera_location(&self) -> Result<GeoPoint> {
        let location = self
            .location
            .ok_or_else(|| ResolverError::MissingAttribute("location".to_string()))?;
        match (location.lat, location.lng) {
            (Some(lat), Some(lng)) => Ok(GeoPoint::new(lat, lng)),
            (None, _) => Err(ResolverError::MissingAttribute("location.lat".to_string())),
            (_, None) => Err(ResolverError::MissingAttribute("location.lng".to_string())),
        }
    }
}

impl Label {
    /// Non-empty label id.
    pub fn id(&self) -> Option<&str> {
        self.label_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Build the camera pose for this label.
    ///
    /// # Errors
    /// `MissingAttribute` when heading or pitch is absent, `Geo` when the
    /// values are out of range.
    pub fn camera_pose(&self, location: GeoPoint, fallback_zoom: i32) -> Result<CameraPose> {
        let pov = self.marker_pov.unwrap_or_default();
        let heading = pov
            .heading
            .ok_or_else(|| ResolverError::MissingAttribute("markerPov.heading".to_string()))?;
        let pitch = pov
            .pitch
            .ok_or_else(|| ResolverError::MissingAttribute("markerPov.pitch".to_string()))?;
        let zoom = pov.zoom.map_or(fallback_zoom, zoom_level);

        Ok(CameraPose::new(location, heading, pitch, zoom)?)
    }
}

/// Integral zoom values map to themselves; anything else is unknown.
pub fn zoom_level(zoom: f64) -> i32 {
    if zoom.fract() == 0.0 && zoom >= i32::MIN as f64 && zoom <= i32::MAX as f64 {
        zoom as i32
    } else {
        UNKNOWN_ZOOM
    }
}

/// Does a stored id value name `id`?
pub fn id_matches(value: &Value, id: &str) -> bool {
    id_string(value).is_some_and(|v| v == id)
}

/// Stored id as text: strings, integers and `{"$oid": "..."}`.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("$oid").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Dotted path of a field on a first-group label.
pub fn label_field_path(index: usize, field: &str) -> String {
    format!("human_labels.0.labels.{index}.{field}")
}

/// Stored form of resolved exact coordinates.
pub fn exact_coordinates_value(point: GeoPoint) -> Value {
    json!({ "lat": point.lat, "lng": point.lon })
}

/// Stored form of a label's address: the match or null.
pub fn address_value(address: Option<&AddressMatch>) -> Result<Value> {
    match address {
        Some(m) => Ok(serde_json::to_value(m)?),
        None => Ok(Value::Null),
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    Ok(Value::deserialize(d)?.as_f64().filter(|v| v.is_finite()))
}

fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(id_string(&Value::deserialize(d)?))
}

fn lenient_string<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Value::deserialize(d)?.as_str().map(str::to_string))
}

/// Malformed entries become defaults so array positions stay aligned with
/// the stored document.
fn lenient_vec<'de, D, T>(d: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    match Value::deserialize(d)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect()),
        _ => Ok(Vec::new()),
    }
}
