use crate::geo::{Bbox, LonLat};
use geojson::{Feature, FeatureCollection};

/// Rendered layer ids, shared between the controller and the surface.
pub const EVENTS_LAYER: &str = "events-points";
pub const SELECTED_POINT_LAYER: &str = "unclustered-point-selected";
pub const STATES_LAYER: &str = "states";
pub const DISTRICT_INTERACTIVE_LAYER: &str = "district_interactive";
pub const SELECTED_FILL_LAYER: &str = "selected-fill";
pub const SELECTED_BORDER_LAYER: &str = "selected-border";

/// A click/hover position in surface pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Declarative per-layer feature filter, the equivalent of the style
/// expressions `['==', key, value]` and `['any', ['==', key, v], ...]`.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerFilter {
    /// A cleared selection: matches no feature.
    MatchNone,
    PropertyEquals { key: String, value: String },
    PropertyAny { key: String, values: Vec<String> },
}

impl LayerFilter {
    pub fn equals(key: &str, value: &str) -> Self {
        Self::PropertyEquals {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn any(key: &str, values: Vec<String>) -> Self {
        Self::PropertyAny {
            key: key.to_string(),
            values,
        }
    }

    pub fn matches(&self, feature: &Feature) -> bool {
        let prop = |key: &str| {
            feature
                .properties
                .as_ref()
                .and_then(|p| p.get(key))
                .map(property_string)
        };
        match self {
            Self::MatchNone => false,
            Self::PropertyEquals { key, value } => prop(key).as_deref() == Some(value.as_str()),
            Self::PropertyAny { key, values } => prop(key)
                .map(|v| values.iter().any(|candidate| *candidate == v))
                .unwrap_or(false),
        }
    }
}

/// Stringified view of a property value, so numeric GEOIDs and ids compare
/// against their string forms.
fn property_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The seam to the map-rendering collaborator. The controller drives the
/// map exclusively through this trait; the terminal renderer is the
/// crate's concrete implementation.
pub trait MapSurface {
    /// Move the view immediately.
    fn jump_to(&mut self, center: LonLat, zoom: f64);
    /// Move the view with whatever transition the surface supports.
    fn fly_to(&mut self, center: LonLat, zoom: f64);
    fn fit_bounds(&mut self, bounds: Bbox);
    fn view_bounds(&self) -> Bbox;
    fn set_max_bounds(&mut self, bounds: Bbox);

    fn set_data(&mut self, layer: &str, data: FeatureCollection);
    fn remove_layer(&mut self, layer: &str);
    fn set_filter(&mut self, layer: &str, filter: LayerFilter);
    fn set_visibility(&mut self, layer: &str, visible: bool);
    fn visibility(&self, layer: &str) -> bool;

    /// Features of a layer rendered at the given point, topmost first.
    fn query_point(&self, layer: &str, point: ScreenPoint) -> Vec<Feature>;
}
