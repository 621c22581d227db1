use crate::braille::BrailleCanvas;
use crate::geo::{Bbox, LonLat};
use crate::map::geometry::{draw_line, draw_marker, point_in_geometry};
use crate::map::projection::{fit, Viewport};
use crate::map::surface::{
    LayerFilter, MapSurface, ScreenPoint, EVENTS_LAYER, SELECTED_BORDER_LAYER,
    SELECTED_POINT_LAYER, STATES_LAYER,
};
use geojson::{Feature, FeatureCollection, Value};
use std::collections::HashMap;

/// Marker hit slack in braille pixels, one character cell around the point.
const HIT_SLACK_X: i32 = 2;
const HIT_SLACK_Y: i32 = 4;

struct Layer {
    data: FeatureCollection,
    filter: Option<LayerFilter>,
    visible: bool,
}

impl Default for Layer {
    fn default() -> Self {
        Self {
            data: FeatureCollection {
                bbox: None,
                features: Vec::new(),
                foreign_members: None,
            },
            filter: None,
            visible: true,
        }
    }
}

/// A marker cell ready for the ratatui widget.
#[derive(Clone, Debug)]
pub struct Marker {
    pub col: u16,
    pub row: u16,
    pub icon: String,
    pub title: String,
    pub selected: bool,
}

/// One frame of layered map output.
pub struct TerminalScene {
    /// Plain boundary outlines.
    pub boundaries: BrailleCanvas,
    /// Outlines of states tagged with event presence.
    pub active: BrailleCanvas,
    /// Highlighted (selected) district boundaries.
    pub highlight: BrailleCanvas,
    pub markers: Vec<Marker>,
}

/// The crate's own map-rendering collaborator: a braille-canvas renderer
/// behind the MapSurface seam. Transitions are immediate, the terminal has
/// no animation.
pub struct TerminalMap {
    pub viewport: Viewport,
    max_bounds: Option<Bbox>,
    layers: HashMap<String, Layer>,
}

impl TerminalMap {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            max_bounds: None,
            layers: HashMap::new(),
        }
    }

    fn layer_mut(&mut self, name: &str) -> &mut Layer {
        self.layers.entry(name.to_string()).or_default()
    }

    fn clamp_to_max_bounds(&mut self) {
        if let Some(bounds) = self.max_bounds {
            self.viewport.center_lon = self.viewport.center_lon.clamp(bounds.west, bounds.east);
            self.viewport.center_lat = self.viewport.center_lat.clamp(bounds.south, bounds.north);
        }
    }

    fn apply_view(&mut self, center: LonLat, zoom: f64) {
        self.viewport.set_center(center);
        self.viewport.zoom = zoom.clamp(0.5, 100.0);
        self.clamp_to_max_bounds();
    }

    /// Render the visible layers at the given character dimensions.
    pub fn render(&self, char_width: usize, char_height: usize) -> TerminalScene {
        let mut vp = self.viewport.clone();
        vp.width = char_width * 2;
        vp.height = char_height * 4;

        let mut scene = TerminalScene {
            boundaries: BrailleCanvas::new(char_width, char_height),
            active: BrailleCanvas::new(char_width, char_height),
            highlight: BrailleCanvas::new(char_width, char_height),
            markers: Vec::new(),
        };

        if let Some(layer) = self.layers.get(STATES_LAYER) {
            if layer.visible {
                for feature in passing_features(layer) {
                    let active = feature
                        .properties
                        .as_ref()
                        .and_then(|p| p.get("events"))
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false);
                    let canvas = if active {
                        &mut scene.active
                    } else {
                        &mut scene.boundaries
                    };
                    if let Some(geometry) = &feature.geometry {
                        outline(canvas, &vp, geometry);
                    }
                }
            }
        }

        if let Some(layer) = self.layers.get(SELECTED_BORDER_LAYER) {
            if layer.visible {
                for feature in passing_features(layer) {
                    if let Some(geometry) = &feature.geometry {
                        outline(&mut scene.highlight, &vp, geometry);
                    }
                }
            }
        }

        if let Some(layer) = self.layers.get(EVENTS_LAYER) {
            if layer.visible {
                let selected_filter = self
                    .layers
                    .get(SELECTED_POINT_LAYER)
                    .and_then(|l| l.filter.clone());
                for feature in passing_features(layer) {
                    let Some((lng, lat)) = point_coords(feature) else {
                        continue;
                    };
                    let (px, py) = vp.project(lng, lat);
                    if !vp.is_visible(px, py) {
                        continue;
                    }
                    let prop = |key: &str| {
                        feature
                            .properties
                            .as_ref()
                            .and_then(|p| p.get(key))
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string()
                    };
                    scene.markers.push(Marker {
                        col: (px.max(0) / 2) as u16,
                        row: (py.max(0) / 4) as u16,
                        icon: prop("icon"),
                        title: prop("title"),
                        selected: selected_filter
                            .as_ref()
                            .map(|f| f.matches(feature))
                            .unwrap_or(false),
                    });
                }
            }
        }

        scene
    }
}

impl MapSurface for TerminalMap {
    fn jump_to(&mut self, center: LonLat, zoom: f64) {
        self.apply_view(center, zoom);
    }

    fn fly_to(&mut self, center: LonLat, zoom: f64) {
        self.apply_view(center, zoom);
    }

    fn fit_bounds(&mut self, bounds: Bbox) {
        let (center, zoom) =
            fit(bounds, self.viewport.width as f64, self.viewport.height as f64);
        self.apply_view(center, zoom);
    }

    fn view_bounds(&self) -> Bbox {
        self.viewport.bounds()
    }

    fn set_max_bounds(&mut self, bounds: Bbox) {
        self.max_bounds = Some(bounds);
        self.clamp_to_max_bounds();
    }

    fn set_data(&mut self, layer: &str, data: FeatureCollection) {
        self.layer_mut(layer).data = data;
    }

    fn remove_layer(&mut self, layer: &str) {
        self.layers.remove(layer);
    }

    fn set_filter(&mut self, layer: &str, filter: LayerFilter) {
        self.layer_mut(layer).filter = Some(filter);
    }

    fn set_visibility(&mut self, layer: &str, visible: bool) {
        self.layer_mut(layer).visible = visible;
    }

    fn visibility(&self, layer: &str) -> bool {
        self.layers.get(layer).map(|l| l.visible).unwrap_or(false)
    }

    // Layers stay queryable while hidden; interactive boundary layers are
    // never drawn but still answer clicks.
    fn query_point(&self, layer: &str, point: ScreenPoint) -> Vec<Feature> {
        let Some(layer) = self.layers.get(layer) else {
            return Vec::new();
        };
        let clicked = self.viewport.unproject(point.x, point.y);

        passing_features(layer)
            .filter(|feature| {
                let Some(geometry) = &feature.geometry else {
                    return false;
                };
                match &geometry.value {
                    Value::Point(coords) => {
                        if coords.len() < 2 {
                            return false;
                        }
                        let (px, py) = self.viewport.project(coords[0], coords[1]);
                        (px - point.x).abs() <= HIT_SLACK_X && (py - point.y).abs() <= HIT_SLACK_Y
                    }
                    _ => point_in_geometry(clicked.lon, clicked.lat, geometry),
                }
            })
            .cloned()
            .collect()
    }
}

/// Features of a layer that pass its filter.
fn passing_features(layer: &Layer) -> impl Iterator<Item = &Feature> + '_ {
    layer
        .data
        .features
        .iter()
        .filter(|f| layer.filter.as_ref().map(|fl| fl.matches(f)).unwrap_or(true))
}

fn point_coords(feature: &Feature) -> Option<(f64, f64)> {
    match &feature.geometry.as_ref()?.value {
        Value::Point(coords) if coords.len() >= 2 => Some((coords[0], coords[1])),
        _ => None,
    }
}

/// Project and outline a geometry's line work onto a canvas, skipping
/// segments that cannot intersect the viewport.
fn outline(canvas: &mut BrailleCanvas, vp: &Viewport, geometry: &geojson::Geometry) {
    match &geometry.value {
        Value::LineString(coords) => outline_path(canvas, vp, coords),
        Value::MultiLineString(lines) => {
            for coords in lines {
                outline_path(canvas, vp, coords);
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                outline_path(canvas, vp, exterior);
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    outline_path(canvas, vp, exterior);
                }
            }
        }
        Value::Point(coords) => {
            if coords.len() >= 2 {
                let (px, py) = vp.project(coords[0], coords[1]);
                draw_marker(canvas, px, py, 1);
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                outline(canvas, vp, g);
            }
        }
        _ => {}
    }
}

fn outline_path(canvas: &mut BrailleCanvas, vp: &Viewport, coords: &[Vec<f64>]) {
    for pair in coords.windows(2) {
        let (x0, y0) = vp.project(pair[0][0], pair[0][1]);
        let (x1, y1) = vp.project(pair[1][0], pair[1][1]);
        if segment_might_be_visible(vp, (x0, y0), (x1, y1)) {
            draw_line(canvas, x0, y0, x1, y1);
        }
    }
}

fn segment_might_be_visible(vp: &Viewport, p1: (i32, i32), p2: (i32, i32)) -> bool {
    let min_x = p1.0.min(p2.0);
    let max_x = p1.0.max(p2.0);
    let min_y = p1.1.min(p2.1);
    let max_y = p1.1.max(p2.1);

    max_x >= 0 && min_x < vp.width as i32 && max_y >= 0 && min_y < vp.height as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::JsonObject;

    fn point_feature(id: &str, lng: f64, lat: f64) -> Feature {
        let mut props = JsonObject::new();
        props.insert("id".to_string(), id.into());
        props.insert("icon".to_string(), "campaign".into());
        props.insert("title".to_string(), format!("Event {id}").into());
        Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(Value::Point(vec![lng, lat]))),
            id: None,
            properties: Some(props),
            foreign_members: None,
        }
    }

    fn collection(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    fn surface() -> TerminalMap {
        TerminalMap::new(Viewport::new(-97.1, 36.9, 4.0, 200, 120))
    }

    #[test]
    fn test_query_point_hits_marker() {
        let mut map = surface();
        map.set_data(EVENTS_LAYER, collection(vec![point_feature("a", -97.1, 36.9)]));

        let (px, py) = map.viewport.project(-97.1, 36.9);
        let hits = map.query_point(EVENTS_LAYER, ScreenPoint::new(px, py));
        assert_eq!(hits.len(), 1);

        let misses = map.query_point(EVENTS_LAYER, ScreenPoint::new(px + 50, py));
        assert!(misses.is_empty());
    }

    #[test]
    fn test_query_point_polygon_containment() {
        let mut map = surface();
        let mut props = JsonObject::new();
        props.insert("GEOID".to_string(), "1713".into());
        let polygon = Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(Value::Polygon(vec![vec![
                vec![-90.0, 36.0],
                vec![-88.0, 36.0],
                vec![-88.0, 38.0],
                vec![-90.0, 38.0],
                vec![-90.0, 36.0],
            ]]))),
            id: None,
            properties: Some(props),
            foreign_members: None,
        };
        map.set_data("district_interactive", collection(vec![polygon]));

        let (px, py) = map.viewport.project(-89.0, 37.0);
        let hits = map.query_point("district_interactive", ScreenPoint::new(px, py));
        assert_eq!(hits.len(), 1);

        let (px, py) = map.viewport.project(-80.0, 37.0);
        assert!(map
            .query_point("district_interactive", ScreenPoint::new(px, py))
            .is_empty());
    }

    #[test]
    fn test_filter_limits_rendered_markers() {
        let mut map = surface();
        map.set_data(
            EVENTS_LAYER,
            collection(vec![
                point_feature("a", -97.1, 36.9),
                point_feature("b", -96.0, 36.0),
            ]),
        );
        map.set_filter(EVENTS_LAYER, LayerFilter::equals("id", "b"));

        let scene = map.render(100, 30);
        assert_eq!(scene.markers.len(), 1);
        assert_eq!(scene.markers[0].title, "Event b");
    }

    #[test]
    fn test_selected_filter_marks_marker() {
        let mut map = surface();
        map.set_data(
            EVENTS_LAYER,
            collection(vec![
                point_feature("a", -97.1, 36.9),
                point_feature("b", -96.0, 36.0),
            ]),
        );
        map.set_filter(SELECTED_POINT_LAYER, LayerFilter::equals("id", "a"));

        let scene = map.render(100, 30);
        let selected: Vec<&Marker> = scene.markers.iter().filter(|m| m.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].title, "Event a");
    }

    #[test]
    fn test_hidden_layer_not_rendered_but_queryable() {
        let mut map = surface();
        map.set_data(EVENTS_LAYER, collection(vec![point_feature("a", -97.1, 36.9)]));
        map.set_visibility(EVENTS_LAYER, false);

        let scene = map.render(100, 30);
        assert!(scene.markers.is_empty());

        let (px, py) = map.viewport.project(-97.1, 36.9);
        assert_eq!(
            map.query_point(EVENTS_LAYER, ScreenPoint::new(px, py)).len(),
            1
        );
    }

    #[test]
    fn test_fit_bounds_recenters() {
        let mut map = surface();
        map.fit_bounds(Bbox::new(-124.41, 32.53, -114.13, 42.01));
        assert!((map.viewport.center_lon - -119.27).abs() < 0.5);
        assert!(map.viewport.center_lat > 32.53 && map.viewport.center_lat < 42.01);
    }

    #[test]
    fn test_max_bounds_clamps_center() {
        let mut map = surface();
        map.set_max_bounds(Bbox::new(-128.0, 24.0, -60.885444, 50.0));
        map.jump_to(LonLat::new(-150.0, 60.0), 4.0);
        assert_eq!(map.viewport.center_lon, -128.0);
        assert_eq!(map.viewport.center_lat, 50.0);
    }
}
