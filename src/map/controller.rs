use crate::data::{bbox_for, district_geoid, BoundarySet};
use crate::events::{build_features, ColorTable, EventRecord};
use crate::geo::{parse_bounds_attr, Bbox, LonLat};
use crate::map::projection::focus;
use crate::map::surface::{
    LayerFilter, MapSurface, ScreenPoint, DISTRICT_INTERACTIVE_LAYER, EVENTS_LAYER,
    SELECTED_BORDER_LAYER, SELECTED_FILL_LAYER, SELECTED_POINT_LAYER, STATES_LAYER,
};
use tracing::debug;

/// Initial continental view.
pub const CONTINENTAL_CENTER: LonLat = LonLat {
    lon: -97.1,
    lat: 36.9,
};
pub const INITIAL_ZOOM: f64 = 4.0;

/// Hard pan limit for the main map.
pub const MAX_BOUNDS: Bbox = Bbox {
    west: -128.0,
    south: 24.0,
    east: -60.885444,
    north: 50.0,
};

/// Continental bounds used for the fallback fit.
pub const CONTINENTAL_BOUNDS: Bbox = Bbox {
    west: -128.8,
    south: 23.6,
    east: -65.4,
    north: 50.2,
};

pub const ALASKA_INSET_BOUNDS: Bbox = Bbox {
    west: -170.15625,
    south: 51.72702815704774,
    east: -127.61718749999999,
    north: 71.85622888185527,
};

pub const HAWAII_INSET_BOUNDS: Bbox = Bbox {
    west: -161.03759765625,
    south: 18.542116654448996,
    east: -154.22607421875,
    north: 22.573438264572406,
};

/// How a map click is interpreted, chosen by the surrounding search UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    Proximity,
    District,
}

/// Externally supplied view state; the controller diffs consecutive values.
#[derive(Clone, Debug, PartialEq)]
pub struct MapProps {
    /// Version counter for the event list. The owner bumps it whenever the
    /// list content changes; the controller re-renders on a version change.
    pub events_version: u64,
    /// Identifier of the highlighted event, if any.
    pub selected_item: Option<String>,
    pub selected_state: Option<String>,
    pub district: Option<u32>,
    pub center: Option<LonLat>,
    /// Search radius in miles, feeding the proximity zoom.
    pub distance: f64,
}

impl Default for MapProps {
    fn default() -> Self {
        Self {
            events_version: 0,
            selected_item: None,
            selected_state: None,
            district: None,
            center: None,
            distance: 50.0,
        }
    }
}

/// A district picked by clicking the interactive boundary layer.
#[derive(Clone, Debug, PartialEq)]
pub struct DistrictPick {
    pub state: String,
    /// Two-digit district number as carried in the boundary data.
    pub district: String,
    pub geoid: String,
}

/// One or many composite district identifiers to highlight (any-of).
#[derive(Clone, Debug, PartialEq)]
pub enum GeoidSelection {
    One(String),
    Many(Vec<String>),
}

/// One-way notifications to the owning application.
pub struct Callbacks {
    pub on_select_coords: Box<dyn FnMut(LonLat)>,
    pub on_select_district: Box<dyn FnMut(DistrictPick)>,
    pub on_reset: Box<dyn FnMut()>,
    pub on_colors_updated: Box<dyn FnMut(&ColorTable)>,
}

impl Default for Callbacks {
    fn default() -> Self {
        Self {
            on_select_coords: Box::new(|_| {}),
            on_select_district: Box::new(|_| {}),
            on_reset: Box::new(|| {}),
            on_colors_updated: Box::new(|_| {}),
        }
    }
}

/// Proximity zoom from the search radius.
fn zoom_for_distance(distance: f64) -> f64 {
    9.52 - distance * (4.7 / 450.0)
}

/// Orchestrates one long-lived map surface: builds marker features from the
/// event list, reacts to prop changes, and translates surface interactions
/// into owner callbacks.
pub struct MapViewController<S: MapSurface> {
    surface: S,
    colors: ColorTable,
    callbacks: Callbacks,
    props: MapProps,
    /// Window pixel size; bounding-box focus uses half of each dimension.
    window: (f64, f64),
    inset_visible: bool,
    alaska_items: Vec<EventRecord>,
    hawaii_items: Vec<EventRecord>,
}

impl<S: MapSurface> MapViewController<S> {
    pub fn new(surface: S, colors: ColorTable, callbacks: Callbacks, window: (f64, f64)) -> Self {
        Self {
            surface,
            colors,
            callbacks,
            props: MapProps::default(),
            window,
            inset_visible: true,
            alaska_items: Vec::new(),
            hawaii_items: Vec::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    pub fn inset_visible(&self) -> bool {
        self.inset_visible
    }

    pub fn alaska_items(&self) -> &[EventRecord] {
        &self.alaska_items
    }

    pub fn hawaii_items(&self) -> &[EventRecord] {
        &self.hawaii_items
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.window = (width, height);
    }

    /// Initialize the surface: continental view, boundary layers (states
    /// pre-tagged with event presence), hidden highlight layers, and the
    /// initial marker layer.
    pub fn mount(&mut self, items: &[EventRecord], props: MapProps, boundaries: BoundarySet) {
        self.inset_visible = props.selected_state.is_none();
        self.props = props;

        self.surface.jump_to(CONTINENTAL_CENTER, INITIAL_ZOOM);
        self.surface.set_max_bounds(MAX_BOUNDS);

        self.surface.set_data(STATES_LAYER, boundaries.states);
        self.surface
            .set_data(DISTRICT_INTERACTIVE_LAYER, boundaries.districts.clone());
        self.surface
            .set_data(SELECTED_FILL_LAYER, boundaries.districts.clone());
        self.surface
            .set_data(SELECTED_BORDER_LAYER, boundaries.districts);
        self.surface.set_visibility(SELECTED_FILL_LAYER, false);
        self.surface.set_visibility(SELECTED_BORDER_LAYER, false);

        self.replace_marker_data(items);
        self.filter_for_state_insets(items);
    }

    /// Apply a new set of props. The selected-item and event-list branches
    /// are independent; the view branches (state, center, continental
    /// fallback) are first-match.
    pub fn update(&mut self, items: &[EventRecord], next: MapProps) {
        if next.selected_item != self.props.selected_item {
            let filter = match &next.selected_item {
                Some(id) => LayerFilter::equals("id", id),
                None => LayerFilter::MatchNone,
            };
            self.surface.set_filter(SELECTED_POINT_LAYER, filter);
        }

        if next.events_version != self.props.events_version {
            self.replace_marker_data(items);
            self.filter_for_state_insets(items);
        }

        if let Some(state) = next.selected_state.clone() {
            self.focus_state(&state, next.district);
        } else if let Some(center) = next.center {
            if !self.inset_visible {
                let current = self.surface.view_bounds();
                self.surface.fit_bounds(current);
            } else {
                self.surface
                    .fly_to(center, zoom_for_distance(next.distance));
            }
        } else {
            debug!("flying to reset");
            self.surface.fit_bounds(CONTINENTAL_BOUNDS);
        }

        self.props = next;
    }

    fn replace_marker_data(&mut self, items: &[EventRecord]) {
        let (features, changed) = build_features(items, &mut self.colors);
        self.surface.set_data(EVENTS_LAYER, features);
        if changed {
            (self.callbacks.on_colors_updated)(&self.colors);
        }
    }

    fn filter_for_state_insets(&mut self, items: &[EventRecord]) {
        self.alaska_items = items
            .iter()
            .filter(|e| e.state.as_deref() == Some("AK"))
            .cloned()
            .collect();
        self.hawaii_items = items
            .iter()
            .filter(|e| e.state.as_deref() == Some("HI"))
            .cloned()
            .collect();
    }

    /// Focus the view on a state (optionally a district) and highlight the
    /// district boundary. A state without a bbox entry leaves the view
    /// unchanged.
    fn focus_state(&mut self, state: &str, district: Option<u32>) {
        let bbox = bbox_for(state, district);
        if let Some((center, zoom)) = focus(bbox, self.window.0 / 2.0, self.window.1 / 2.0) {
            self.surface.fly_to(center, zoom);
        }
        if let Some(d) = district {
            if let Some(geoid) = district_geoid(state, d) {
                self.highlight_district(GeoidSelection::One(geoid));
            }
        }
    }

    /// Show the paired highlight layers filtered to the given identifiers.
    pub fn highlight_district(&mut self, selection: GeoidSelection) {
        let filter = match selection {
            GeoidSelection::One(geoid) => LayerFilter::equals("GEOID", &geoid),
            GeoidSelection::Many(geoids) => LayerFilter::any("GEOID", geoids),
        };
        self.toggle_filters(SELECTED_FILL_LAYER, filter.clone());
        self.toggle_filters(SELECTED_BORDER_LAYER, filter);
    }

    fn toggle_filters(&mut self, layer: &str, filter: LayerFilter) {
        self.surface.set_filter(layer, filter);
        self.surface.set_visibility(layer, true);
    }

    /// Interpret a click according to the active search mode.
    pub fn handle_click(&mut self, point: ScreenPoint, lnglat: LonLat, mode: SearchMode) {
        match mode {
            SearchMode::Proximity => {
                let points = self.surface.query_point(EVENTS_LAYER, point);
                let coords = points
                    .first()
                    .and_then(point_feature_coords)
                    .unwrap_or(lnglat);
                (self.callbacks.on_select_coords)(coords);
            }
            SearchMode::District => {
                let features = self
                    .surface
                    .query_point(DISTRICT_INTERACTIVE_LAYER, point);
                if let Some(pick) = features.first().and_then(district_pick) {
                    (self.callbacks.on_select_district)(pick);
                }
            }
        }
    }

    /// A click on a state inset dismisses it and fits the main map to the
    /// bounds encoded on the inset container.
    pub fn inset_click(&mut self, bounds_attr: &str) {
        self.inset_visible = false;
        if let Some(bounds) = parse_bounds_attr(bounds_attr) {
            self.surface.fit_bounds(bounds);
        }
    }

    /// Clear highlights, notify the owner, and restore the insets when no
    /// state is selected.
    pub fn reset(&mut self) {
        self.surface.set_visibility(SELECTED_FILL_LAYER, false);
        self.surface.set_visibility(SELECTED_BORDER_LAYER, false);
        (self.callbacks.on_reset)();
        if self.props.selected_state.is_none() {
            self.inset_visible = true;
        }
    }
}

fn point_feature_coords(feature: &geojson::Feature) -> Option<LonLat> {
    match &feature.geometry.as_ref()?.value {
        geojson::Value::Point(coords) if coords.len() >= 2 => {
            Some(LonLat::new(coords[0], coords[1]))
        }
        _ => None,
    }
}

/// State abbreviation and district number out of an interactive boundary
/// feature: `ABR` plus positions 2..4 of the composite `GEOID`.
fn district_pick(feature: &geojson::Feature) -> Option<DistrictPick> {
    let props = feature.properties.as_ref()?;
    let state = props.get("ABR")?.as_str()?.to_string();
    let geoid = match props.get("GEOID")? {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let district = geoid.get(2..4)?.to_string();
    Some(DistrictPick {
        state,
        district,
        geoid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::empty_collection;
    use chrono::Utc;
    use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeSurface {
        calls: Vec<String>,
        filters: HashMap<String, LayerFilter>,
        visibility: HashMap<String, bool>,
        data_sizes: HashMap<String, usize>,
        view: Option<(LonLat, f64)>,
        hits: HashMap<String, Vec<Feature>>,
    }

    impl MapSurface for FakeSurface {
        fn jump_to(&mut self, center: LonLat, zoom: f64) {
            self.calls.push(format!("jump_to zoom={zoom}"));
            self.view = Some((center, zoom));
        }

        fn fly_to(&mut self, center: LonLat, zoom: f64) {
            self.calls.push(format!("fly_to zoom={zoom:.2}"));
            self.view = Some((center, zoom));
        }

        fn fit_bounds(&mut self, bounds: Bbox) {
            self.calls.push(format!("fit_bounds west={}", bounds.west));
            self.view = Some((bounds.center(), 0.0));
        }

        fn view_bounds(&self) -> Bbox {
            Bbox::new(-120.0, 30.0, -80.0, 45.0)
        }

        fn set_max_bounds(&mut self, _bounds: Bbox) {
            self.calls.push("set_max_bounds".to_string());
        }

        fn set_data(&mut self, layer: &str, data: FeatureCollection) {
            self.calls.push(format!("set_data {layer}"));
            self.data_sizes.insert(layer.to_string(), data.features.len());
        }

        fn remove_layer(&mut self, layer: &str) {
            self.calls.push(format!("remove_layer {layer}"));
        }

        fn set_filter(&mut self, layer: &str, filter: LayerFilter) {
            self.calls.push(format!("set_filter {layer}"));
            self.filters.insert(layer.to_string(), filter);
        }

        fn set_visibility(&mut self, layer: &str, visible: bool) {
            self.visibility.insert(layer.to_string(), visible);
        }

        fn visibility(&self, layer: &str) -> bool {
            self.visibility.get(layer).copied().unwrap_or(false)
        }

        fn query_point(&self, layer: &str, _point: ScreenPoint) -> Vec<Feature> {
            self.hits.get(layer).cloned().unwrap_or_default()
        }
    }

    fn event(id: &str, state: &str) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            name: format!("Event {id}"),
            display_name: String::new(),
            address: String::new(),
            venue: String::new(),
            date: String::new(),
            time: String::new(),
            starts_at: Some(Utc::now()),
            icon_flag: "campaign".to_string(),
            chamber: "nationwide".to_string(),
            lat: Some(39.0),
            lng: Some(-89.0),
            state: Some(state.to_string()),
            district: None,
            url: None,
        }
    }

    fn boundaries() -> BoundarySet {
        BoundarySet {
            states: empty_collection(),
            districts: empty_collection(),
        }
    }

    fn controller() -> MapViewController<FakeSurface> {
        let mut c = MapViewController::new(
            FakeSurface::default(),
            ColorTable::default(),
            Callbacks::default(),
            (1280.0, 800.0),
        );
        c.mount(&[event("a", "IL")], MapProps::default(), boundaries());
        c
    }

    #[test]
    fn test_mount_initializes_view_and_layers() {
        let c = controller();
        let surface = c.surface();
        assert_eq!(surface.view.unwrap().1, INITIAL_ZOOM);
        assert!(!surface.visibility(SELECTED_FILL_LAYER));
        assert!(!surface.visibility(SELECTED_BORDER_LAYER));
        assert_eq!(surface.data_sizes[EVENTS_LAYER], 1);
        assert!(c.inset_visible());
    }

    #[test]
    fn test_selected_item_sets_filter() {
        let mut c = controller();
        let items = [event("a", "IL")];

        let mut props = MapProps {
            selected_item: Some("a".to_string()),
            ..MapProps::default()
        };
        c.update(&items, props.clone());
        assert_eq!(
            c.surface().filters[SELECTED_POINT_LAYER],
            LayerFilter::equals("id", "a")
        );

        props.selected_item = None;
        c.update(&items, props);
        assert_eq!(
            c.surface().filters[SELECTED_POINT_LAYER],
            LayerFilter::MatchNone
        );
    }

    #[test]
    fn test_event_version_change_replaces_data_and_insets() {
        let mut c = controller();
        let items = [event("a", "IL"), event("b", "AK"), event("c", "HI")];

        c.update(
            &items,
            MapProps {
                events_version: 1,
                ..MapProps::default()
            },
        );
        assert_eq!(c.surface().data_sizes[EVENTS_LAYER], 3);
        assert_eq!(c.alaska_items().len(), 1);
        assert_eq!(c.hawaii_items().len(), 1);
    }

    #[test]
    fn test_same_version_does_not_replace_data() {
        let mut c = controller();
        let items = [event("a", "IL"), event("b", "AK")];

        c.update(&items, MapProps::default());
        // Length-insensitive: only the version counter drives the rebuild.
        assert_eq!(c.surface().data_sizes[EVENTS_LAYER], 1);
    }

    #[test]
    fn test_selected_state_beats_center() {
        let mut c = controller();
        c.update(
            &[event("a", "IL")],
            MapProps {
                selected_state: Some("CA".to_string()),
                center: Some(LonLat::new(-89.0, 39.0)),
                ..MapProps::default()
            },
        );
        let last = c.surface().calls.last().unwrap().clone();
        assert!(last.starts_with("fly_to"), "got {last}");
        // Focus zoom is floored at 2.5.
        assert!(c.surface().view.unwrap().1 >= 2.5);
    }

    #[test]
    fn test_center_flies_with_distance_zoom() {
        let mut c = controller();
        c.update(
            &[event("a", "IL")],
            MapProps {
                center: Some(LonLat::new(-89.0, 39.0)),
                distance: 450.0,
                ..MapProps::default()
            },
        );
        let (center, zoom) = c.surface().view.unwrap();
        assert_eq!(center, LonLat::new(-89.0, 39.0));
        assert!((zoom - 4.82).abs() < 1e-9);
    }

    #[test]
    fn test_no_selection_fits_continental_bounds() {
        let mut c = controller();
        c.update(&[event("a", "IL")], MapProps::default());
        assert_eq!(
            c.surface().calls.last().unwrap(),
            "fit_bounds west=-128.8"
        );
    }

    #[test]
    fn test_district_selection_highlights() {
        let mut c = controller();
        c.update(
            &[event("a", "IL")],
            MapProps {
                selected_state: Some("CA".to_string()),
                district: Some(5),
                ..MapProps::default()
            },
        );
        let expected = LayerFilter::equals("GEOID", "0605");
        assert_eq!(c.surface().filters[SELECTED_FILL_LAYER], expected);
        assert_eq!(c.surface().filters[SELECTED_BORDER_LAYER], expected);
        assert!(c.surface().visibility(SELECTED_FILL_LAYER));
        assert!(c.surface().visibility(SELECTED_BORDER_LAYER));
    }

    #[test]
    fn test_highlight_many_uses_any_filter() {
        let mut c = controller();
        c.highlight_district(GeoidSelection::Many(vec![
            "0605".to_string(),
            "0610".to_string(),
        ]));
        match &c.surface().filters[SELECTED_BORDER_LAYER] {
            LayerFilter::PropertyAny { key, values } => {
                assert_eq!(key, "GEOID");
                assert_eq!(values.len(), 2);
            }
            other => panic!("expected any-of filter, got {other:?}"),
        }
    }

    #[test]
    fn test_reset_hides_highlights_and_restores_inset() {
        let resets = Rc::new(RefCell::new(0));
        let counter = resets.clone();
        let callbacks = Callbacks {
            on_reset: Box::new(move || *counter.borrow_mut() += 1),
            ..Callbacks::default()
        };
        let mut c = MapViewController::new(
            FakeSurface::default(),
            ColorTable::default(),
            callbacks,
            (1280.0, 800.0),
        );
        c.mount(&[], MapProps::default(), boundaries());

        c.inset_click("-170.15625,51.727,-127.617,71.856");
        assert!(!c.inset_visible());

        c.highlight_district(GeoidSelection::One("0605".to_string()));
        c.reset();

        assert!(!c.surface().visibility(SELECTED_FILL_LAYER));
        assert!(!c.surface().visibility(SELECTED_BORDER_LAYER));
        assert!(c.inset_visible());
        assert_eq!(*resets.borrow(), 1);
    }

    #[test]
    fn test_reset_keeps_inset_dismissed_when_state_selected() {
        let mut c = controller();
        c.update(
            &[event("a", "IL")],
            MapProps {
                selected_state: Some("CA".to_string()),
                ..MapProps::default()
            },
        );
        c.inset_click("-170.15625,51.727,-127.617,71.856");
        c.reset();
        assert!(!c.inset_visible());
    }

    #[test]
    fn test_dismissed_inset_refits_instead_of_flying() {
        let mut c = controller();
        c.inset_click("-170.15625,51.727,-127.617,71.856");
        c.update(
            &[event("a", "IL")],
            MapProps {
                center: Some(LonLat::new(-89.0, 39.0)),
                ..MapProps::default()
            },
        );
        let last = c.surface().calls.last().unwrap().clone();
        assert!(last.starts_with("fit_bounds"), "got {last}");
    }

    #[test]
    fn test_proximity_click_prefers_marker_coords() {
        let picked = Rc::new(RefCell::new(Vec::new()));
        let sink = picked.clone();
        let callbacks = Callbacks {
            on_select_coords: Box::new(move |c| sink.borrow_mut().push(c)),
            ..Callbacks::default()
        };
        let mut c = MapViewController::new(
            FakeSurface::default(),
            ColorTable::default(),
            callbacks,
            (1280.0, 800.0),
        );
        c.mount(&[], MapProps::default(), boundaries());

        let marker = Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![-89.65, 39.78]))),
            id: None,
            properties: None,
            foreign_members: None,
        };
        c.surface_mut()
            .hits
            .insert(EVENTS_LAYER.to_string(), vec![marker]);

        c.handle_click(
            ScreenPoint::new(10, 10),
            LonLat::new(-100.0, 40.0),
            SearchMode::Proximity,
        );
        assert_eq!(picked.borrow()[0], LonLat::new(-89.65, 39.78));

        c.surface_mut().hits.clear();
        c.handle_click(
            ScreenPoint::new(10, 10),
            LonLat::new(-100.0, 40.0),
            SearchMode::Proximity,
        );
        assert_eq!(picked.borrow()[1], LonLat::new(-100.0, 40.0));
    }

    #[test]
    fn test_district_click_reports_pick() {
        let picked = Rc::new(RefCell::new(Vec::new()));
        let sink = picked.clone();
        let callbacks = Callbacks {
            on_select_district: Box::new(move |p| sink.borrow_mut().push(p)),
            ..Callbacks::default()
        };
        let mut c = MapViewController::new(
            FakeSurface::default(),
            ColorTable::default(),
            callbacks,
            (1280.0, 800.0),
        );
        c.mount(&[], MapProps::default(), boundaries());

        let mut props = JsonObject::new();
        props.insert("ABR".to_string(), "CA".into());
        props.insert("GEOID".to_string(), "0605".into());
        let district = Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: Some(props),
            foreign_members: None,
        };
        c.surface_mut()
            .hits
            .insert(DISTRICT_INTERACTIVE_LAYER.to_string(), vec![district]);

        c.handle_click(
            ScreenPoint::new(10, 10),
            LonLat::new(-120.0, 37.0),
            SearchMode::District,
        );
        assert_eq!(
            picked.borrow()[0],
            DistrictPick {
                state: "CA".to_string(),
                district: "05".to_string(),
                geoid: "0605".to_string(),
            }
        );
    }

    #[test]
    fn test_colors_updated_reported_once_per_batch() {
        let updates = Rc::new(RefCell::new(0));
        let counter = updates.clone();
        let callbacks = Callbacks {
            on_colors_updated: Box::new(move |_| *counter.borrow_mut() += 1),
            ..Callbacks::default()
        };
        let mut c = MapViewController::new(
            FakeSurface::default(),
            ColorTable::default(),
            callbacks,
            (1280.0, 800.0),
        );
        c.mount(&[event("a", "IL")], MapProps::default(), boundaries());
        assert_eq!(*updates.borrow(), 1);

        // Same categories again: pure reuse, no notification.
        c.update(
            &[event("a", "IL"), event("b", "IL")],
            MapProps {
                events_version: 1,
                ..MapProps::default()
            },
        );
        assert_eq!(*updates.borrow(), 1);
    }
}
