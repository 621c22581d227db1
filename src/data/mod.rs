use crate::events::EventRecord;
use crate::geo::Bbox;
use anyhow::{Context, Result};
use geojson::FeatureCollection;
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::warn;

/// State bounding boxes (west, south, east, north), keyed by postal
/// abbreviation. District-level lookups use the composite key form
/// `"CA05"`; entries for those can be added here as they are sourced.
static BBOXES: &[(&str, [f64; 4])] = &[
    ("AL", [-88.47, 30.22, -84.89, 35.01]),
    ("AK", [-179.15, 51.21, -129.98, 71.44]),
    ("AZ", [-114.82, 31.33, -109.05, 37.00]),
    ("AR", [-94.62, 33.00, -89.64, 36.50]),
    ("CA", [-124.41, 32.53, -114.13, 42.01]),
    ("CO", [-109.06, 36.99, -102.04, 41.00]),
    ("CT", [-73.73, 40.98, -71.79, 42.05]),
    ("DE", [-75.79, 38.45, -75.05, 39.84]),
    ("DC", [-77.12, 38.79, -76.91, 38.99]),
    ("FL", [-87.63, 24.52, -80.03, 31.00]),
    ("GA", [-85.61, 30.36, -80.84, 35.00]),
    ("HI", [-160.25, 18.91, -154.81, 22.24]),
    ("ID", [-117.24, 41.99, -111.04, 49.00]),
    ("IL", [-91.51, 36.97, -87.49, 42.51]),
    ("IN", [-88.10, 37.77, -84.78, 41.76]),
    ("IA", [-96.64, 40.38, -90.14, 43.50]),
    ("KS", [-102.05, 36.99, -94.59, 40.00]),
    ("KY", [-89.57, 36.50, -81.96, 39.15]),
    ("LA", [-94.04, 28.93, -88.82, 33.02]),
    ("ME", [-71.08, 42.98, -66.95, 47.46]),
    ("MD", [-79.49, 37.91, -75.05, 39.72]),
    ("MA", [-73.51, 41.24, -69.93, 42.89]),
    ("MI", [-90.42, 41.70, -82.13, 48.30]),
    ("MN", [-97.24, 43.50, -89.49, 49.38]),
    ("MS", [-91.66, 30.17, -88.10, 35.00]),
    ("MO", [-95.77, 35.99, -89.10, 40.61]),
    ("MT", [-116.05, 44.36, -104.04, 49.00]),
    ("NE", [-104.05, 40.00, -95.31, 43.00]),
    ("NV", [-120.01, 35.00, -114.04, 42.00]),
    ("NH", [-72.56, 42.70, -70.61, 45.31]),
    ("NJ", [-75.56, 38.93, -73.89, 41.36]),
    ("NM", [-109.05, 31.33, -103.00, 37.00]),
    ("NY", [-79.76, 40.50, -71.86, 45.02]),
    ("NC", [-84.32, 33.84, -75.46, 36.59]),
    ("ND", [-104.05, 45.94, -96.55, 49.00]),
    ("OH", [-84.82, 38.40, -80.52, 41.98]),
    ("OK", [-103.00, 33.62, -94.43, 37.00]),
    ("OR", [-124.57, 41.99, -116.46, 46.29]),
    ("PA", [-80.52, 39.72, -74.69, 42.27]),
    ("RI", [-71.86, 41.15, -71.12, 42.02]),
    ("SC", [-83.35, 32.05, -78.54, 35.22]),
    ("SD", [-104.06, 42.48, -96.44, 45.95]),
    ("TN", [-90.31, 34.98, -81.65, 36.68]),
    ("TX", [-106.65, 25.84, -93.51, 36.50]),
    ("UT", [-114.05, 37.00, -109.04, 42.00]),
    ("VT", [-73.44, 42.73, -71.46, 45.02]),
    ("VA", [-83.68, 36.54, -75.24, 39.47]),
    ("WA", [-124.76, 45.54, -116.92, 49.00]),
    ("WV", [-82.64, 37.20, -77.72, 40.64]),
    ("WI", [-92.89, 42.49, -86.81, 47.08]),
    ("WY", [-111.06, 41.00, -104.05, 45.01]),
];

/// State FIPS codes, keyed by postal abbreviation.
static FIPS: &[(&str, &str)] = &[
    ("AL", "01"),
    ("AK", "02"),
    ("AZ", "04"),
    ("AR", "05"),
    ("CA", "06"),
    ("CO", "08"),
    ("CT", "09"),
    ("DE", "10"),
    ("DC", "11"),
    ("FL", "12"),
    ("GA", "13"),
    ("HI", "15"),
    ("ID", "16"),
    ("IL", "17"),
    ("IN", "18"),
    ("IA", "19"),
    ("KS", "20"),
    ("KY", "21"),
    ("LA", "22"),
    ("ME", "23"),
    ("MD", "24"),
    ("MA", "25"),
    ("MI", "26"),
    ("MN", "27"),
    ("MS", "28"),
    ("MO", "29"),
    ("MT", "30"),
    ("NE", "31"),
    ("NV", "32"),
    ("NH", "33"),
    ("NJ", "34"),
    ("NM", "35"),
    ("NY", "36"),
    ("NC", "37"),
    ("ND", "38"),
    ("OH", "39"),
    ("OK", "40"),
    ("OR", "41"),
    ("PA", "42"),
    ("RI", "44"),
    ("SC", "45"),
    ("SD", "46"),
    ("TN", "47"),
    ("TX", "48"),
    ("UT", "49"),
    ("VT", "50"),
    ("VA", "51"),
    ("WA", "53"),
    ("WV", "54"),
    ("WI", "55"),
    ("WY", "56"),
];

fn lookup_bbox(key: &str) -> Option<Bbox> {
    BBOXES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, b)| Bbox::new(b[0], b[1], b[2], b[3]))
}

pub fn state_bbox(abbr: &str) -> Option<Bbox> {
    lookup_bbox(&abbr.to_uppercase())
}

pub fn state_fips(abbr: &str) -> Option<&'static str> {
    let abbr = abbr.to_uppercase();
    FIPS.iter().find(|(k, _)| *k == abbr).map(|(_, f)| *f)
}

/// Composite geographic identifier for a congressional district:
/// state FIPS followed by the zero-padded district number.
/// CA district 5 -> "0605".
pub fn district_geoid(state: &str, district: u32) -> Option<String> {
    state_fips(state).map(|fips| format!("{fips}{district:02}"))
}

/// Bounding box for a state, or for a district via its composite key when
/// one is present in the table. An unknown composite key falls back to the
/// state entry; an unknown state yields None.
pub fn bbox_for(state: &str, district: Option<u32>) -> Option<Bbox> {
    let state = state.to_uppercase();
    if let Some(d) = district {
        if let Some(bbox) = lookup_bbox(&format!("{state}{d:02}")) {
            return Some(bbox);
        }
    }
    lookup_bbox(&state)
}

/// Boundary polygon layers pushed to the map surface on mount.
pub struct BoundarySet {
    pub states: FeatureCollection,
    pub districts: FeatureCollection,
}

pub fn empty_collection() -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    }
}

/// Load the state and district boundary files from the data directory.
/// A missing or unparseable file degrades to an empty layer with a warning;
/// state features are tagged with per-feature event presence for styling.
pub fn load_boundaries(data_dir: &Path, events: &[EventRecord]) -> BoundarySet {
    let mut states = load_feature_collection(&data_dir.join("states.geojson"))
        .unwrap_or_else(|err| {
            warn!("Failed to load state boundaries: {err:#}");
            empty_collection()
        });
    let mut districts = load_feature_collection(&data_dir.join("districts.geojson"))
        .unwrap_or_else(|err| {
            warn!("Failed to load district boundaries: {err:#}");
            empty_collection()
        });

    tag_state_events(&mut states, events);
    tag_district_events(&mut districts, events);
    BoundarySet { states, districts }
}

fn load_feature_collection(path: &Path) -> Result<FeatureCollection> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    simd_json::serde::from_slice(&mut bytes)
        .with_context(|| format!("parsing {}", path.display()))
}

/// Mark each state feature with whether any event falls in that state,
/// so the surface can style active states differently.
pub fn tag_state_events(states: &mut FeatureCollection, events: &[EventRecord]) {
    states.features.par_iter_mut().for_each(|feature| {
        let has_event = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("ABR"))
            .and_then(|v| v.as_str())
            .map(|abbr| {
                events
                    .iter()
                    .any(|event| event.state.as_deref() == Some(abbr))
            })
            .unwrap_or(false);

        feature
            .properties
            .get_or_insert_with(Default::default)
            .insert("events".to_string(), has_event.into());
    });
}

/// Same tagging for district features, matched by composite GEOID.
pub fn tag_district_events(districts: &mut FeatureCollection, events: &[EventRecord]) {
    districts.features.par_iter_mut().for_each(|feature| {
        let has_event = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("GEOID"))
            .and_then(|v| v.as_str())
            .map(|geoid| {
                events.iter().any(|event| {
                    match (event.state.as_deref(), event.district) {
                        (Some(state), Some(district)) => {
                            district_geoid(state, district).as_deref() == Some(geoid)
                        }
                        _ => false,
                    }
                })
            })
            .unwrap_or(false);

        feature
            .properties
            .get_or_insert_with(Default::default)
            .insert("events".to_string(), has_event.into());
    });
}
