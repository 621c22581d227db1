use crate::events::colors::ColorTable;
use crate::events::model::EventRecord;
use chrono::{DateTime, Utc};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

/// Long-form display stamp for popups, e.g. "February 22, 2018, 6:30 pm".
/// Absent timestamp renders as the empty string.
pub fn format_starts_at(starts_at: Option<DateTime<Utc>>) -> String {
    match starts_at {
        Some(dt) => dt.format("%B %-d, %Y, %-I:%M %P").to_string(),
        None => String::new(),
    }
}

/// Build the renderable marker collection from the current event list.
///
/// Records without a usable latitude are dropped silently. Each feature's
/// icon comes from the shared color table; the returned flag reports
/// whether the table grew or claimed an entry during this batch, so the
/// owner can persist it.
pub fn build_features(
    records: &[EventRecord],
    colors: &mut ColorTable,
) -> (FeatureCollection, bool) {
    let mut changed = false;
    let features = records
        .iter()
        .filter(|record| record.lat.is_some())
        .map(|record| {
            let assignment = colors.assign(&record.icon_flag);
            changed |= assignment.changed;
            event_feature(record, &assignment.icon)
        })
        .collect();

    (
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
        changed,
    )
}

fn event_feature(record: &EventRecord, icon: &str) -> Feature {
    let lat = record.lat.unwrap_or_default();
    let lng = record.lng.unwrap_or_default();

    let mut properties = JsonObject::new();
    properties.insert("address".into(), record.address.clone().into());
    properties.insert(
        "district".into(),
        record.district.map(|d| d.into()).unwrap_or(serde_json::Value::Null),
    );
    properties.insert("icon".into(), icon.into());
    properties.insert("id".into(), record.id.clone().into());
    properties.insert(
        "startsAt".into(),
        format_starts_at(record.starts_at).into(),
    );
    properties.insert(
        "state".into(),
        record
            .state
            .clone()
            .map(Into::into)
            .unwrap_or(serde_json::Value::Null),
    );
    properties.insert("title".into(), record.name.clone().into());
    properties.insert(
        "url".into(),
        record
            .url
            .clone()
            .map(Into::into)
            .unwrap_or(serde_json::Value::Null),
    );
    properties.insert("venue".into(), record.venue.clone().into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![lng, lat]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
