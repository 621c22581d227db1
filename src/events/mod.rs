mod colors;
mod features;
mod fetch;
mod model;

pub use colors::{Assignment, ColorEntry, ColorTable, FALLBACK_COLOR, FALLBACK_ICON};
pub use features::{build_features, format_starts_at};
pub use fetch::{abortable_fetch, fetch_events, fetch_events_from, prepare};
pub use model::{EventRecord, RawEvent};
