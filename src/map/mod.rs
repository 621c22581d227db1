mod controller;
mod geometry;
mod projection;
mod surface;
mod terminal;

pub use controller::{
    Callbacks, DistrictPick, GeoidSelection, MapProps, MapViewController, SearchMode,
    ALASKA_INSET_BOUNDS, CONTINENTAL_BOUNDS, CONTINENTAL_CENTER, HAWAII_INSET_BOUNDS,
    INITIAL_ZOOM, MAX_BOUNDS,
};
pub use projection::{fit, focus, Viewport};
pub use surface::{
    LayerFilter, MapSurface, ScreenPoint, DISTRICT_INTERACTIVE_LAYER, EVENTS_LAYER,
    SELECTED_BORDER_LAYER, SELECTED_FILL_LAYER, SELECTED_POINT_LAYER, STATES_LAYER,
};
pub use terminal::{Marker, TerminalMap, TerminalScene};
