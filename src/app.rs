use crate::data::BoundarySet;
use crate::events::{ColorEntry, ColorTable, EventRecord};
use crate::geo::{bounds_attr, LonLat};
use crate::map::{
    Callbacks, DistrictPick, MapProps, MapViewController, ScreenPoint, SearchMode, TerminalMap,
    Viewport, ALASKA_INSET_BOUNDS, CONTINENTAL_CENTER, HAWAII_INSET_BOUNDS, INITIAL_ZOOM,
};
use std::sync::mpsc;

/// Owner-side notification produced by controller callbacks, drained once
/// per frame on the interaction thread.
pub enum Notification {
    Coordinates(LonLat),
    District(DistrictPick),
    Reset,
    Colors(ColorTable),
}

/// A state inset panel. Its target bounds are carried as the same
/// comma-separated attribute string the controller parses back on click.
pub struct Inset {
    pub state: &'static str,
    pub bounds_attr: String,
}

/// Application state over one terminal map surface.
pub struct App {
    pub controller: MapViewController<TerminalMap>,
    pub items: Vec<EventRecord>,
    pub props: MapProps,
    pub search_mode: SearchMode,
    pub insets: [Inset; 2],
    pub should_quit: bool,
    /// Terminal size in characters.
    pub term_size: (u16, u16),
    /// Last mouse position for drag tracking.
    pub last_mouse: Option<(u16, u16)>,
    /// Whether the current mouse press turned into a drag.
    pub drag_moved: bool,
    /// Current mouse position for the hover popup.
    pub mouse_pos: Option<(u16, u16)>,
    /// Most recently persisted color table, as reported by the controller.
    pub saved_colors: Option<ColorTable>,
    notifications: mpsc::Receiver<Notification>,
}

/// Seed table: the known category plus one catch-all awaiting its first
/// unmatched category.
fn seed_colors() -> ColorTable {
    ColorTable::new(vec![
        ColorEntry::new(Some("campaign"), "#f7ed54", "campaign"),
        ColorEntry::new(None, "#2b83ba", "general"),
    ])
}

impl App {
    pub fn new(
        width: u16,
        height: u16,
        items: Vec<EventRecord>,
        boundaries: BoundarySet,
    ) -> Self {
        let (pixel_width, pixel_height) = map_pixel_size(width, height);
        let surface = TerminalMap::new(Viewport::new(
            CONTINENTAL_CENTER.lon,
            CONTINENTAL_CENTER.lat,
            INITIAL_ZOOM,
            pixel_width,
            pixel_height,
        ));

        let (tx, rx) = mpsc::channel();
        let callbacks = build_callbacks(tx);

        let mut controller = MapViewController::new(
            surface,
            seed_colors(),
            callbacks,
            (pixel_width as f64, pixel_height as f64),
        );
        let props = MapProps::default();
        controller.mount(&items, props.clone(), boundaries);

        Self {
            controller,
            items,
            props,
            search_mode: SearchMode::Proximity,
            insets: [
                Inset {
                    state: "AK",
                    bounds_attr: bounds_attr(&ALASKA_INSET_BOUNDS),
                },
                Inset {
                    state: "HI",
                    bounds_attr: bounds_attr(&HAWAII_INSET_BOUNDS),
                },
            ],
            should_quit: false,
            term_size: (width, height),
            last_mouse: None,
            drag_moved: false,
            mouse_pos: None,
            saved_colors: None,
            notifications: rx,
        }
    }

    /// Replace the event list (a new fetch landed) and re-render markers.
    pub fn set_items(&mut self, items: Vec<EventRecord>) {
        self.items = items;
        self.props.events_version += 1;
        self.apply_props();
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.term_size = (width, height);
        let (pixel_width, pixel_height) = map_pixel_size(width, height);
        let viewport = &mut self.controller.surface_mut().viewport;
        viewport.width = pixel_width;
        viewport.height = pixel_height;
        self.controller.resize(pixel_width as f64, pixel_height as f64);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.controller.surface_mut().viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.controller.surface_mut().viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.controller.surface_mut().viewport.zoom_out();
    }

    pub fn toggle_search_mode(&mut self) {
        self.search_mode = match self.search_mode {
            SearchMode::Proximity => SearchMode::District,
            SearchMode::District => SearchMode::Proximity,
        };
    }

    /// Clear every selection and restore the national view.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.props.selected_item = None;
        self.props.selected_state = None;
        self.props.district = None;
        self.props.center = None;
        self.apply_props();
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.controller.surface().viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        let viewport = &self.controller.surface().viewport;
        format!(
            "{:.1}°{}, {:.1}°{}",
            viewport.center_lat.abs(),
            if viewport.center_lat >= 0.0 { "N" } else { "S" },
            viewport.center_lon.abs(),
            if viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// A left click, routed to an inset when one is under the cursor,
    /// otherwise to the map according to the active search mode.
    pub fn handle_click(&mut self, col: u16, row: u16) {
        if let Some(index) = self.inset_at(col, row) {
            let attr = self.insets[index].bounds_attr.clone();
            self.controller.inset_click(&attr);
            return;
        }

        let point = cell_to_pixel(col, row);
        let lnglat = self
            .controller
            .surface()
            .viewport
            .unproject(point.x, point.y);
        self.controller.handle_click(point, lnglat, self.search_mode);
    }

    /// Index of the inset panel at a terminal cell, if any.
    pub fn inset_at(&self, col: u16, row: u16) -> Option<usize> {
        crate::ui::inset_rects(self.term_size.0, self.term_size.1)
            .into_iter()
            .enumerate()
            .filter(|_| self.controller.inset_visible())
            .find(|(_, rect)| {
                col >= rect.x
                    && col < rect.x + rect.width
                    && row >= rect.y
                    && row < rect.y + rect.height
            })
            .map(|(i, _)| i)
    }

    pub fn handle_drag(&mut self, x: u16, y: u16) {
        self.drag_moved = true;
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            let zoom = self.controller.surface().viewport.zoom;
            let scale = if zoom < 2.0 {
                2
            } else if zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
        self.drag_moved = false;
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Feature under the mouse cursor, for the hover popup.
    pub fn hovered_feature(&self) -> Option<geojson::Feature> {
        use crate::map::{MapSurface, EVENTS_LAYER};
        let (col, row) = self.mouse_pos?;
        let point = cell_to_pixel(col, row);
        self.controller
            .surface()
            .query_point(EVENTS_LAYER, point)
            .into_iter()
            .next()
    }

    /// Apply selection notifications reported by the controller since the
    /// last frame, then push the resulting props.
    pub fn drain_notifications(&mut self) {
        let mut dirty = false;
        while let Ok(notification) = self.notifications.try_recv() {
            match notification {
                Notification::Coordinates(center) => {
                    self.props.center = Some(center);
                    self.props.selected_state = None;
                    self.props.district = None;
                    dirty = true;
                }
                Notification::District(pick) => {
                    self.props.selected_state = Some(pick.state);
                    self.props.district = pick.district.parse().ok();
                    self.props.center = None;
                    dirty = true;
                }
                Notification::Reset => {
                    self.props.selected_state = None;
                    self.props.district = None;
                    self.props.center = None;
                    dirty = true;
                }
                Notification::Colors(table) => {
                    self.saved_colors = Some(table);
                }
            }
        }
        if dirty {
            self.apply_props();
        }
    }

    fn apply_props(&mut self) {
        self.controller.update(&self.items, self.props.clone());
    }
}

fn build_callbacks(tx: mpsc::Sender<Notification>) -> Callbacks {
    let coords_tx = tx.clone();
    let district_tx = tx.clone();
    let reset_tx = tx.clone();
    Callbacks {
        on_select_coords: Box::new(move |c| {
            let _ = coords_tx.send(Notification::Coordinates(c));
        }),
        on_select_district: Box::new(move |p| {
            let _ = district_tx.send(Notification::District(p));
        }),
        on_reset: Box::new(move || {
            let _ = reset_tx.send(Notification::Reset);
        }),
        on_colors_updated: Box::new(move |table| {
            let _ = tx.send(Notification::Colors(table.clone()));
        }),
    }
}

/// Map area pixel size for a terminal size: the bordered map block loses
/// two columns and three rows, braille doubles and quadruples the rest.
fn map_pixel_size(width: u16, height: u16) -> (usize, usize) {
    let inner_width = (width as usize).saturating_sub(2);
    let inner_height = (height as usize).saturating_sub(3);
    (inner_width * 2, inner_height * 4)
}

/// Convert a terminal cell to braille pixel coordinates, accounting for
/// the one-cell map border.
fn cell_to_pixel(col: u16, row: u16) -> ScreenPoint {
    ScreenPoint::new(
        (col.saturating_sub(1) as i32) * 2,
        (row.saturating_sub(1) as i32) * 4,
    )
}
