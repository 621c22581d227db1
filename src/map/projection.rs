use crate::geo::{Bbox, LonLat};
use std::f64::consts::PI;

/// Zoom floor applied when focusing a bounding box.
const FOCUS_MIN_ZOOM: f64 = 2.5;
/// Margin subtracted from the raw fitted zoom so the box does not touch
/// the viewport edges.
const FOCUS_ZOOM_MARGIN: f64 = 0.5;
/// Tile scale underlying the fitted-zoom computation.
const TILE_SIZE: f64 = 256.0;

/// Web Mercator x fraction in [0, 1).
#[inline]
fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Web Mercator y fraction in [0, 1); grows southward.
#[inline]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

#[inline]
fn unproject_fraction(x: f64, y: f64) -> LonLat {
    let lon = x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI;
    LonLat::new(lon, lat)
}

/// Center and raw zoom fitting a bounding box into a viewport of the given
/// pixel dimensions, limited by the tighter axis.
pub fn fit(bbox: Bbox, view_width: f64, view_height: f64) -> (LonLat, f64) {
    let x0 = mercator_x(bbox.west);
    let x1 = mercator_x(bbox.east);
    let y0 = mercator_y(bbox.south);
    let y1 = mercator_y(bbox.north);

    let box_width = (x1 - x0).abs();
    let box_height = (y0 - y1).abs();

    let zoom_x = (view_width / (TILE_SIZE * box_width)).log2();
    let zoom_y = (view_height / (TILE_SIZE * box_height)).log2();

    let center = unproject_fraction((x0 + x1) / 2.0, (y0 + y1) / 2.0);
    (center, zoom_x.min(zoom_y))
}

/// Fit a bounding box into a viewport of the given pixel dimensions:
/// center plus zoom, clamped to the 2.5 floor, otherwise backed off by the
/// visual margin. No box means no change of view; a degenerate box
/// propagates whatever the math produces.
pub fn focus(bbox: Option<Bbox>, view_width: f64, view_height: f64) -> Option<(LonLat, f64)> {
    let bbox = bbox?;
    let (center, raw) = fit(bbox, view_width, view_height);

    let zoom = if raw < FOCUS_MIN_ZOOM {
        FOCUS_MIN_ZOOM
    } else {
        raw - FOCUS_ZOOM_MARGIN
    };
    Some((center, zoom))
}

/// Visible map area: center, zoom, and canvas pixel size.
#[derive(Clone, Debug)]
pub struct Viewport {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    pub fn center(&self) -> LonLat {
        LonLat::new(self.center_lon, self.center_lat)
    }

    pub fn set_center(&mut self, center: LonLat) {
        self.center_lon = center.lon;
        self.center_lat = center.lat.clamp(-85.0, 85.0);
    }

    /// Pan by a pixel delta.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / (self.zoom * self.width.max(1) as f64);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5;

        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }
        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(100.0);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(0.5);
    }

    /// Project lon/lat to canvas pixel coordinates.
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = mercator_x(lon);
        let y = mercator_y(lat);
        let center_x = mercator_x(self.center_lon);
        let center_y = mercator_y(self.center_lat);
        let scale = self.zoom * self.width as f64;

        let px = ((x - center_x) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - center_y) * scale + self.height as f64 / 2.0) as i32;
        (px, py)
    }

    /// Inverse of [`project`]: pixel coordinates back to lon/lat.
    pub fn unproject(&self, px: i32, py: i32) -> LonLat {
        let scale = self.zoom * self.width.max(1) as f64;
        let center_x = mercator_x(self.center_lon);
        let center_y = mercator_y(self.center_lat);

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center_x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center_y;
        unproject_fraction(x, y)
    }

    /// Geographic bounds of the currently visible area.
    pub fn bounds(&self) -> Bbox {
        let nw = self.unproject(0, 0);
        let se = self.unproject(self.width as i32, self.height as i32);
        Bbox::new(nw.lon, se.lat, se.lon, nw.lat)
    }

    /// Check if a projected point is within the canvas (with slack for
    /// markers near the edge).
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }
}
