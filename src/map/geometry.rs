use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm.
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a small cross marker.
pub fn draw_marker(canvas: &mut BrailleCanvas, x: i32, y: i32, size: i32) {
    for i in -size..=size {
        canvas.set_pixel_signed(x + i, y);
        canvas.set_pixel_signed(x, y + i);
    }
}

/// Ray-casting containment test against a polygon ring of lon/lat pairs.
/// The ring may be open or closed; points on an edge count as inside
/// closely enough for hit testing.
pub fn point_in_ring(lon: f64, lat: f64, ring: &[Vec<f64>]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);

        let crosses = (yi > lat) != (yj > lat)
            && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi;
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Containment test against a GeoJSON geometry. Only Polygon and
/// MultiPolygon exteriors participate; holes are ignored, which is enough
/// for boundary hit testing.
pub fn point_in_geometry(lon: f64, lat: f64, geometry: &geojson::Geometry) -> bool {
    match &geometry.value {
        geojson::Value::Polygon(rings) => rings
            .first()
            .map(|ring| point_in_ring(lon, lat, ring))
            .unwrap_or(false),
        geojson::Value::MultiPolygon(polygons) => polygons.iter().any(|rings| {
            rings
                .first()
                .map(|ring| point_in_ring(lon, lat, ring))
                .unwrap_or(false)
        }),
        _ => false,
    }
}
