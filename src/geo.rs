/// A longitude/latitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Geographic bounding box: west/south/east/north in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bbox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bbox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Corner constructor: southwest and northeast points.
    pub fn from_corners(sw: LonLat, ne: LonLat) -> Self {
        Self::new(sw.lon, sw.lat, ne.lon, ne.lat)
    }

    pub fn center(&self) -> LonLat {
        LonLat::new(
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    pub fn contains(&self, p: LonLat) -> bool {
        p.lon >= self.west && p.lon <= self.east && p.lat >= self.south && p.lat <= self.north
    }
}

/// Parse an inset bounds attribute: four comma-separated numbers forming
/// two lon/lat pairs (southwest then northeast). Malformed input yields None.
pub fn parse_bounds_attr(attr: &str) -> Option<Bbox> {
    let mut nums = [0.0f64; 4];
    let mut count = 0;
    for part in attr.split(',') {
        if count >= 4 {
            return None;
        }
        nums[count] = part.trim().parse().ok()?;
        count += 1;
    }
    if count != 4 {
        return None;
    }
    Some(Bbox::from_corners(
        LonLat::new(nums[0], nums[1]),
        LonLat::new(nums[2], nums[3]),
    ))
}

/// Render a bbox back into the comma-separated attribute form.
pub fn bounds_attr(bbox: &Bbox) -> String {
    format!("{},{},{},{}", bbox.west, bbox.south, bbox.east, bbox.north)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounds_attr() {
        let bbox = parse_bounds_attr("-170.15625,51.727,-127.617,71.856").unwrap();
        assert_eq!(bbox.west, -170.15625);
        assert_eq!(bbox.south, 51.727);
        assert_eq!(bbox.east, -127.617);
        assert_eq!(bbox.north, 71.856);
    }

    #[test]
    fn test_parse_bounds_attr_with_spaces() {
        let bbox = parse_bounds_attr("-161.04, 18.54, -154.23, 22.57").unwrap();
        assert_eq!(bbox.north, 22.57);
    }

    #[test]
    fn test_parse_bounds_attr_malformed() {
        assert!(parse_bounds_attr("").is_none());
        assert!(parse_bounds_attr("1,2,3").is_none());
        assert!(parse_bounds_attr("1,2,3,4,5").is_none());
        assert!(parse_bounds_attr("a,b,c,d").is_none());
    }

    #[test]
    fn test_bounds_attr_round_trip() {
        let bbox = Bbox::new(-128.8, 23.6, -65.4, 50.2);
        assert_eq!(parse_bounds_attr(&bounds_attr(&bbox)), Some(bbox));
    }

    #[test]
    fn test_center() {
        let bbox = Bbox::new(-10.0, -4.0, 10.0, 4.0);
        assert_eq!(bbox.center(), LonLat::new(0.0, 0.0));
    }
}
