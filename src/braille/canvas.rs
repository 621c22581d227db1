const BRAILLE_BASE: u32 = 0x2800;

/// Braille Unicode canvas for high-resolution terminal graphics.
/// Each character cell is a 2x4 dot grid, so a WxH character area gives
/// an effective resolution of 2W x 4H pixels.
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl BrailleCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reset all dots without reallocating.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Set a dot at pixel coordinates. Out-of-range coordinates are ignored.
    ///
    /// Dot bit layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let cx = x / 2;
        let cy = y / 4;
        if cx >= self.width || cy >= self.height {
            return;
        }

        let bit = match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            _ => 0x80,
        };
        self.cells[cy * self.width + cx] |= bit;
    }

    /// Signed-coordinate variant; negative coordinates are ignored.
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Character at a cell position, or None when the cell has no dots set.
    pub fn cell_char(&self, cx: usize, cy: usize) -> Option<char> {
        if cx >= self.width || cy >= self.height {
            return None;
        }
        let bits = self.cells[cy * self.width + cx];
        if bits == 0 {
            None
        } else {
            char::from_u32(BRAILLE_BASE + bits as u32)
        }
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        (0..self.height)
            .map(|cy| {
                (0..self.width)
                    .map(|cx| self.cell_char(cx, cy).unwrap_or('\u{2800}'))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pixel() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0);
        assert_eq!(canvas.to_string(), "⠁"); // U+2801
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y);
            }
        }
        assert_eq!(canvas.to_string(), "⣿"); // U+28FF
    }

    #[test]
    fn test_empty_cell_is_none() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.set_pixel(0, 0);
        assert!(canvas.cell_char(0, 0).is_some());
        assert!(canvas.cell_char(1, 0).is_none());
    }

    #[test]
    fn test_clear() {
        let mut canvas = BrailleCanvas::new(2, 2);
        canvas.set_pixel(1, 1);
        canvas.clear();
        assert!(canvas.cell_char(0, 0).is_none());
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(10, 10);
        canvas.set_pixel_signed(-1, -1);
        assert!(canvas.cell_char(0, 0).is_none());
    }
}
