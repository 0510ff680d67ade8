use std::fmt;

/// Dot bit for each (x % 2, y % 4) position inside a braille character
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

/// Monochrome canvas backed by Unicode braille patterns (U+2800..U+28FF).
/// Every character holds a 2x4 block of dots.
pub struct BrailleCanvas {
    /// Width in characters
    width: usize,
    /// Height in characters
    height: usize,
    /// One dot pattern per character, row-major
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

    /// Width in dots
    pub fn pixel_width(&self) -> usize {
        self.width * 2
    }

    /// Height in dots
    pub fn pixel_height(&self) -> usize {
        self.height * 4
    }

    #[inline(always)]
    fn slot(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return None;
        }
        Some((cy * self.width + cx, DOT_BITS[x % 2][y % 4]))
    }

    /// Set a dot; anything off the canvas is ignored
    #[inline(always)]
    pub fn set(&mut self, x: i32, y: i32) {
        if let Some((idx, bit)) = self.slot(x, y) {
            self.cells[idx] |= bit;
        }
    }

    pub fn is_set(&self, x: i32, y: i32) -> bool {
        self.slot(x, y)
            .is_some_and(|(idx, bit)| self.cells[idx] & bit != 0)
    }

    /// Rows of braille characters, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.chunks(self.width.max(1)).take(self.height).map(|row| {
            row.iter()
                .map(|&b| char::from_u32(0x2800 + b as u32).unwrap_or(' '))
                .collect()
        })
    }
}

impl fmt::Display for BrailleCanvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(&row)?;
        }
        Ok(())
    }
}
