#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An 8-bit RGB pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Construct a gray pixel with all channels equal to `v`.
    pub const fn gray(v: u8) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// Whether this mask pixel marks unknown content.
    ///
    /// Any value other than exact black is a hole; there is no partial weighting.
    #[inline]
    pub fn is_hole(self) -> bool {
        self != Pixel::BLACK
    }
}

/// RGB image with row-major pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub buf: Vec<Pixel>,
}

impl RgbImage {
    /// Create a new all-black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Pixel::BLACK)
    }

    /// Create an image with every pixel set to `px`.
    pub fn filled(width: u32, height: u32, px: Pixel) -> Self {
        let buf = vec![px; width as usize * height as usize];
        Self { width, height, buf }
    }

    /// Create an image from existing pixel data.
    ///
    /// `buf` must contain exactly `width * height` pixels.
    pub fn from_buf(width: u32, height: u32, buf: Vec<Pixel>) -> Self {
        assert_eq!(buf.len(), width as usize * height as usize);
        Self { width, height, buf }
    }

    /// Create an image from packed `[R,G,B, R,G,B, ...]` bytes.
    ///
    /// Returns `None` if `data` is not `3 * width * height` bytes long.
    pub fn from_rgb_bytes(width: u32, height: u32, data: &[u8]) -> Option<Self> {
        if data.len() != 3 * width as usize * height as usize {
            return None;
        }
        let buf = data
            .chunks_exact(3)
            .map(|c| Pixel::new(c[0], c[1], c[2]))
            .collect();
        Some(Self { width, height, buf })
    }

    /// Create an image from packed `[R,G,B,A, ...]` bytes, discarding alpha.
    ///
    /// Returns `None` if `data` is not `4 * width * height` bytes long.
    pub fn from_rgba_bytes(width: u32, height: u32, data: &[u8]) -> Option<Self> {
        if data.len() != 4 * width as usize * height as usize {
            return None;
        }
        let buf = data
            .chunks_exact(4)
            .map(|c| Pixel::new(c[0], c[1], c[2]))
            .collect();
        Some(Self { width, height, buf })
    }

    /// Pack pixels as `[R,G,B, ...]` bytes.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.buf.iter().flat_map(|p| [p.r, p.g, p.b]).collect()
    }

    /// Pack pixels as opaque `[R,G,B,255, ...]` bytes.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.buf.iter().flat_map(|p| [p.r, p.g, p.b, 255]).collect()
    }

    /// Flat buffer index of (x, y).
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Pixel {
        self.buf[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, px: Pixel) {
        let i = self.index(x, y);
        self.buf[i] = px;
    }

    /// Number of pixels that are holes when this image is read as a mask.
    pub fn hole_count(&self) -> usize {
        self.buf.iter().filter(|p| p.is_hole()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_black_image() {
        let img = RgbImage::new(10, 8);
        assert_eq!(img.width, 10);
        assert_eq!(img.height, 8);
        assert_eq!(img.buf.len(), 80);
        assert_eq!(img.hole_count(), 0);
    }

    #[test]
    fn get_set_pixel() {
        let mut img = RgbImage::new(4, 4);
        img.set(2, 3, Pixel::new(1, 2, 3));
        assert_eq!(img.get(2, 3), Pixel::new(1, 2, 3));
        assert_eq!(img.get(0, 0), Pixel::BLACK);
        assert_eq!(img.index(2, 3), 14);
    }

    #[test]
    fn any_non_black_is_hole() {
        assert!(!Pixel::BLACK.is_hole());
        assert!(Pixel::new(1, 0, 0).is_hole());
        assert!(Pixel::new(0, 0, 1).is_hole());
        assert!(Pixel::gray(255).is_hole());
    }

    #[test]
    fn rgb_bytes_layout() {
        let data = [1, 2, 3, 4, 5, 6];
        let img = RgbImage::from_rgb_bytes(2, 1, &data).unwrap();
        assert_eq!(img.get(0, 0), Pixel::new(1, 2, 3));
        assert_eq!(img.get(1, 0), Pixel::new(4, 5, 6));
        assert_eq!(img.to_rgb_bytes(), data);
    }

    #[test]
    fn rgba_bytes_drop_and_restore_alpha() {
        let data = [10, 20, 30, 0, 40, 50, 60, 128];
        let img = RgbImage::from_rgba_bytes(1, 2, &data).unwrap();
        assert_eq!(img.get(0, 1), Pixel::new(40, 50, 60));
        assert_eq!(img.to_rgba_bytes(), vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn wrong_byte_length_rejected() {
        assert!(RgbImage::from_rgb_bytes(2, 2, &[0; 11]).is_none());
        assert!(RgbImage::from_rgba_bytes(2, 2, &[0; 12]).is_none());
    }

    #[test]
    #[should_panic]
    fn from_buf_checks_length() {
        RgbImage::from_buf(3, 3, vec![Pixel::BLACK; 8]);
    }
}
