use super::image::Pixel;

/// Top-left corner of a patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Anchor {
    pub x: usize,
    pub y: usize,
}

impl Anchor {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Patch geometry over a fixed-size image.
///
/// All engine buffers are flat row-major arrays of `width * height` entries;
/// a patch anchored at (x, y) covers `[x, x + size) x [y, y + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchGrid {
    pub width: usize,
    pub height: usize,
    pub size: usize,
}

impl PatchGrid {
    /// `size` must be in `1..=min(width, height)`.
    pub fn new(width: usize, height: usize, size: usize) -> Self {
        assert!(size >= 1 && size <= width && size <= height);
        Self { width, height, size }
    }

    /// Number of valid anchor columns (`width - size + 1`).
    #[inline]
    pub fn anchor_width(&self) -> usize {
        self.width - self.size + 1
    }

    /// Number of valid anchor rows (`height - size + 1`).
    #[inline]
    pub fn anchor_height(&self) -> usize {
        self.height - self.size + 1
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.size * self.size
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn anchor_index(&self, a: Anchor) -> usize {
        self.index(a.x, a.y)
    }

    /// Whether both the top-left and bottom-right pixels of the patch at `a`
    /// are holes. Such patches are neither refined nor blended.
    #[inline]
    pub fn corners_are_holes(&self, mask: &[Pixel], a: Anchor) -> bool {
        let far = self.size - 1;
        mask[self.index(a.x, a.y)].is_hole() && mask[self.index(a.x + far, a.y + far)].is_hole()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_range() {
        let grid = PatchGrid::new(10, 6, 3);
        assert_eq!(grid.anchor_width(), 8);
        assert_eq!(grid.anchor_height(), 4);
        assert_eq!(grid.area(), 9);
        assert_eq!(grid.pixel_count(), 60);
    }

    #[test]
    fn single_pixel_patches_cover_every_pixel() {
        let grid = PatchGrid::new(4, 4, 1);
        assert_eq!(grid.anchor_width(), 4);
        assert_eq!(grid.anchor_height(), 4);
    }

    #[test]
    fn corner_test_needs_both_corners() {
        let grid = PatchGrid::new(4, 4, 2);
        let mut mask = vec![Pixel::BLACK; 16];
        mask[grid.index(1, 1)] = Pixel::gray(255);
        assert!(!grid.corners_are_holes(&mask, Anchor::new(1, 1)));
        assert!(!grid.corners_are_holes(&mask, Anchor::new(0, 0)));
        mask[grid.index(2, 2)] = Pixel::gray(255);
        assert!(grid.corners_are_holes(&mask, Anchor::new(1, 1)));
    }

    #[test]
    #[should_panic]
    fn patch_larger_than_image_panics() {
        PatchGrid::new(4, 2, 3);
    }
}
