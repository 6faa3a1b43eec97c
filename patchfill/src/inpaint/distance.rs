use super::image::Pixel;
use super::patch::{Anchor, PatchGrid};

/// Match quality of a patch pair. Lower is better.
///
/// `Invalid` orders after every `Valid` score, so it doubles as an unbounded
/// cutoff and as "no usable match".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Score {
    Valid(u64),
    Invalid,
}

impl Score {
    pub const ZERO: Score = Score::Valid(0);

    #[inline]
    pub fn is_valid(self) -> bool {
        matches!(self, Score::Valid(_))
    }
}

#[inline]
fn squared_difference(a: Pixel, b: Pixel) -> u64 {
    let dr = a.r as i32 - b.r as i32;
    let dg = a.g as i32 - b.g as i32;
    let db = a.b as i32 - b.b as i32;
    (dr * dr + dg * dg + db * db) as u64
}

/// Sum of squared RGB differences between the patch at `pa` in `a` and the
/// patch at `pb` in `b`.
///
/// Only `a`'s side of `mask` is consulted: pixels that are holes there are
/// skipped and the sum is scaled up by the fraction of pixels compared. A
/// patch whose two corners are both holes is `Invalid`. The scan stops with
/// `cutoff` as soon as the running sum reaches it.
pub fn patch_distance(
    a: &[Pixel],
    b: &[Pixel],
    mask: &[Pixel],
    grid: &PatchGrid,
    pa: Anchor,
    pb: Anchor,
    cutoff: Score,
) -> Score {
    if grid.corners_are_holes(mask, pa) {
        return Score::Invalid;
    }

    let mut sum = 0u64;
    let mut holes = 0usize;
    for dy in 0..grid.size {
        let arow = grid.index(pa.x, pa.y + dy);
        let brow = grid.index(pb.x, pb.y + dy);
        for dx in 0..grid.size {
            if mask[arow + dx].is_hole() {
                holes += 1;
                continue;
            }
            sum += squared_difference(a[arow + dx], b[brow + dx]);
        }
        if Score::Valid(sum) >= cutoff {
            return cutoff;
        }
    }

    let coverage = 1.0 - holes as f64 / grid.area() as f64;
    if coverage <= 0.0 {
        return Score::Invalid;
    }
    let scaled = sum as f64 / coverage;
    if !scaled.is_finite() || scaled >= u64::MAX as f64 {
        return Score::Invalid;
    }
    Score::Valid(scaled as u64)
}
