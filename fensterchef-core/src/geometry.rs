//! Pure arithmetic: points, sizes, rectangles, extents and ratios.
//!
//! Grounded in `pgwm-core/src/geometry/mod.rs` (`Dimensions`, `Line`),
//! generalized to signed coordinates and widened to the full set spec.md
//! §3 names (`Point`, `Size`, `Rectangle`, `Extents`, `Ratio`).

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Hash)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Hash)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// Offsets from the four edges of some containing rectangle, e.g. a dock
/// strut or a gap quad.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Hash)]
pub struct Extents {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

/// A split ratio. `den == 0` means "undefined", which every consumer must
/// treat as 1/2 (spec.md §3).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ratio {
    pub num: u32,
    pub den: u32,
}

impl Ratio {
    pub const HALF: Ratio = Ratio { num: 1, den: 2 };
    pub const UNDEFINED: Ratio = Ratio { num: 0, den: 0 };

    #[must_use]
    pub fn new(num: u32, den: u32) -> Self {
        Ratio { num, den }
    }

    /// `left_size = (ratio.den==0) ? span/2 : (span*ratio.num)/ratio.den`
    /// using a 64-bit intermediate to avoid overflow on large spans.
    #[must_use]
    pub fn apply(&self, span: u32) -> u32 {
        if self.den == 0 {
            span / 2
        } else {
            ((u64::from(span) * u64::from(self.num)) / u64::from(self.den)) as u32
        }
    }

    /// Derive a ratio from two observed lengths, used by
    /// `resize_ignoring_ratio` to preserve the *current* proportion.
    #[must_use]
    pub fn from_lengths(left: u32, total: u32) -> Self {
        if total == 0 {
            Ratio::UNDEFINED
        } else {
            Ratio::new(left, total)
        }
    }
}

/// Bit-gravity constants as defined by the X11 protocol, used to anchor a
/// window's geometry relative to a monitor (spec.md §4.B "Gravity
/// adjustment").
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BitGravity {
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Rectangle {
    #[must_use]
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Rectangle { x, y, w, h }
    }

    #[must_use]
    pub fn right(&self) -> i32 {
        self.x + self.w as i32
    }

    #[must_use]
    pub fn bottom(&self) -> i32 {
        self.y + self.h as i32
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point {
            x: self.x + (self.w / 2) as i32,
            y: self.y + (self.h / 2) as i32,
        }
    }

    #[must_use]
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    #[must_use]
    pub fn contains_rect(&self, other: &Rectangle) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns the size of the intersection, or `None` if the rectangles
    /// do not overlap. Used by monitor lookup and window-over-monitor
    /// detection (spec.md §4.A).
    #[must_use]
    pub fn overlap(&self, other: &Rectangle) -> Option<Size> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left < right && top < bottom {
            Some(Size {
                w: (right - left) as u32,
                h: (bottom - top) as u32,
            })
        } else {
            None
        }
    }

    #[must_use]
    pub fn overlap_area(&self, other: &Rectangle) -> u64 {
        self.overlap(other)
            .map(|s| u64::from(s.w) * u64::from(s.h))
            .unwrap_or(0)
    }

    /// Shrink the rectangle by `extents`, clamping width/height to 0 if
    /// the extents exceed the span on either axis.
    #[must_use]
    pub fn shrink(&self, extents: &Extents) -> Rectangle {
        let x = self.x + extents.left;
        let y = self.y + extents.top;
        let w = (self.w as i64 - i64::from(extents.left) - i64::from(extents.right)).max(0) as u32;
        let h = (self.h as i64 - i64::from(extents.top) - i64::from(extents.bottom)).max(0) as u32;
        Rectangle { x, y, w, h }
    }

    /// Compute the top-left corner such that `gravity` holds relative to
    /// `self` for a window of `size` (spec.md §4.B).
    #[must_use]
    pub fn at_gravity(&self, gravity: BitGravity, size: Size) -> Point {
        use BitGravity::{Center, East, North, NorthEast, NorthWest, South, SouthEast, SouthWest, West};
        let (w, h) = (size.w as i32, size.h as i32);
        let (x, y) = match gravity {
            NorthWest => (self.x, self.y),
            North => (self.x + (self.w as i32 - w) / 2, self.y),
            NorthEast => (self.right() - w, self.y),
            West => (self.x, self.y + (self.h as i32 - h) / 2),
            Center => (
                self.x + (self.w as i32 - w) / 2,
                self.y + (self.h as i32 - h) / 2,
            ),
            East => (self.right() - w, self.y + (self.h as i32 - h) / 2),
            SouthWest => (self.x, self.bottom() - h),
            South => (self.x + (self.w as i32 - w) / 2, self.bottom() - h),
            SouthEast => (self.right() - w, self.bottom() - h),
        };
        Point { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_fallback_is_half() {
        assert_eq!(Ratio::UNDEFINED.apply(801), 400);
    }

    #[test]
    fn ratio_applies_num_over_den() {
        assert_eq!(Ratio::new(1, 3).apply(900), 300);
    }

    #[test]
    fn overlap_detects_disjoint() {
        let a = Rectangle::new(0, 0, 10, 10);
        let b = Rectangle::new(20, 20, 10, 10);
        assert_eq!(a.overlap(&b), None);
    }

    #[test]
    fn overlap_returns_intersection_size() {
        let a = Rectangle::new(0, 0, 10, 10);
        let b = Rectangle::new(5, 5, 10, 10);
        assert_eq!(a.overlap(&b), Some(Size { w: 5, h: 5 }));
    }

    #[test]
    fn shrink_clamps_to_zero() {
        let r = Rectangle::new(0, 0, 10, 10);
        let e = Extents {
            left: 20,
            right: 0,
            top: 0,
            bottom: 0,
        };
        let shrunk = r.shrink(&e);
        assert_eq!(shrunk.w, 0);
    }

    #[test]
    fn gravity_center_centers_smaller_size() {
        let r = Rectangle::new(0, 0, 100, 100);
        let p = r.at_gravity(BitGravity::Center, Size { w: 20, h: 20 });
        assert_eq!(p, Point { x: 40, y: 40 });
    }
}
