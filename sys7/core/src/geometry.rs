//! QuickDraw-style points, rectangles and regions

use core::fmt;

/// A global screen coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub v: i16,
    pub h: i16,
}

impl Point {
    pub const ORIGIN: Point = Point { v: 0, h: 0 };

    /// Builds a point from horizontal then vertical coordinates.
    pub const fn new(h: i16, v: i16) -> Self {
        Point { v, h }
    }

    /// Per-axis absolute distance `(dx, dy)`.
    pub fn distance(self, other: Point) -> (u16, u16) {
        (
            (i32::from(self.h) - i32::from(other.h)).unsigned_abs() as u16,
            (i32::from(self.v) - i32::from(other.v)).unsigned_abs() as u16,
        )
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.h, self.v)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Point {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "({}, {})", self.h, self.v);
    }
}

/// Half-open rectangle: contains `top..bottom` by `left..right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub top: i16,
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
}

impl Rect {
    pub const fn new(top: i16, left: i16, bottom: i16, right: i16) -> Self {
        Rect {
            top,
            left,
            bottom,
            right,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.bottom <= self.top || self.right <= self.left
    }

    /// `PtInRect`
    pub const fn contains(&self, pt: Point) -> bool {
        pt.v >= self.top && pt.v < self.bottom && pt.h >= self.left && pt.h < self.right
    }
}

/// A region as a union of rectangles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rect(rect: Rect) -> Self {
        let mut region = Self::new();
        region.add_rect(rect);
        region
    }

    /// Unions `rect` into the region. Empty rectangles are ignored.
    pub fn add_rect(&mut self, rect: Rect) {
        if !rect.is_empty() {
            self.rects.push(rect);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// `PtInRgn`
    pub fn contains(&self, pt: Point) -> bool {
        self.rects.iter().any(|r| r.contains(pt))
    }

    /// Smallest rectangle enclosing the region.
    pub fn bounds(&self) -> Rect {
        let mut iter = self.rects.iter();
        let Some(first) = iter.next() else {
            return Rect::default();
        };
        iter.fold(*first, |acc, r| Rect {
            top: acc.top.min(r.top),
            left: acc.left.min(r.left),
            bottom: acc.bottom.max(r.bottom),
            right: acc.right.max(r.right),
        })
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Region::from_rect(rect)
    }
}
