// SPDX-License-Identifier: MIT
//
// Boundary: the integer rectangle every element is laid out into.
//
// Coordinates are signed so that partially scrolled or not-yet-laid-out
// elements can carry negative edges. The second edges are exclusive by
// convention. `indexify` turns them inclusive for code that walks the last
// row or column directly (borders, text). Edge arithmetic saturates, so
// extreme attribute values pin to `i32::MIN`/`i32::MAX`.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Selects which edges [`Boundary::shrink_mask`] and
    /// [`Boundary::inflate_mask`] move.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EdgeMask: u8 {
        const TOP    = 0b0001;
        const BOTTOM = 0b0010;
        const LEFT   = 0b0100;
        const RIGHT  = 0b1000;
    }
}

/// An axis-aligned rectangle in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Boundary {
    pub first_x: i32,
    pub first_y: i32,
    pub second_x: i32,
    pub second_y: i32,
}

impl Boundary {
    /// Boundary of an element that has never been laid out.
    pub const UNSET: Self = Self::new(-1, -1, -1, -1);

    #[inline]
    #[must_use]
    pub const fn new(first_x: i32, first_y: i32, second_x: i32, second_y: i32) -> Self {
        Self {
            first_x,
            first_y,
            second_x,
            second_y,
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(self) -> i32 {
        self.second_x.saturating_sub(self.first_x)
    }

    #[inline]
    #[must_use]
    pub const fn height(self) -> i32 {
        self.second_y.saturating_sub(self.first_y)
    }

    /// True when the rectangle covers no cells.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Make both second edges inclusive.
    #[inline]
    #[must_use]
    pub const fn indexify(self) -> Self {
        Self::new(
            self.first_x,
            self.first_y,
            self.second_x.saturating_sub(1),
            self.second_y.saturating_sub(1),
        )
    }

    /// Clamp the first edges to be at least 1.
    #[must_use]
    pub const fn normalize(self) -> Self {
        let first_x = if self.first_x <= 0 { 1 } else { self.first_x };
        let first_y = if self.first_y <= 0 { 1 } else { self.first_y };
        Self::new(first_x, first_y, self.second_x, self.second_y)
    }

    #[inline]
    #[must_use]
    pub const fn shrink(self, n: i32) -> Self {
        Self::new(
            self.first_x.saturating_add(n),
            self.first_y.saturating_add(n),
            self.second_x.saturating_sub(n),
            self.second_y.saturating_sub(n),
        )
    }

    #[inline]
    #[must_use]
    pub const fn inflate(self, n: i32) -> Self {
        self.shrink(n.saturating_neg())
    }

    /// Move the selected edges inward by `n`.
    #[must_use]
    pub const fn shrink_mask(self, n: i32, mask: EdgeMask) -> Self {
        let mut out = self;
        if mask.contains(EdgeMask::TOP) {
            out.first_y = out.first_y.saturating_add(n);
        }
        if mask.contains(EdgeMask::BOTTOM) {
            out.second_y = out.second_y.saturating_sub(n);
        }
        if mask.contains(EdgeMask::LEFT) {
            out.first_x = out.first_x.saturating_add(n);
        }
        if mask.contains(EdgeMask::RIGHT) {
            out.second_x = out.second_x.saturating_sub(n);
        }
        out
    }

    /// Move the selected edges outward by `n`.
    #[inline]
    #[must_use]
    pub const fn inflate_mask(self, n: i32, mask: EdgeMask) -> Self {
        self.shrink_mask(n.saturating_neg(), mask)
    }

    /// Strict containment: every edge of `other` lies strictly inside.
    #[must_use]
    pub const fn circumscribes(self, other: Self) -> bool {
        self.first_x < other.first_x
            && self.first_y < other.first_y
            && self.second_x > other.second_x
            && self.second_y > other.second_y
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn sum(self, other: Self) -> Self {
        Self::new(
            self.first_x.min(other.first_x),
            self.first_y.min(other.first_y),
            self.second_x.max(other.second_x),
            self.second_y.max(other.second_y),
        )
    }

    /// Overlapping region, or `None` when the two don't share a cell.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let out = Self::new(
            self.first_x.max(other.first_x),
            self.first_y.max(other.first_y),
            self.second_x.min(other.second_x),
            self.second_y.min(other.second_y),
        );
        if out.is_empty() { None } else { Some(out) }
    }

    /// Whether the cell at `(x, y)` lies inside (second edges exclusive).
    #[inline]
    #[must_use]
    pub const fn contains(self, x: i32, y: i32) -> bool {
        x >= self.first_x && x < self.second_x && y >= self.first_y && y < self.second_y
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{}) ({},{})",
            self.first_x, self.first_y, self.second_x, self.second_y
        )
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
