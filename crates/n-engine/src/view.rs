// SPDX-License-Identifier: MIT
//
// View: the z-indexed cell grid layouts paint into.
//
// Row-major `Vec<Cell>`, one cell per terminal column. Every paint call
// carries a z-index and only lands on cells whose current z-index is not
// higher, so an overlay painted at z 3 survives a later repaint of the
// page under it at z 0. `clear_boundary` is the only way to lower a cell's
// z-index again.
//
// Coordinates are signed to match `Boundary`. Anything outside the grid is
// skipped.

use bitflags::bitflags;
use n_dom::{Attributes, Boundary, ElementId};
use n_term::{CellColor, CellWriter, OutputBuffer};

// ─── Cell ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub rune: char,
    pub fg: CellColor,
    pub bg: CellColor,
    pub z_index: u8,
    /// Element that last painted here.
    pub element: Option<ElementId>,
}

impl Cell {
    pub const BLANK: Self = Self {
        rune: ' ',
        fg: CellColor::Default,
        bg: CellColor::Default,
        z_index: 0,
        element: None,
    };
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

// ─── Style ──────────────────────────────────────────────────────────────────

/// Colors, z-index and owner applied by one paint call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: CellColor,
    pub bg: CellColor,
    pub z_index: u8,
    pub element: Option<ElementId>,
}

impl Style {
    #[must_use]
    pub const fn new(fg: CellColor, bg: CellColor, z_index: u8) -> Self {
        Self {
            fg,
            bg,
            z_index,
            element: None,
        }
    }

    /// The style an element paints itself with.
    #[must_use]
    pub fn of(id: ElementId, attrs: &Attributes) -> Self {
        Self {
            fg: CellColor::from_palette(attrs.color),
            bg: CellColor::from_palette(attrs.background_color),
            z_index: attrs.z_index,
            element: Some(id),
        }
    }

    fn apply(self, cell: &mut Cell, rune: char) {
        cell.rune = rune;
        cell.fg = self.fg;
        cell.bg = self.bg;
        cell.z_index = self.z_index;
        cell.element = self.element;
    }
}

bitflags! {
    /// Direction for [`View::print_rune_repeat`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AxisMask: u8 {
        const X = 0b01;
        const Y = 0b10;
    }
}

// ─── View ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl View {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; usize::from(width) * usize::from(height)],
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// `(0, 0, width, height)`.
    #[must_use]
    pub fn boundary(&self) -> Boundary {
        Boundary::new(0, 0, i32::from(self.width), i32::from(self.height))
    }

    /// Change the grid size, keeping the overlapping cells.
    pub fn resize(&mut self, width: u16, height: u16) {
        if width == self.width && height == self.height {
            return;
        }
        let mut cells = vec![Cell::BLANK; usize::from(width) * usize::from(height)];
        let keep_w = usize::from(width.min(self.width));
        for y in 0..usize::from(height.min(self.height)) {
            let src = y * usize::from(self.width);
            let dst = y * usize::from(width);
            cells[dst..dst + keep_w].copy_from_slice(&self.cells[src..src + keep_w]);
        }
        self.width = width;
        self.height = height;
        self.cells = cells;
    }

    /// Blank every cell.
    pub fn flush(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        let width = usize::from(self.width);
        (x < width && y < usize::from(self.height)).then(|| y * width + x)
    }

    // ── Painting ────────────────────────────────────────────────────────

    /// Paint `rune` at `(x, y)` unless a higher z-index holds the cell.
    pub fn print_rune(&mut self, x: i32, y: i32, style: Style, rune: char) {
        if let Some(cell) = self.index(x, y).map(|i| &mut self.cells[i]) {
            if style.z_index >= cell.z_index {
                style.apply(cell, rune);
            }
        }
    }

    /// Paint `s` left to right from `(x, y)`, one column per char.
    pub fn print_string(&mut self, x: i32, y: i32, style: Style, s: &str) {
        for (dx, rune) in (0..).zip(s.chars()) {
            self.print_rune(x.saturating_add(dx), y, style, rune);
        }
    }

    /// Paint `n` copies of `rune` from `(x, y)` along `axis`. `X | Y`
    /// fills an `n`×`n` square. Only the cells on the grid are visited.
    pub fn print_rune_repeat(&mut self, x: i32, y: i32, style: Style, n: i32, axis: AxisMask, rune: char) {
        if axis.is_empty() {
            return;
        }
        let rows = if axis.contains(AxisMask::Y) { n } else { 1 };
        let cols = if axis.contains(AxisMask::X) { n } else { 1 };
        let span = Boundary::new(x, y, x.saturating_add(cols), y.saturating_add(rows));
        let Some(span) = span.intersect(self.boundary()) else {
            return;
        };
        for py in span.first_y..span.second_y {
            for px in span.first_x..span.second_x {
                self.print_rune(px, py, style, rune);
            }
        }
    }

    /// Blank `rect` regardless of z-index.
    pub fn clear_boundary(&mut self, rect: Boundary) {
        self.for_each_in(rect, |cell| *cell = Cell::BLANK);
    }

    /// Restyle `rect` without touching the runes.
    pub fn fill_boundary(&mut self, rect: Boundary, fg: CellColor, bg: CellColor) {
        self.for_each_in(rect, |cell| {
            cell.fg = fg;
            cell.bg = bg;
        });
    }

    fn for_each_in(&mut self, rect: Boundary, mut f: impl FnMut(&mut Cell)) {
        let Some(rect) = rect.intersect(self.boundary()) else {
            return;
        };
        for y in rect.first_y..rect.second_y {
            for x in rect.first_x..rect.second_x {
                if let Some(i) = self.index(x, y) {
                    f(&mut self.cells[i]);
                }
            }
        }
    }

    // ── Reading ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn get_cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Up to `len` cells from `(x, y)`, stopping at the end of the row.
    #[must_use]
    pub fn slice(&self, x: i32, y: i32, len: usize) -> &[Cell] {
        let Some(start) = self.index(x, y) else {
            return &[];
        };
        let row_end = start - start % usize::from(self.width) + usize::from(self.width);
        &self.cells[start..row_end.min(start.saturating_add(len))]
    }

    /// Text of row `y`, for tests and debugging.
    #[must_use]
    pub fn row_text(&self, y: i32) -> String {
        self.slice(0, y, usize::from(self.width)).iter().map(|c| c.rune).collect()
    }

    /// Emit every cell of `rect` (clamped to the grid) through `writer`.
    pub fn write_region(&self, rect: Boundary, writer: &mut CellWriter, out: &mut OutputBuffer) {
        let Some(rect) = rect.intersect(self.boundary()) else {
            return;
        };
        let width = usize::try_from(rect.width()).unwrap_or(0);
        for y in rect.first_y..rect.second_y {
            let Ok(row) = u16::try_from(y) else {
                continue;
            };
            for (col, cell) in (rect.first_x..).zip(self.slice(rect.first_x, y, width)) {
                if let Ok(col) = u16::try_from(col) {
                    writer.render(out, col, row, cell.rune, cell.fg, cell.bg);
                }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
