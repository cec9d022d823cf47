// SPDX-License-Identifier: MIT
//
// Paint helpers shared by the layout strategies.
//
// Each takes the element's style and a rectangle and writes through the
// view's z-gated paint calls. Loops only walk the part of the rectangle
// that lies on the grid.

use n_dom::{Boundary, EdgeMask, Element, Overflow, Scroll};

use crate::view::{AxisMask, Style, View};

/// Fill `rect` with blanks in the element's colors.
pub fn render_base(view: &mut View, style: Style, rect: Boundary) {
    let Some(rect) = rect.intersect(view.boundary()) else {
        return;
    };
    for y in rect.first_y..rect.second_y {
        view.print_rune_repeat(rect.first_x, y, style, rect.width(), AxisMask::X, ' ');
    }
}

/// Box-drawing frame on the outermost cells of `rect`.
pub fn draw_border(view: &mut View, style: Style, rect: Boundary) {
    if rect.is_empty() {
        return;
    }
    let b = rect.indexify();
    view.print_rune_repeat(b.first_x, b.first_y, style, b.width(), AxisMask::X, '─');
    view.print_rune_repeat(b.first_x, b.second_y, style, b.width(), AxisMask::X, '─');
    view.print_rune_repeat(b.first_x, b.first_y, style, b.height(), AxisMask::Y, '│');
    view.print_rune_repeat(b.second_x, b.first_y, style, b.height(), AxisMask::Y, '│');

    view.print_rune(b.first_x, b.first_y, style, '┌');
    view.print_rune(b.second_x, b.first_y, style, '┐');
    view.print_rune(b.first_x, b.second_y, style, '└');
    view.print_rune(b.second_x, b.second_y, style, '┘');
}

/// Vertical scroll indicator on the rightmost content column.
///
/// Returns `rect` with its right edge pulled in by one, the space left for
/// content.
pub fn draw_scrollbar(view: &mut View, style: Style, rect: Boundary, bordered: bool) -> Boundary {
    let track = if bordered { rect.shrink(1) } else { rect };
    if !track.is_empty() {
        let t = track.indexify();
        let half = t.first_y.saturating_add(t.height().saturating_add(1) / 2);
        let last_row = i32::from(view.height()) - 1;
        for y in t.first_y.max(0)..=t.second_y.min(last_row) {
            let rune = if y == t.first_y {
                '▲'
            } else if y == t.second_y {
                '▼'
            } else if y < half {
                '░'
            } else {
                '█'
            };
            view.print_rune(t.second_x, y, style, rune);
        }
    }
    rect.shrink_mask(1, EdgeMask::RIGHT)
}

/// Hard-wrap `text` into `rect`, one char per column.
///
/// Rows above `scroll.y` are left blank and consume no text. Returns the
/// indexed content rectangle with its top edge advanced past the rows that
/// were filled completely.
pub fn wrap_text(view: &mut View, style: Style, text: &str, scroll: Scroll, rect: Boundary, bordered: bool) -> Boundary {
    let rect = if bordered { rect.shrink(1) } else { rect };
    if text.is_empty() || rect.width() < 1 || rect.height() < 1 {
        return rect;
    }

    let rect = rect.indexify();
    let row_len = usize::try_from(rect.width().saturating_add(1)).unwrap_or(0);
    let chars: Vec<char> = text.chars().collect();
    let mut rest = chars.as_slice();
    // Scrolled-past rows count as filled without consuming text.
    let mut rows = scroll.y.clamp(0, rect.height().saturating_add(1));

    for y in rows..=rect.height() {
        let row = rect.first_y.saturating_add(y);
        for (x, &rune) in (0..).zip(rest.iter().take(row_len)) {
            view.print_rune(rect.first_x.saturating_add(x), row, style, rune);
        }
        if rest.len() < row_len {
            break;
        }
        rest = &rest[row_len..];
        rows += 1;
    }
    rect.shrink_mask(rows, EdgeMask::TOP)
}

/// Background, border and scrollbar for `element`. Returns the rectangle
/// left for its content.
pub fn paint_chrome(view: &mut View, style: Style, element: &Element) -> Boundary {
    let rect = element.boundary;
    render_base(view, style, rect);
    if element.attrs.border {
        draw_border(view, style, rect);
    }
    if element.attrs.overflow == Overflow::Scroll {
        draw_scrollbar(view, style, rect, element.attrs.border)
    } else {
        rect
    }
}
