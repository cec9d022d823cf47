// SPDX-License-Identifier: MIT
//
// Flex layout: distributes the container's main axis among its children.
//
// Children with a fixed size on the axis take it first. What is left is
// split by flex share, with one corrective pass for children whose min or
// max bound the share would violate. Rounding is truncating and recomputed
// per child, so the remainder drifts toward later children. The cross axis
// always spans the whole container. Sums saturate, since sizes come straight
// from markup.
//
// `display: absolute` children are left where they are and only enqueued.
// Column containers also honor `scroll.y` (as a child index) and stop once
// the next child would overflow the bottom edge.

use n_dom::{Boundary, Display, ElementId, FlexDirection};
use tracing::trace;

use super::paint::paint_chrome;
use super::{Layout, Pass};
use crate::error::LayoutError;
use crate::view::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    /// Positions itself.
    Ignored,
    /// Size is settled: fixed, or clamped to a bound.
    Calculated,
    /// Takes a slice of the remainder. `constrained` when min or max is set.
    Flexed { constrained: bool },
}

#[derive(Debug, Clone, Copy)]
struct Item {
    id: ElementId,
    kind: Kind,
    share: i32,
    size: i32,
    min: i32,
    max: i32,
}

/// Sizes along the main axis for each child, in child order. Ignored
/// children get `None`, as do children a column cannot fit or has scrolled
/// past.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Distribution {
    sizes: Vec<Option<i32>>,
}

fn distribute(items: &mut [Item], extent: i32, column: bool, scroll_y: i32) -> Distribution {
    let mut remaining = extent;
    let mut shares: i32 = 0;
    for item in items.iter() {
        match item.kind {
            Kind::Calculated => remaining = remaining.saturating_sub(item.size),
            Kind::Flexed { .. } => shares = shares.saturating_add(item.share),
            Kind::Ignored => {}
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let unit = if shares == 0 { 0.0 } else { remaining as f32 / shares as f32 };

    for item in items.iter_mut() {
        if item.kind != (Kind::Flexed { constrained: true }) {
            continue;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        let size = (unit * item.share as f32) as i32;
        let clamp = if item.min > 0 && item.min > size {
            Some(item.min)
        } else if item.max > 0 && item.max < size {
            Some(item.max)
        } else {
            None
        };
        if let Some(bound) = clamp {
            item.kind = Kind::Calculated;
            item.size = bound;
            remaining = remaining.saturating_sub(bound);
            shares = shares.saturating_sub(item.share);
        }
    }

    let mut sizes = vec![None; items.len()];
    let mut offset: i32 = 0;
    let mut allocated: i32 = 0;
    for (index, item) in items.iter().enumerate() {
        if item.kind == Kind::Ignored {
            continue;
        }
        if column && i32::try_from(index).unwrap_or(i32::MAX) < scroll_y {
            continue;
        }
        let size = match item.kind {
            Kind::Calculated => item.size,
            _ if shares == 0 => 0,
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            _ => (remaining.saturating_sub(allocated) as f32 / shares as f32 * item.share as f32) as i32,
        };
        if column && offset.saturating_add(size) > extent {
            break;
        }
        if matches!(item.kind, Kind::Flexed { .. }) {
            shares = shares.saturating_sub(item.share);
            allocated = allocated.saturating_add(size);
        }
        sizes[index] = Some(size);
        offset = offset.saturating_add(size);
    }
    Distribution { sizes }
}

/// Lay `sizes` out end to end inside `area`.
fn place(area: Boundary, direction: FlexDirection, sizes: &[Option<i32>]) -> Vec<Option<Boundary>> {
    let mut offset: i32 = 0;
    sizes
        .iter()
        .map(|size| {
            let size = (*size)?;
            let start = offset;
            let end = offset.saturating_add(size);
            let rect = match direction {
                FlexDirection::Row => Boundary::new(
                    area.first_x.saturating_add(start),
                    area.first_y,
                    area.first_x.saturating_add(end),
                    area.second_y,
                ),
                FlexDirection::RowReverse => Boundary::new(
                    area.second_x.saturating_sub(end),
                    area.first_y,
                    area.second_x.saturating_sub(start),
                    area.second_y,
                ),
                FlexDirection::Column => Boundary::new(
                    area.first_x,
                    area.first_y.saturating_add(start),
                    area.second_x,
                    area.first_y.saturating_add(end),
                ),
                FlexDirection::ColumnReverse => Boundary::new(
                    area.first_x,
                    area.second_y.saturating_sub(end),
                    area.second_x,
                    area.second_y.saturating_sub(start),
                ),
            };
            offset = end;
            Some(rect)
        })
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Flex;

impl Layout for Flex {
    fn layout(&self, pass: &mut Pass<'_>, id: ElementId) -> Result<(), LayoutError> {
        let element = pass
            .tree
            .get(id)
            .ok_or_else(|| LayoutError::unrenderable(id, "element is not in the tree"))?;
        if element.boundary == Boundary::UNSET {
            return Err(LayoutError::unrenderable(id, "container has no boundary"));
        }

        let direction = element.attrs.flex_direction;
        let scroll_y = element.scroll.y;
        let area = paint_chrome(pass.view, Style::of(id, &element.attrs), element);

        let mut items: Vec<Item> = element
            .children()
            .iter()
            .filter_map(|&child| pass.tree.get(child).map(|el| (child, el)))
            .map(|(child, el)| {
                let attrs = &el.attrs;
                let size = attrs.main_size(direction);
                let min = attrs.main_min(direction);
                let max = attrs.main_max(direction);
                let kind = if attrs.display == Display::Absolute {
                    Kind::Ignored
                } else if size != 0 {
                    Kind::Calculated
                } else {
                    Kind::Flexed {
                        constrained: attrs.flex != 0 && (min != 0 || max != 0),
                    }
                };
                Item {
                    id: child,
                    kind,
                    share: attrs.flex,
                    size,
                    min,
                    max,
                }
            })
            .collect();

        let extent = if direction.is_column() { area.height() } else { area.width() };
        let distribution = distribute(&mut items, extent, direction.is_column(), scroll_y);
        let placed = place(area, direction, &distribution.sizes);
        trace!(?id, children = items.len(), %area, "flex");

        for (item, rect) in items.iter().zip(placed) {
            if item.kind != Kind::Ignored {
                if let Some(child) = pass.tree.get_mut(item.id) {
                    child.boundary = rect.unwrap_or(Boundary::UNSET);
                }
                if rect.is_none() {
                    continue;
                }
            }
            pass.stack.push(item.id);
        }
        Ok(())
    }
}
