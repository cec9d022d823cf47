// SPDX-License-Identifier: MIT
//
// Leaf layouts: Block paints an element inside the boundary its parent
// gave it, Absolute computes its own boundary from `left`/`top`/`width`/
// `height` first. Neither recurses into children.

use n_dom::{Boundary, ElementId};

use super::paint::{paint_chrome, wrap_text};
use super::{Layout, Pass};
use crate::error::LayoutError;
use crate::view::Style;

fn paint_leaf(pass: &mut Pass<'_>, id: ElementId) -> Result<(), LayoutError> {
    let element = pass
        .tree
        .get(id)
        .ok_or_else(|| LayoutError::unrenderable(id, "element is not in the tree"))?;
    if element.boundary == Boundary::UNSET {
        return Err(LayoutError::unrenderable(id, "element has not been positioned"));
    }
    let style = Style::of(id, &element.attrs);
    let content = paint_chrome(pass.view, style, element);
    wrap_text(pass.view, style, &element.content, element.scroll, content, element.attrs.border);
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Block;

impl Layout for Block {
    fn layout(&self, pass: &mut Pass<'_>, id: ElementId) -> Result<(), LayoutError> {
        paint_leaf(pass, id)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Absolute;

impl Layout for Absolute {
    fn layout(&self, pass: &mut Pass<'_>, id: ElementId) -> Result<(), LayoutError> {
        let element = pass
            .tree
            .get_mut(id)
            .ok_or_else(|| LayoutError::unrenderable(id, "element is not in the tree"))?;
        let attrs = &element.attrs;
        element.boundary = Boundary::new(
            attrs.left,
            attrs.top,
            attrs.left.saturating_add(attrs.width),
            attrs.top.saturating_add(attrs.height),
        );
        paint_leaf(pass, id)
    }
}
