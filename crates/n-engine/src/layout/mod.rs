// SPDX-License-Identifier: MIT
//
// Layout engine.
//
// One strategy per `display` kind. A strategy lays out a single element:
// it paints the element into the view and, for containers, positions the
// children and pushes them onto the render stack so the same drain picks
// them up.

mod block;
mod flex;
pub mod paint;

pub use block::{Absolute, Block};
pub use flex::Flex;

use n_dom::{Display, ElementId, Tree};

use crate::error::LayoutError;
use crate::stack::RenderStack;
use crate::view::View;

/// Everything a strategy may touch while laying out one element.
pub struct Pass<'a> {
    pub tree: &'a mut Tree,
    pub view: &'a mut View,
    pub stack: &'a RenderStack,
}

pub trait Layout {
    /// Position and paint `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Unrenderable`] when `id` is stale or has no
    /// boundary to paint into.
    fn layout(&self, pass: &mut Pass<'_>, id: ElementId) -> Result<(), LayoutError>;
}

/// Dispatches to the strategy named by an element's `display`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Layouts {
    flex: Flex,
    block: Block,
    absolute: Absolute,
}

impl Layouts {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flex: Flex,
            block: Block,
            absolute: Absolute,
        }
    }

    #[must_use]
    pub fn strategy(&self, display: Display) -> &dyn Layout {
        match display {
            Display::Flex => &self.flex,
            Display::Block => &self.block,
            Display::Absolute => &self.absolute,
        }
    }
}

impl Layout for Layouts {
    fn layout(&self, pass: &mut Pass<'_>, id: ElementId) -> Result<(), LayoutError> {
        let display = pass
            .tree
            .get(id)
            .map(|el| el.attrs.display)
            .ok_or_else(|| LayoutError::unrenderable(id, "element is not in the tree"))?;
        self.strategy(display).layout(pass, id)
    }
}
