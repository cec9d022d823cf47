// SPDX-License-Identifier: MIT
//
// n-dom: the document model behind n-tui.
//
// An element tree built from markup, the typed attribute record each element
// carries, the integer rectangles layout assigns, and an index from `id`
// attributes to elements. Nothing here knows about terminals. The engine
// crate owns layout and painting and only reads and writes these types.

pub mod attributes;
pub mod boundary;
pub mod id_index;
pub mod markup;
pub mod tree;

pub use attributes::{
    AttrName, Attributes, Display, FlexDirection, Overflow, Position, TextAlign, TextType,
};
pub use boundary::{Boundary, EdgeMask};
pub use id_index::IdIndex;
pub use markup::{Document, MarkupError, parse_document, parse_fragment};
pub use tree::{Element, ElementId, Placement, Scroll, Tree};
