// SPDX-License-Identifier: MIT
//
// Element tree: nodes stored in a `SlotMap`.
//
// Children are owned by their parent through id lists. Every node also keeps
// a non-owning parent id for walking up. Keys are versioned, so a handle to a
// removed element resolves to `None` instead of aliasing whatever later
// reuses the slot.

use slotmap::{SlotMap, new_key_type};

use crate::attributes::Attributes;
use crate::boundary::Boundary;

// ─── Ids ────────────────────────────────────────────────────────────────────

new_key_type! {
    /// Handle to an element inside a [`Tree`].
    pub struct ElementId;
}

/// Which end of a child list an insertion goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Front,
    Back,
}

// ─── Element ────────────────────────────────────────────────────────────────

/// Scroll offset of an element's content, in cells (or children for
/// flex columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scroll {
    pub x: i32,
    pub y: i32,
}

impl Scroll {
    pub const fn scroll_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub const fn scroll_by(&mut self, dx: i32, dy: i32) {
        self.x += dx;
        self.y += dy;
    }
}

/// One node of the document.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub content: String,
    pub attrs: Attributes,
    pub boundary: Boundary,
    pub scroll: Scroll,
    children: Vec<ElementId>,
    parent: Option<ElementId>,
}

impl Element {
    #[must_use]
    pub fn new(name: impl Into<String>, attrs: Attributes) -> Self {
        Self {
            name: name.into(),
            content: String::new(),
            attrs,
            boundary: Boundary::UNSET,
            scroll: Scroll::default(),
            children: Vec::new(),
            parent: None,
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<ElementId> {
        self.parent
    }
}

// ─── Tree ───────────────────────────────────────────────────────────────────

/// An arena holding one rooted element tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: SlotMap<ElementId, Element>,
    root: ElementId,
}

impl Tree {
    /// Create a tree holding only `root`.
    #[must_use]
    pub fn new(root: Element) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(root);
        Self { nodes, root }
    }

    #[inline]
    #[must_use]
    pub const fn root(&self) -> ElementId {
        self.root
    }

    /// Number of live elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.nodes.get_mut(id)
    }

    /// Children of `id`, or an empty slice for a stale id.
    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map(Element::children).unwrap_or_default()
    }

    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(Element::parent)
    }

    /// Insert `element` as a child of `parent`. Returns `None` when `parent`
    /// is stale.
    pub fn insert_child(
        &mut self,
        parent: ElementId,
        mut element: Element,
        at: Placement,
    ) -> Option<ElementId> {
        if !self.contains(parent) {
            return None;
        }
        element.parent = Some(parent);
        element.children.clear();
        let id = self.nodes.insert(element);
        self.link(parent, id, at);
        Some(id)
    }

    /// Move every element of `other` under `parent`, keeping its shape.
    /// Returns the new id of `other`'s root.
    pub fn graft(&mut self, parent: ElementId, mut other: Self, at: Placement) -> Option<ElementId> {
        if !self.contains(parent) {
            return None;
        }
        let other_root = other.root;
        let root = self.graft_node(&mut other, other_root, parent)?;
        self.link(parent, root, at);
        Some(root)
    }

    fn graft_node(&mut self, other: &mut Self, id: ElementId, parent: ElementId) -> Option<ElementId> {
        let mut element = other.nodes.remove(id)?;
        let children = std::mem::take(&mut element.children);
        element.parent = Some(parent);
        let new_id = self.nodes.insert(element);
        let mut grafted = Vec::with_capacity(children.len());
        for child in children {
            if let Some(child) = self.graft_node(other, child, new_id) {
                grafted.push(child);
            }
        }
        if let Some(node) = self.get_mut(new_id) {
            node.children = grafted;
        }
        Some(new_id)
    }

    /// Move `id` and its descendants out into a tree of their own, rooted
    /// at `id`. The root cannot be split off.
    pub fn split_off(&mut self, id: ElementId) -> Option<Self> {
        if id == self.root || !self.contains(id) {
            return None;
        }
        self.unlink(id);
        let mut root = self.nodes.remove(id)?;
        let children = std::mem::take(&mut root.children);
        root.parent = None;

        let mut out = Self::new(root);
        let new_root = out.root;
        let grafted = children
            .into_iter()
            .filter_map(|child| out.graft_node(self, child, new_root))
            .collect();
        if let Some(node) = out.get_mut(new_root) {
            node.children = grafted;
        }
        Some(out)
    }

    /// Splice `id` out of its parent and free it with all descendants.
    /// Returns the removed element. The root cannot be detached.
    pub fn detach(&mut self, id: ElementId) -> Option<Element> {
        if id == self.root || !self.contains(id) {
            return None;
        }
        self.unlink(id);
        for descendant in self.descendants(id).into_iter().skip(1) {
            self.nodes.remove(descendant);
        }
        self.nodes.remove(id)
    }

    /// `id` followed by all its descendants, pre-order.
    #[must_use]
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(element) = self.get(next) else {
                continue;
            };
            out.push(next);
            stack.extend(element.children.iter().rev());
        }
        out
    }

    /// Re-apply inherited attributes from `id` down through its subtree.
    pub fn propagate_inherited(&mut self, id: ElementId) {
        let mut stack = vec![id];
        while let Some(parent) = stack.pop() {
            let Some(element) = self.get(parent) else {
                continue;
            };
            let attrs = element.attrs.clone();
            let children = element.children.clone();
            for &child in &children {
                if let Some(node) = self.get_mut(child) {
                    node.attrs.inherit_from(&attrs);
                }
            }
            stack.extend(children);
        }
    }

    // ── Links ───────────────────────────────────────────────────────

    fn unlink(&mut self, id: ElementId) {
        if let Some(node) = self.parent(id).and_then(|parent| self.get_mut(parent)) {
            node.children.retain(|&child| child != id);
        }
    }

    fn link(&mut self, parent: ElementId, child: ElementId, at: Placement) {
        if let Some(node) = self.get_mut(parent) {
            match at {
                Placement::Front => node.children.insert(0, child),
                Placement::Back => node.children.push(child),
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
