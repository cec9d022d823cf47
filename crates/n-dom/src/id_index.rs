// SPDX-License-Identifier: MIT
//
// Id index: `id` attribute to elements, in registration order.
//
// Ids are not required to be unique, so each key maps to a list. The index
// is built in document order when a page loads, then patched as subtrees are
// grafted or detached and as elements change their `id`.

use std::collections::HashMap;

use crate::tree::{ElementId, Tree};

#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    map: HashMap<String, Vec<ElementId>>,
}

impl IdIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index covering every element of `tree`.
    #[must_use]
    pub fn build(tree: &Tree) -> Self {
        let mut index = Self::new();
        index.rebuild(tree);
        index
    }

    /// Discard everything and re-walk `tree` from its root.
    pub fn rebuild(&mut self, tree: &Tree) {
        self.map.clear();
        self.register_subtree(tree, tree.root());
    }

    /// Add `id` and its descendants. Elements without an id are skipped.
    pub fn register_subtree(&mut self, tree: &Tree, id: ElementId) {
        for element_id in tree.descendants(id) {
            let Some(element) = tree.get(element_id) else {
                continue;
            };
            if element.attrs.id.is_empty() {
                continue;
            }
            self.map
                .entry(element.attrs.id.clone())
                .or_default()
                .push(element_id);
        }
    }

    /// Remove `id` and its descendants. Must run before the subtree is
    /// detached from `tree`. Keys left empty are dropped.
    pub fn unregister_subtree(&mut self, tree: &Tree, id: ElementId) {
        for element_id in tree.descendants(id) {
            let Some(element) = tree.get(element_id) else {
                continue;
            };
            let key = &element.attrs.id;
            if key.is_empty() {
                continue;
            }
            if let Some(list) = self.map.get_mut(key) {
                list.retain(|&entry| entry != element_id);
                if list.is_empty() {
                    self.map.remove(key);
                }
            }
        }
    }

    /// Move `element` from key `old` to key `new`. It goes to the back of
    /// the `new` list. Empty keys are neither kept nor created.
    pub fn rename(&mut self, element: ElementId, old: &str, new: &str) {
        if old == new {
            return;
        }
        if let Some(list) = self.map.get_mut(old) {
            list.retain(|&entry| entry != element);
            if list.is_empty() {
                self.map.remove(old);
            }
        }
        if !new.is_empty() {
            self.map.entry(new.to_owned()).or_default().push(element);
        }
    }

    /// Elements carrying `id`, in registration order.
    #[must_use]
    pub fn get(&self, id: &str) -> &[ElementId] {
        self.map.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn contains_key(&self, id: &str) -> bool {
        self.map.contains_key(id)
    }

    /// Number of distinct ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
