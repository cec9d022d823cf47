// SPDX-License-Identifier: MIT
//
// Render stack: the queue of elements waiting for layout.
//
// Pushes go to the front, pops come from the back, and an id is never in
// the queue twice: pushing a pending id moves it to the front. The render
// worker therefore drains in oldest-pending order, and an element enqueued
// many times in one tick is laid out once.

use std::collections::VecDeque;

use n_dom::ElementId;
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct RenderStack {
    queue: Mutex<VecDeque<ElementId>>,
}

impl RenderStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `id`, refreshing its position if it is already pending.
    pub fn push(&self, id: ElementId) {
        let mut queue = self.queue.lock();
        if let Some(pos) = queue.iter().position(|&pending| pending == id) {
            queue.remove(pos);
        }
        queue.push_front(id);
    }

    /// Take the oldest pending id.
    pub fn pop(&self) -> Option<ElementId> {
        self.queue.lock().pop_back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.queue.lock().contains(&id)
    }
}
