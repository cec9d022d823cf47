// SPDX-License-Identifier: MIT
//
// Cooperative cancellation shared by the engine's workers.
//
// A token is a cheap handle. Cancelling it wakes every waiter and cancels
// every child derived from it. The first reason sticks.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Why a token was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The application asked to exit.
    Exit,
    /// The parent token was cancelled.
    Parent,
    /// A worker failed and took the engine down.
    Failed,
}

#[derive(Debug, Default)]
struct Inner {
    reason: Mutex<Option<CancelReason>>,
    cond: Condvar,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn cancel(&self, reason: CancelReason) {
        {
            let mut slot = self.reason.lock();
            if slot.is_some() {
                return;
            }
            *slot = Some(reason);
        }
        self.cond.notify_all();

        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel(CancelReason::Parent);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token cancelled with [`CancelReason::Parent`] when `self` is.
    /// Cancelling the child leaves the parent alone.
    #[must_use]
    pub fn child(&self) -> Self {
        let child = Self::new();
        if self.is_cancelled() {
            child.inner.cancel(CancelReason::Parent);
            return child;
        }
        let mut children = self.inner.children.lock();
        children.retain(|weak| weak.strong_count() > 0);
        children.push(Arc::downgrade(&child.inner));
        drop(children);

        // The parent may have been cancelled between the check and the push.
        if self.is_cancelled() {
            child.inner.cancel(CancelReason::Parent);
        }
        child
    }

    pub fn cancel(&self, reason: CancelReason) {
        self.inner.cancel(reason);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.reason.lock().is_some()
    }

    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        *self.inner.reason.lock()
    }

    /// Block until cancelled.
    pub fn wait(&self) -> CancelReason {
        let mut slot = self.inner.reason.lock();
        loop {
            if let Some(reason) = *slot {
                return reason;
            }
            self.inner.cond.wait(&mut slot);
        }
    }

    /// Block until cancelled or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<CancelReason> {
        let mut slot = self.inner.reason.lock();
        if slot.is_none() {
            self.inner
                .cond
                .wait_while_for(&mut slot, |reason| reason.is_none(), timeout);
        }
        *slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn starts_live() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert_eq!(token.reason(), None);
    }

    #[test]
    fn first_reason_sticks() {
        let token = CancelToken::new();
        token.cancel(CancelReason::Exit);
        token.cancel(CancelReason::Failed);
        assert_eq!(token.reason(), Some(CancelReason::Exit));
    }

    #[test]
    fn parent_cancels_child() {
        let parent = CancelToken::new();
        let child = parent.child();
        let grandchild = child.child();
        parent.cancel(CancelReason::Exit);
        assert_eq!(child.reason(), Some(CancelReason::Parent));
        assert_eq!(grandchild.reason(), Some(CancelReason::Parent));
    }

    #[test]
    fn child_does_not_cancel_parent() {
        let parent = CancelToken::new();
        let child = parent.child();
        child.cancel(CancelReason::Exit);
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn child_of_cancelled_parent_is_cancelled() {
        let parent = CancelToken::new();
        parent.cancel(CancelReason::Exit);
        assert_eq!(parent.child().reason(), Some(CancelReason::Parent));
    }

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel(CancelReason::Exit);
        assert!(token.is_cancelled());
    }

    #[test]
    fn wait_wakes_on_cancel() {
        let token = CancelToken::new();
        let remote = token.clone();
        let handle = thread::spawn(move || remote.wait());
        thread::sleep(Duration::from_millis(10));
        token.cancel(CancelReason::Exit);
        assert_eq!(handle.join().unwrap(), CancelReason::Exit);
    }

    #[test]
    fn wait_timeout_expires() {
        let token = CancelToken::new();
        let start = Instant::now();
        assert_eq!(token.wait_timeout(Duration::from_millis(20)), None);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
