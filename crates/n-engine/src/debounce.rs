// SPDX-License-Identifier: MIT
//
// Trailing-edge debouncer.
//
// A burst of triggers runs the action once, `window` after the last one.
// The worker thread exits when the debouncer is dropped. A burst still
// waiting at that point is discarded.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::trace;

#[derive(Debug)]
pub struct Debouncer {
    tx: Sender<()>,
    window: Duration,
}

impl Debouncer {
    /// Start the `n-debounce` worker.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<F>(window: Duration, mut action: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<()>();
        thread::Builder::new()
            .name("n-debounce".into())
            .spawn(move || {
                while rx.recv().is_ok() {
                    let mut coalesced = 1usize;
                    loop {
                        match rx.recv_timeout(window) {
                            Ok(()) => coalesced += 1,
                            Err(RecvTimeoutError::Timeout) => {
                                trace!(coalesced, "debounce window elapsed");
                                action();
                                break;
                            }
                            Err(RecvTimeoutError::Disconnected) => return,
                        }
                    }
                }
            })?;
        Ok(Self { tx, window })
    }

    /// Restart the quiet window.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}
