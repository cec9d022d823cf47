// SPDX-License-Identifier: MIT
//
// Engine: owns the scene and drives the workers.
//
// `Engine` is a cheap handle over shared state. Application code keeps a
// clone, mutates elements through it and reads input events from it, while
// `start` runs the input watcher and the render worker until the engine is
// cancelled.
//
// Locking: every tree mutation happens under the scene lock, together with
// the matching render-stack push. The render worker takes the same lock for
// one whole tick, so it never sees a half-applied change.

use std::io::Read;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use n_dom::{Boundary, Document, Element, ElementId, IdIndex, Placement, Tree, parse_document};
use n_term::{Backend, Event, Size};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::cancel::{CancelReason, CancelToken};
use crate::config::EngineConfig;
use crate::debounce::Debouncer;
use crate::error::EngineError;
use crate::stack::RenderStack;
use crate::view::View;
use crate::worker;

/// How often a blocked [`Engine::poll_event`] checks for shutdown.
const POLL_SLICE: Duration = Duration::from_millis(50);

/// The document and its id lookup, guarded together.
#[derive(Debug)]
pub struct Scene {
    pub document: Document,
    pub ids: IdIndex,
}

impl Scene {
    #[must_use]
    pub fn new(document: Document) -> Self {
        let ids = IdIndex::build(&document.tree);
        Self { document, ids }
    }

    #[inline]
    #[must_use]
    pub const fn tree(&self) -> &Tree {
        &self.document.tree
    }

    #[inline]
    pub const fn tree_mut(&mut self) -> &mut Tree {
        &mut self.document.tree
    }
}

/// Messages to the render worker, which owns the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Blank a region and repaint it on the next flush.
    Clear(Boundary),
    /// Resize the view to the new window and clear the terminal.
    Resize(Size),
}

pub(crate) struct Shared {
    pub(crate) scene: Mutex<Scene>,
    pub(crate) view: Mutex<View>,
    pub(crate) stack: RenderStack,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) config: EngineConfig,
    pub(crate) commands: Sender<Command>,
    pub(crate) command_rx: Mutex<Receiver<Command>>,
    pub(crate) events: SyncSender<Event>,
    event_rx: Mutex<Receiver<Event>>,
    token: Mutex<Option<CancelToken>>,
    debouncer: Option<Debouncer>,
}

impl Shared {
    /// Debounced reload trigger.
    pub(crate) fn reload(&self) {
        if let Some(debouncer) = &self.debouncer {
            debouncer.trigger();
        }
    }

    /// Re-read the window size and relayout from the root.
    pub(crate) fn reload_now(&self) {
        let size = match self.backend.window_size() {
            Ok(size) => size,
            Err(err) => {
                warn!(error = %err, "reload skipped: window size unavailable");
                return;
            }
        };
        info!(cols = size.cols, rows = size.rows, "reload");

        let mut scene = self.scene.lock();
        let _ = self.commands.send(Command::Resize(size));
        let root = scene.tree().root();
        if let Some(body) = scene.tree_mut().get_mut(root) {
            body.boundary = Boundary::new(0, 0, i32::from(size.cols), i32::from(size.rows));
        }
        self.stack.push(root);
    }
}

/// Handle to a running (or ready to run) terminal UI.
#[derive(Clone)]
pub struct Engine {
    pub(crate) shared: Arc<Shared>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("config", &self.shared.config).finish_non_exhaustive()
    }
}

impl Engine {
    /// Read a markup document from `reader` and build an engine for it.
    ///
    /// # Errors
    ///
    /// Fails on unreadable input, invalid markup, or when the terminal size
    /// cannot be queried.
    pub fn from_template(
        mut reader: impl Read,
        backend: Arc<dyn Backend>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let mut src = String::new();
        reader.read_to_string(&mut src)?;
        Self::new(parse_document(&src)?, backend, config)
    }

    /// Build an engine for `document`, sized to the backend's window.
    ///
    /// # Errors
    ///
    /// Fails when the terminal size cannot be queried or the debounce
    /// worker cannot be spawned.
    pub fn new(mut document: Document, backend: Arc<dyn Backend>, config: EngineConfig) -> Result<Self, EngineError> {
        let size = backend.window_size().map_err(EngineError::Terminal)?;
        let view = View::new(size.cols, size.rows);
        let root = document.tree.root();
        if let Some(body) = document.tree.get_mut(root) {
            body.boundary = view.boundary();
        }

        let (commands, command_rx) = mpsc::channel();
        let (events, event_rx) = mpsc::sync_channel(config.event_capacity);

        let mut spawn_error = None;
        let shared = Arc::new_cyclic(|weak: &Weak<Shared>| {
            let weak = weak.clone();
            let debouncer = Debouncer::spawn(config.debounce_window(), move || {
                if let Some(shared) = weak.upgrade() {
                    shared.reload_now();
                }
            })
            .map_err(|err| spawn_error = Some(err))
            .ok();
            Shared {
                scene: Mutex::new(Scene::new(document)),
                view: Mutex::new(view),
                stack: RenderStack::new(),
                backend,
                config,
                commands,
                command_rx: Mutex::new(command_rx),
                events,
                event_rx: Mutex::new(event_rx),
                token: Mutex::new(None),
                debouncer,
            }
        });
        if let Some(err) = spawn_error {
            return Err(EngineError::WorkerSpawn(err));
        }
        Ok(Self { shared })
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Run until `parent` is cancelled or [`exit`](Self::exit) is called.
    ///
    /// Clears the terminal, starts the `n-input` and `n-render` workers,
    /// enqueues the root and blocks. Returns why it stopped.
    ///
    /// # Errors
    ///
    /// Fails when the terminal cannot be cleared or a worker cannot be
    /// spawned.
    pub fn start(&self, parent: &CancelToken) -> Result<CancelReason, EngineError> {
        let token = parent.child();
        *self.shared.token.lock() = Some(token.clone());
        info!(
            tick_us = self.shared.config.tick_interval_us,
            debounce_ms = self.shared.config.debounce_ms,
            "engine starting"
        );

        self.shared.backend.clear().map_err(EngineError::Terminal)?;

        let input = {
            let shared = Arc::clone(&self.shared);
            let token = token.clone();
            thread::Builder::new()
                .name("n-input".into())
                .spawn(move || worker::watch_input(&shared, &token))
                .map_err(EngineError::WorkerSpawn)?
        };

        let render = {
            let shared = Arc::clone(&self.shared);
            let token = token.clone();
            thread::Builder::new()
                .name("n-render".into())
                .spawn(move || worker::render_loop(&shared, &token))
        };
        let render = match render {
            Ok(handle) => handle,
            Err(err) => {
                token.cancel(CancelReason::Failed);
                let _ = input.join();
                return Err(EngineError::WorkerSpawn(err));
            }
        };

        {
            let scene = self.shared.scene.lock();
            self.shared.stack.push(scene.tree().root());
        }

        let reason = token.wait();
        for (name, handle) in [("n-input", input), ("n-render", render)] {
            if handle.join().is_err() {
                error!(worker = name, "worker panicked");
            }
        }
        info!(?reason, "engine stopped");
        Ok(reason)
    }

    /// Restore the terminal and stop [`start`](Self::start).
    pub fn exit(&self) {
        info!("exit requested");
        if let Err(err) = self.shared.backend.close() {
            warn!(error = %err, "closing the terminal failed");
        }
        if let Some(token) = self.shared.token.lock().as_ref() {
            token.cancel(CancelReason::Exit);
        }
    }

    /// Recompute the root boundary from the window size and relayout,
    /// once the debounce window passes without another call.
    pub fn reload(&self) {
        self.shared.reload();
    }

    // ── Invalidation ────────────────────────────────────────────────────

    /// Schedule `id` for layout on the next tick.
    pub fn update(&self, id: ElementId) {
        self.shared.stack.push(id);
    }

    /// Mutate `id` and schedule it, atomically with respect to rendering.
    /// A changed `attrs.id` is re-indexed. Returns `None` when `id` is
    /// stale.
    pub fn modify<R>(&self, id: ElementId, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        let mut scene = self.shared.scene.lock();
        let Scene { document, ids } = &mut *scene;
        let element = document.tree.get_mut(id)?;
        let before = element.attrs.id.clone();
        let out = f(element);
        if element.attrs.id != before {
            ids.rename(id, &before, &element.attrs.id);
        }
        self.shared.stack.push(id);
        Some(out)
    }

    /// Run `f` with the scene locked. Changes to `attrs.id` made here are
    /// not re-indexed; use [`modify`](Self::modify) for those.
    pub fn with_scene<R>(&self, f: impl FnOnce(&mut Scene) -> R) -> R {
        f(&mut self.shared.scene.lock())
    }

    /// Run `f` against the current frame buffer.
    pub fn with_view<R>(&self, f: impl FnOnce(&View) -> R) -> R {
        f(&self.shared.view.lock())
    }

    #[must_use]
    pub fn root(&self) -> ElementId {
        self.shared.scene.lock().tree().root()
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.shared.scene.lock().document.title.clone()
    }

    /// Handles for every element whose `id` attribute is `id`: document
    /// order for the loaded page, later insertions and renames after it.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Vec<ElementHandle> {
        self.shared
            .scene
            .lock()
            .ids
            .get(id)
            .iter()
            .map(|&element| ElementHandle {
                engine: self.clone(),
                id: element,
            })
            .collect()
    }

    /// A handle for a known element id.
    #[must_use]
    pub fn handle(&self, id: ElementId) -> ElementHandle {
        ElementHandle {
            engine: self.clone(),
            id,
        }
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Next input event. Blocks until one arrives. Returns `None` once
    /// the engine has stopped.
    #[must_use]
    pub fn poll_event(&self) -> Option<Event> {
        let rx = self.shared.event_rx.lock();
        loop {
            match rx.recv_timeout(POLL_SLICE) {
                Ok(event) => return Some(event),
                Err(RecvTimeoutError::Disconnected) => return None,
                Err(RecvTimeoutError::Timeout) => {
                    let stopped = self.shared.token.lock().as_ref().is_some_and(CancelToken::is_cancelled);
                    if stopped {
                        return None;
                    }
                }
            }
        }
    }

    /// Next input event, waiting at most `timeout`.
    #[must_use]
    pub fn poll_event_timeout(&self, timeout: Duration) -> Option<Event> {
        self.shared.event_rx.lock().recv_timeout(timeout).ok()
    }
}

/// A live element of an engine's scene.
///
/// Operations take the scene lock and schedule the affected element, so
/// each one shows up whole on the next tick.
#[derive(Debug, Clone)]
pub struct ElementHandle {
    engine: Engine,
    id: ElementId,
}

impl ElementHandle {
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// Read the element. `None` if it was removed.
    pub fn read<R>(&self, f: impl FnOnce(&Element) -> R) -> Option<R> {
        self.engine.shared.scene.lock().tree().get(self.id).map(f)
    }

    /// Mutate the element and schedule it.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        self.engine.modify(self.id, f)
    }

    pub fn update(&self) {
        self.engine.update(self.id);
    }

    /// Move `subtree` in as the last child. Returns the new child's id.
    pub fn append_child(&self, subtree: Tree) -> Option<ElementId> {
        self.insert(subtree, Placement::Back)
    }

    /// Move `subtree` in as the first child.
    pub fn prepend_child(&self, subtree: Tree) -> Option<ElementId> {
        self.insert(subtree, Placement::Front)
    }

    fn insert(&self, subtree: Tree, at: Placement) -> Option<ElementId> {
        let shared = &self.engine.shared;
        let mut scene = shared.scene.lock();
        let Scene { document, ids } = &mut *scene;
        let child = document.tree.graft(self.id, subtree, at)?;
        ids.register_subtree(&document.tree, child);
        shared.stack.push(self.id);
        Some(child)
    }

    /// Take the element and its subtree out of the scene, blank the cells
    /// they covered and relayout the parent. The root cannot be removed.
    pub fn remove(&self) -> bool {
        let shared = &self.engine.shared;
        let mut scene = shared.scene.lock();
        let Scene { document, ids } = &mut *scene;
        let Some(parent) = document.tree.parent(self.id) else {
            return false;
        };

        for id in document.tree.descendants(self.id) {
            let boundary = document.tree.get(id).map_or(Boundary::UNSET, |el| el.boundary);
            if boundary != Boundary::UNSET {
                let _ = shared.commands.send(Command::Clear(boundary));
            }
        }
        ids.unregister_subtree(&document.tree, self.id);
        document.tree.detach(self.id);
        shared.stack.push(parent);
        true
    }
}
