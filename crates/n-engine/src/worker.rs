// SPDX-License-Identifier: MIT
//
// The engine's two long-running workers.
//
// `watch_input` reads the backend, decodes bytes into events and forwards
// them to the bounded event queue. `render_loop` wakes once per tick, lays
// out whatever the render stack holds and flushes the union of the touched
// regions in one write.

use std::io;
use std::sync::mpsc::TrySendError;
use std::thread;
use std::time::Duration;

use n_dom::Boundary;
use n_term::{CellWriter, Decoder, EscapeDecoder, Event, OutputBuffer};
use tracing::{debug, error, trace, warn};

use crate::cancel::CancelToken;
use crate::engine::{Command, Shared};
use crate::layout::{Layout, Layouts, Pass};
use crate::view::View;

const READ_BUF: usize = 1024;
/// Pause between retries while the event queue is full.
const QUEUE_RETRY: Duration = Duration::from_millis(1);
/// Pause after a failed read before the next attempt.
const READ_BACKOFF: Duration = Duration::from_millis(10);

// ── Input ───────────────────────────────────────────────────────────────────

pub(crate) fn watch_input(shared: &Shared, token: &CancelToken) {
    let mut decoder = EscapeDecoder::new();
    let mut buf = [0u8; READ_BUF];

    'watch: while !token.is_cancelled() {
        if shared.backend.take_resize() {
            match shared.backend.window_size() {
                Ok(size) => {
                    let event = Event::Resize {
                        width: size.cols,
                        height: size.rows,
                    };
                    if !forward(shared, token, event) {
                        break;
                    }
                }
                Err(err) => warn!(error = %err, "window size unavailable after resize"),
            }
            shared.reload();
        }

        let events = match shared.backend.read(&mut buf) {
            Ok(0) if decoder.has_pending() => decoder.flush(),
            Ok(0) => continue,
            Ok(n) => decoder.decode(&buf[..n]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(error = %err, "input read failed");
                thread::sleep(READ_BACKOFF);
                continue;
            }
        };
        for event in events {
            if !forward(shared, token, event) {
                break 'watch;
            }
        }
    }

    if let Err(err) = shared.backend.close() {
        warn!(error = %err, "closing the terminal failed");
    }
    debug!("input watcher stopped");
}

/// Hand `event` to the queue, waiting while it is full. `false` once the
/// engine is shutting down.
fn forward(shared: &Shared, token: &CancelToken, mut event: Event) -> bool {
    trace!(?event, "input");
    loop {
        match shared.events.try_send(event) {
            Ok(()) => return true,
            Err(TrySendError::Disconnected(_)) => return false,
            Err(TrySendError::Full(back)) => {
                if token.is_cancelled() {
                    return false;
                }
                event = back;
                thread::sleep(QUEUE_RETRY);
            }
        }
    }
}

// ── Render ──────────────────────────────────────────────────────────────────

pub(crate) fn render_loop(shared: &Shared, token: &CancelToken) {
    let layouts = Layouts::new();
    let mut writer = CellWriter::new();
    let mut out = OutputBuffer::new();
    let interval = shared.config.tick_interval();

    while token.wait_timeout(interval).is_none() {
        tick(shared, &layouts, &mut writer, &mut out);
    }
    debug!("render worker stopped");
}

fn grow(dirty: &mut Option<Boundary>, rect: Boundary) {
    if rect == Boundary::UNSET || rect.is_empty() {
        return;
    }
    *dirty = Some(match *dirty {
        Some(acc) if acc.circumscribes(rect) => acc,
        Some(acc) => acc.sum(rect),
        None => rect,
    });
}

/// One frame: apply commands, drain the render stack, flush what changed.
pub(crate) fn tick(shared: &Shared, layouts: &Layouts, writer: &mut CellWriter, out: &mut OutputBuffer) {
    let mut view = shared.view.lock();
    let mut dirty = None;
    apply_commands(shared, &mut view, &mut dirty);

    let drained = if shared.stack.is_empty() {
        0
    } else {
        drain_stack(shared, layouts, &mut view, &mut dirty)
    };

    let Some(rect) = dirty.and_then(|d| d.intersect(view.boundary())) else {
        return;
    };
    writer.reset_state();
    view.write_region(rect, writer, out);
    writer.finish(out);
    drop(view);

    if let Err(err) = shared.backend.write(&out.take()) {
        warn!(error = %err, "terminal write failed");
    }
    debug!(drained, %rect, "tick");
}

fn apply_commands(shared: &Shared, view: &mut View, dirty: &mut Option<Boundary>) {
    for command in shared.command_rx.lock().try_iter() {
        match command {
            Command::Clear(rect) => {
                view.clear_boundary(rect);
                grow(dirty, rect);
            }
            Command::Resize(size) => {
                view.resize(size.cols, size.rows);
                view.flush();
                if let Err(err) = shared.backend.clear() {
                    warn!(error = %err, "terminal clear failed");
                }
                grow(dirty, view.boundary());
            }
        }
    }
}

/// Lay out everything queued, including children queued along the way.
fn drain_stack(shared: &Shared, layouts: &Layouts, view: &mut View, dirty: &mut Option<Boundary>) -> usize {
    let mut scene = shared.scene.lock();
    // Commands sent together with the pushes we are about to drain.
    apply_commands(shared, view, dirty);

    let mut drained = 0usize;
    let mut pass = Pass {
        tree: scene.tree_mut(),
        view,
        stack: &shared.stack,
    };
    while let Some(id) = shared.stack.pop() {
        if !pass.tree.contains(id) {
            continue;
        }
        match layouts.layout(&mut pass, id) {
            Ok(()) => {
                drained += 1;
                if let Some(el) = pass.tree.get(id) {
                    grow(dirty, el.boundary);
                }
            }
            Err(err) => error!(error = %err, "layout failed"),
        }
    }
    drained
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use n_dom::parse_document;
    use n_term::{HeadlessBackend, Size};
    use pretty_assertions::assert_eq;

    use crate::config::EngineConfig;
    use crate::engine::Engine;

    fn engine(body: &str, cols: u16, rows: u16) -> (Engine, Arc<HeadlessBackend>) {
        let backend = Arc::new(HeadlessBackend::new(Size::new(cols, rows)));
        let page = format!("<html><head></head>{body}</html>");
        let engine = Engine::new(parse_document(&page).unwrap(), backend.clone(), EngineConfig::default()).unwrap();
        (engine, backend)
    }

    fn run_tick(engine: &Engine) {
        tick(&engine.shared, &Layouts::new(), &mut CellWriter::new(), &mut OutputBuffer::new());
    }

    // ── Ticks ───────────────────────────────────────────────────────────

    #[test]
    fn idle_tick_writes_nothing() {
        let (engine, backend) = engine("<body>x</body>", 4, 2);
        run_tick(&engine);
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn queued_root_paints_in_one_write() {
        let (engine, backend) = engine(r#"<body display="flex"><div>ab</div><div>cd</div></body>"#, 4, 1);
        engine.update(engine.root());
        run_tick(&engine);
        assert_eq!(backend.write_count(), 1);
        assert_eq!(engine.with_view(|v| v.row_text(0)), "abcd");
        assert!(engine.shared.stack.is_empty());
    }

    #[test]
    fn stale_ids_are_skipped() {
        let (engine, backend) = engine(r#"<body display="flex"><div id="gone">x</div></body>"#, 4, 1);
        let gone = engine.element_by_id("gone").remove(0);
        engine.update(gone.id());
        assert!(gone.remove());
        run_tick(&engine);
        assert!(engine.shared.stack.is_empty());
        assert_eq!(backend.write_count(), 1);
    }

    #[test]
    fn clear_command_blanks_its_region() {
        let (engine, _) = engine("<body>abcd</body>", 4, 1);
        engine.update(engine.root());
        run_tick(&engine);
        engine.shared.commands.send(Command::Clear(Boundary::new(1, 0, 3, 1))).unwrap();
        run_tick(&engine);
        assert_eq!(engine.with_view(|v| v.row_text(0)), "a  d");
    }

    #[test]
    fn reload_resizes_and_relays_out_in_one_tick() {
        let (engine, backend) = engine(r#"<body border="true"></body>"#, 4, 3);
        backend.resize(Size::new(6, 2));
        engine.shared.reload_now();
        run_tick(&engine);
        assert_eq!(engine.with_view(|v| (v.width(), v.height())), (6, 2));
        assert_eq!(engine.with_view(|v| v.row_text(1)), "└────┘");
        assert_eq!(backend.clear_count(), 1);
    }

    #[test]
    fn dirty_union_grows_to_cover() {
        let mut dirty = None;
        grow(&mut dirty, Boundary::new(0, 0, 2, 1));
        grow(&mut dirty, Boundary::UNSET);
        grow(&mut dirty, Boundary::new(3, 2, 4, 3));
        assert_eq!(dirty, Some(Boundary::new(0, 0, 4, 3)));
    }
}
