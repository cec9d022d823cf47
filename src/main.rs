// SPDX-License-Identifier: MIT
//
// n-tui: a scrollable table running on the n-tui engine.
//
// The engine renders `demos/table.html` (or a page given on the command
// line) while this thread consumes input events and edits the tree:
//
//   up / down   move the highlighted row, scrolling the table body
//   enter       toggle a details modal over the table
//   i           append a row
//   q, ctrl-c   quit
//
// Set N_TUI_LOG=<path> to write logs to a file, filtered by RUST_LOG.

use std::env;
use std::fs::{self, File};
use std::process;
use std::sync::{Arc, Mutex};
use std::thread;

use n_dom::parse_fragment;
use n_engine::{CancelToken, ElementHandle, Engine, EngineConfig};
use n_term::{Backend, Event, Key, KeyboardEvent, Modifiers, SpecialKey, TtyBackend};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TEMPLATE: &str = include_str!("../demos/table.html");

/// Background of the selected row.
const HIGHLIGHT: i32 = 56;
const PLAIN: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

// ─── Table ──────────────────────────────────────────────────────────────────

/// Demo state: which row is selected and whether the modal is up.
struct Table {
    engine: Engine,
    rows: i32,
    selected: i32,
    modal: bool,
}

impl Table {
    fn new(engine: Engine) -> Self {
        let rows = engine
            .element_by_id("table-body")
            .first()
            .map_or(0, |body| engine.with_scene(|scene| scene.tree().children(body.id()).len()));
        let table = Self {
            engine,
            rows: i32::try_from(rows).unwrap_or(i32::MAX),
            selected: 0,
            modal: false,
        };
        table.highlight(0, HIGHLIGHT);
        table
    }

    fn table_body(&self) -> Option<ElementHandle> {
        self.engine.element_by_id("table-body").into_iter().next()
    }

    fn handle(&mut self, event: Event) -> Flow {
        match event {
            Event::Keyboard(key) => self.on_key(key),
            Event::Mouse(_) | Event::Resize { .. } => Flow::Continue,
        }
    }

    fn on_key(&mut self, key: KeyboardEvent) -> Flow {
        if key.is(b'c', Modifiers::CTRL) || key == KeyboardEvent::new(Key::Byte(b'q'), Modifiers::empty()) {
            self.engine.exit();
            return Flow::Exit;
        }
        match key.key {
            Key::Byte(b'i') => self.insert_row(),
            Key::Byte(b'\r') => self.toggle_modal(),
            Key::Special(SpecialKey::Down) => self.select_next(),
            Key::Special(SpecialKey::Up) => self.select_previous(),
            _ => {}
        }
        Flow::Continue
    }

    // ── Selection ───────────────────────────────────────────────────────

    /// Paint row `index` with `bg` and push the color down to its cells.
    fn highlight(&self, index: i32, bg: i32) {
        let (Some(body), Ok(index)) = (self.table_body(), usize::try_from(index)) else {
            return;
        };
        let engine = &self.engine;
        engine.with_scene(|scene| {
            let tree = scene.tree_mut();
            let Some(&row) = tree.children(body.id()).get(index) else {
                return;
            };
            if let Some(el) = tree.get_mut(row) {
                el.attrs.background_color = bg;
            }
            tree.propagate_inherited(row);
            engine.update(row);
        });
    }

    /// `(scroll offset, visible rows)` of the table body.
    fn viewport(&self) -> (i32, i32) {
        self.table_body()
            .and_then(|body| body.read(|el| (el.scroll.y, el.boundary.height())))
            .unwrap_or((0, 0))
    }

    fn scroll(&self, dy: i32) {
        if let Some(body) = self.table_body() {
            body.modify(|el| el.scroll.scroll_by(0, dy));
        }
    }

    fn select_next(&mut self) {
        if self.rows == 0 || self.selected >= self.rows - 1 {
            return;
        }
        let (scroll_y, height) = self.viewport();
        if self.selected + 2 > scroll_y + height && self.rows > scroll_y + height {
            self.scroll(1);
        }
        self.highlight(self.selected, PLAIN);
        self.selected += 1;
        self.highlight(self.selected, HIGHLIGHT);
    }

    fn select_previous(&mut self) {
        if self.rows == 0 || self.selected == 0 {
            return;
        }
        let (scroll_y, _) = self.viewport();
        if self.selected == scroll_y && scroll_y >= 1 {
            self.scroll(-1);
        }
        self.highlight(self.selected, PLAIN);
        self.selected -= 1;
        self.highlight(self.selected, HIGHLIGHT);
    }

    // ── Editing ─────────────────────────────────────────────────────────

    fn insert_row(&mut self) {
        let Some(body) = self.table_body() else {
            return;
        };
        let n = self.rows;
        let markup = format!(
            r#"<trow display="flex" height="1"><p>row {n}</p><p>row {n}</p><p>row {n}</p><p>row {n}</p></trow>"#
        );
        match parse_fragment(&markup) {
            Ok(row) => {
                if body.append_child(row).is_some() {
                    self.rows += 1;
                }
            }
            Err(err) => warn!(error = %err, "row markup rejected"),
        }
    }

    fn toggle_modal(&mut self) {
        if self.modal {
            if let Some(modal) = self.engine.element_by_id("modal").first() {
                modal.remove();
            }
            self.modal = false;
            return;
        }

        let root = self.engine.root();
        let area = self.engine.handle(root).read(|el| el.boundary).unwrap_or_default();
        let left = area.width() / 2 - 20;
        let top = area.height() / 2 - 5;
        let text = format!("you have selected row {}", self.selected);
        let markup = format!(
            r#"<div display="absolute" id="modal" z-index="3" height="10" width="40" background-color="0" left="{left}" top="{top}" border="true">{text}</div>"#
        );
        match parse_fragment(&markup) {
            Ok(modal) => self.modal = self.engine.handle(root).prepend_child(modal).is_some(),
            Err(err) => warn!(error = %err, "modal markup rejected"),
        }
    }

    #[cfg(test)]
    fn row_background(&self, index: i32) -> Option<i32> {
        let body = self.table_body()?.id();
        let index = usize::try_from(index).ok()?;
        self.engine.with_scene(|scene| {
            let tree = scene.tree();
            let row = *tree.children(body).get(index)?;
            tree.get(row).map(|el| el.attrs.background_color)
        })
    }
}

// ─── Startup ────────────────────────────────────────────────────────────────

fn init_logging() {
    let Some(path) = env::var_os("N_TUI_LOG") else {
        return;
    };
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("n-tui: cannot open log file {}: {e}", path.to_string_lossy());
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn fail(tty: &TtyBackend, message: &str) -> ! {
    let _ = tty.close();
    eprintln!("n-tui: {message}");
    process::exit(1);
}

fn main() {
    init_logging();

    let template = match env::args().nth(1) {
        Some(path) => fs::read_to_string(&path).unwrap_or_else(|e| {
            eprintln!("n-tui: cannot read {path}: {e}");
            process::exit(1);
        }),
        None => TEMPLATE.to_owned(),
    };

    let tty = Arc::new(TtyBackend::open().unwrap_or_else(|e| {
        eprintln!("n-tui: failed to initialize terminal: {e}");
        process::exit(1);
    }));
    let engine = Engine::from_template(template.as_bytes(), tty.clone(), EngineConfig::from_env())
        .unwrap_or_else(|e| fail(&tty, &e.to_string()));
    info!(title = %engine.title(), "template loaded");

    let app = {
        let engine = engine.clone();
        thread::Builder::new().name("n-app".into()).spawn(move || {
            let mut table = Table::new(engine);
            while let Some(event) = table.engine.poll_event() {
                if table.handle(event) == Flow::Exit {
                    break;
                }
            }
        })
    };
    let app = app.unwrap_or_else(|e| fail(&tty, &format!("cannot spawn the app thread: {e}")));

    let result = engine.start(&CancelToken::new());
    let _ = app.join();
    if let Err(e) = result {
        fail(&tty, &e.to_string());
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
