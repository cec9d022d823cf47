// SPDX-License-Identifier: MIT
//
// Full engine runs against the headless backend: workers, render stack,
// dirty-rect flushes, input decoding and resize handling.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use n_dom::{Boundary, parse_document, parse_fragment};
use n_engine::{CancelReason, CancelToken, Engine, EngineConfig, EngineError};
use n_term::{Event, HeadlessBackend, Key, KeyboardEvent, Modifiers, Size, SpecialKey};
use pretty_assertions::assert_eq;

const WAIT: Duration = Duration::from_secs(3);

struct Harness {
    engine: Engine,
    backend: Arc<HeadlessBackend>,
    token: CancelToken,
    runner: Option<JoinHandle<Result<CancelReason, EngineError>>>,
}

impl Harness {
    fn start(body: &str, cols: u16, rows: u16) -> Self {
        let backend = Arc::new(HeadlessBackend::new(Size::new(cols, rows)));
        let page = format!("<html><head><title>test</title></head>{body}</html>");
        let config = EngineConfig {
            debounce_ms: 10,
            ..EngineConfig::default()
        };
        let engine = Engine::new(parse_document(&page).unwrap(), backend.clone(), config).unwrap();
        let token = CancelToken::new();
        let runner = {
            let engine = engine.clone();
            let token = token.clone();
            thread::spawn(move || engine.start(&token))
        };
        Self {
            engine,
            backend,
            token,
            runner: Some(runner),
        }
    }

    fn join(&mut self) -> CancelReason {
        self.runner.take().unwrap().join().unwrap().unwrap()
    }

    fn rows(&self) -> Vec<String> {
        self.engine
            .with_view(|view| (0..i32::from(view.height())).map(|y| view.row_text(y)).collect())
    }

    fn child_boundaries(&self) -> Vec<Boundary> {
        self.engine.with_scene(|scene| {
            let tree = scene.tree();
            tree.children(tree.root())
                .iter()
                .map(|&c| tree.get(c).unwrap().boundary)
                .collect()
        })
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if let Some(runner) = self.runner.take() {
            self.token.cancel(CancelReason::Exit);
            let _ = runner.join();
        }
    }
}

fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

fn output_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

// ── Layout ──────────────────────────────────────────────────────────────────

#[test]
fn bordered_rows_stack_without_gaps() {
    let rows: String = (0..12).map(|_| r#"<div height="5" border="true"></div>"#).collect();
    let h = Harness::start(&format!(r#"<body display="flex" flex-direction="column">{rows}</body>"#), 20, 60);

    assert!(eventually(|| h.child_boundaries().iter().all(|b| *b != Boundary::UNSET)));
    let expected: Vec<Boundary> = (0..12).map(|i| Boundary::new(0, i * 5, 20, i * 5 + 5)).collect();
    assert_eq!(h.child_boundaries(), expected);

    let view = h.rows();
    for i in 0..12 {
        assert_eq!(view[i * 5], format!("┌{}┐", "─".repeat(18)));
        assert_eq!(view[i * 5 + 4], format!("└{}┘", "─".repeat(18)));
    }
}

#[test]
fn first_frame_is_one_write() {
    let h = Harness::start(r#"<body border="true">hello</body>"#, 10, 3);
    assert!(eventually(|| h.backend.write_count() >= 1));
    assert_eq!(h.backend.clear_count(), 1);
    let out = output_text(&h.backend.output());
    assert!(out.contains("hello"));
    assert_eq!(h.rows()[1], "│hello   │");
}

#[test]
fn modify_flushes_only_the_touched_region() {
    let body = r#"<body display="flex" flex-direction="column">
        <div height="2"></div><div height="2" id="target"></div><div height="2"></div>
    </body>"#;
    let h = Harness::start(body, 8, 6);
    assert!(eventually(|| h.backend.write_count() >= 1));
    let writes = h.backend.write_count();
    let _ = h.backend.take_output();

    let target = h.engine.element_by_id("target");
    assert_eq!(target.len(), 1);
    target[0].modify(|el| el.content = "changed".into()).unwrap();

    assert!(eventually(|| h.backend.write_count() > writes));
    let out = output_text(&h.backend.take_output());
    assert!(out.contains("changed"));
    assert!(out.contains("\x1b[3;1H"));
    assert!(!out.contains("\x1b[1;1H"));
    assert!(!out.contains("\x1b[5;1H"));
    assert_eq!(h.rows()[2], "changed ");
}

// ── Tree mutation ───────────────────────────────────────────────────────────

#[test]
fn appended_child_renders_and_removal_clears_it() {
    let body = r#"<body display="flex" flex-direction="column"><div id="list" display="flex" flex-direction="column" height="4"></div></body>"#;
    let h = Harness::start(body, 6, 6);
    assert!(eventually(|| h.backend.write_count() >= 1));

    let list = h.engine.element_by_id("list").remove(0);
    let row = parse_fragment(r#"<div id="row" height="1">new</div>"#).unwrap();
    let id = list.append_child(row).unwrap();
    assert_eq!(h.engine.element_by_id("row").len(), 1);

    assert!(eventually(|| h.rows()[0] == "new   "));
    let handle = h.engine.element_by_id("row").remove(0);
    assert_eq!(handle.id(), id);
    assert_eq!(handle.read(|el| el.boundary), Some(Boundary::new(0, 0, 6, 1)));

    assert!(handle.remove());
    assert!(h.engine.element_by_id("row").is_empty());
    assert_eq!(handle.read(|el| el.boundary), None);
    assert!(eventually(|| h.rows()[0] == "      "));
}

#[test]
fn prepended_child_goes_first() {
    let body = r#"<body display="flex" flex-direction="column"><div height="1">b</div></body>"#;
    let h = Harness::start(body, 4, 3);
    assert!(eventually(|| h.rows()[0] == "b   "));

    let root = h.engine.handle(h.engine.root());
    root.prepend_child(parse_fragment(r#"<div height="1">a</div>"#).unwrap()).unwrap();
    assert!(eventually(|| h.rows()[..2] == ["a   ", "b   "]));
}

#[test]
fn renamed_id_is_reindexed_and_removed_cleanly() {
    let h = Harness::start(r#"<body display="flex"><div id="old">x</div></body>"#, 4, 2);
    let handle = h.engine.element_by_id("old").remove(0);

    handle.modify(|el| el.attrs.id = "new".into()).unwrap();
    assert!(h.engine.element_by_id("old").is_empty());
    assert_eq!(h.engine.element_by_id("new")[0].id(), handle.id());

    assert!(handle.remove());
    assert!(h.engine.element_by_id("new").is_empty());
    assert!(h.engine.with_scene(|scene| scene.ids.is_empty()));
}

#[test]
fn root_cannot_be_removed() {
    let h = Harness::start("<body></body>", 4, 2);
    assert!(!h.engine.handle(h.engine.root()).remove());
}

// ── Lifecycle ───────────────────────────────────────────────────────────────

#[test]
fn exit_stops_start_and_restores_terminal() {
    let mut h = Harness::start("<body></body>", 4, 2);
    assert!(eventually(|| h.backend.write_count() >= 1));
    h.engine.exit();
    assert_eq!(h.join(), CancelReason::Exit);
    assert!(h.backend.is_closed());
    assert_eq!(h.engine.poll_event(), None);
}

#[test]
fn parent_cancellation_stops_start() {
    let mut h = Harness::start("<body></body>", 4, 2);
    assert!(eventually(|| h.backend.write_count() >= 1));
    h.token.cancel(CancelReason::Exit);
    assert_eq!(h.join(), CancelReason::Parent);
    assert!(h.backend.is_closed());
}

#[test]
fn invalid_template_is_a_markup_error() {
    let backend = Arc::new(HeadlessBackend::new(Size::new(4, 2)));
    let err = Engine::from_template("<html><head></head></html>".as_bytes(), backend, EngineConfig::default()).unwrap_err();
    assert!(matches!(err, EngineError::Markup(_)));
}

#[test]
fn template_title_is_kept() {
    let backend = Arc::new(HeadlessBackend::new(Size::new(4, 2)));
    let page = "<html><head><title> Demo </title></head><body></body></html>";
    let engine = Engine::from_template(page.as_bytes(), backend, EngineConfig::default()).unwrap();
    assert_eq!(engine.title(), "Demo");
}

// ── Input ───────────────────────────────────────────────────────────────────

#[test]
fn input_bytes_arrive_as_events() {
    let h = Harness::start("<body></body>", 4, 2);
    h.backend.push_input(b"q\x1b[A");

    let first = h.engine.poll_event_timeout(WAIT);
    assert_eq!(first, Some(Event::Keyboard(KeyboardEvent::new(Key::Byte(b'q'), Modifiers::empty()))));
    let second = h.engine.poll_event_timeout(WAIT);
    assert_eq!(
        second,
        Some(Event::Keyboard(KeyboardEvent::new(Key::Special(SpecialKey::Up), Modifiers::empty())))
    );
}

#[test]
fn lone_escape_is_flushed_when_input_goes_idle() {
    let h = Harness::start("<body></body>", 4, 2);
    h.backend.push_input(b"\x1b");
    let event = h.engine.poll_event_timeout(WAIT);
    assert_eq!(
        event,
        Some(Event::Keyboard(KeyboardEvent::new(Key::Special(SpecialKey::Escape), Modifiers::empty())))
    );
}

#[test]
fn resize_reports_and_reloads() {
    let h = Harness::start(r#"<body border="true"></body>"#, 6, 3);
    assert!(eventually(|| h.backend.write_count() >= 1));

    h.backend.resize(Size::new(10, 4));
    assert_eq!(h.engine.poll_event_timeout(WAIT), Some(Event::Resize { width: 10, height: 4 }));

    assert!(eventually(|| h.engine.with_view(|v| (v.width(), v.height())) == (10, 4)));
    assert!(eventually(|| h.rows()[3] == format!("└{}┘", "─".repeat(8))));
    let root = h.engine.with_scene(|s| s.tree().get(s.tree().root()).unwrap().boundary);
    assert_eq!(root, Boundary::new(0, 0, 10, 4));
    assert!(h.backend.clear_count() >= 2);
}
