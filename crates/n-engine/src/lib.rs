// SPDX-License-Identifier: MIT
//
// n-engine: layout, compositing and render orchestration.
//
// An `Engine` holds a parsed document and a terminal backend. Mutations
// push elements onto the render stack; the render worker lays them out
// into a z-gated cell buffer and flushes the touched region once per tick.

pub mod cancel;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod layout;
pub mod stack;
pub mod view;
mod worker;

pub use cancel::{CancelReason, CancelToken};
pub use config::EngineConfig;
pub use engine::{ElementHandle, Engine, Scene};
pub use error::{EngineError, LayoutError};
pub use layout::{Layout, Layouts, Pass};
pub use stack::RenderStack;
pub use view::{AxisMask, Cell, Style, View};
