// SPDX-License-Identifier: MIT
//
// Engine error types.

use std::io;

use n_dom::{ElementId, MarkupError};
use thiserror::Error;

/// A layout strategy could not place or paint an element.
///
/// The render worker logs these and moves on to the next element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("element {element:?} is unrenderable: {reason}")]
    Unrenderable {
        element: ElementId,
        reason: &'static str,
    },
}

impl LayoutError {
    pub(crate) const fn unrenderable(element: ElementId, reason: &'static str) -> Self {
        Self::Unrenderable { element, reason }
    }
}

/// Failures building or running an [`Engine`](crate::Engine).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid markup: {0}")]
    Markup(#[from] MarkupError),

    /// The terminal could not be queried or set up.
    #[error("terminal unavailable")]
    Terminal(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to spawn worker thread")]
    WorkerSpawn(#[source] io::Error),
}
