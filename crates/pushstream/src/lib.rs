//! ## Crate layout
//! - `core`: pipeline model, squash optimizer, push-down mergers, renderer,
//!   reference store, and observability.
//!
//! The `prelude` module carries what stream code needs day to day: the
//! domain vocabulary, the renderer, and the stream builder. Strategy
//! authoring lives under `core::merge`.

pub use pushstream_core as core;

/// re-exports
///
/// entity crates can derive and serialize without naming these themselves
pub mod __reexports {
    pub use derive_more;
    pub use serde;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Errors
//

pub use core::error::{ErrorClass, RenderError as Error, StoreError};

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        config::RendererConfig,
        prelude::*,
        render::{RenderResult, Renderer, TerminalValue},
        store::{MemoryStore, QueryExecutor as _},
        stream::StreamBuilder,
    };
}
