//! Core runtime for pushstream: the pipeline model, the squash optimizer, the
//! criteria/query mergers, and the renderer that executes the pushed-down
//! query and replays whatever could not be translated.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod obs;
pub mod optimize;
pub mod query;
pub mod render;
pub mod store;
pub mod stream;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, strategies, or stores are re-exported here.
///

pub mod prelude {
    pub use crate::{
        model::{
            Comparator, Direction, Field, Inclusion, IntermediateOperation, Pipeline, Predicate,
            TerminalOperation,
        },
        query::JoinType,
        render::{Projection, StreamConfiguration},
        traits::Entity,
        value::Value,
    };
}
