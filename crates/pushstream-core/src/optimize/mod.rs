//! Pipeline optimizer: terminal-driven rewrites followed by squash passes.
//!
//! Every rewrite is equivalence-preserving: the optimized pipeline yields the
//! same rows, in the same order, as applying the original operations left to
//! right. The optimizer never fails.

mod squash;
mod terminal;

#[cfg(test)]
mod tests;

use crate::{config::OptimizerConfig, model::Pipeline, traits::Entity};
use std::marker::PhantomData;

// re-exports
pub use squash::{
    FilterSquash, LimitSquash, SingleValueSquash, SkipSquash, SortedSquash, squash,
    squash_distinct,
};
pub use terminal::optimize_terminal;

///
/// PipelineOptimizer
///

#[derive(Clone, Debug)]
pub struct PipelineOptimizer<E> {
    config: OptimizerConfig,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> PipelineOptimizer<E> {
    #[must_use]
    pub const fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn config(&self) -> OptimizerConfig {
        self.config
    }

    pub fn optimize(&self, pipeline: &mut Pipeline<E>) {
        if self.config.terminal {
            optimize_terminal(pipeline);
        }
        if self.config.squash {
            Self::squash_to_fixpoint(pipeline);
        }
    }

    /// Squash until the operation count stops shrinking.
    ///
    /// A single pass can drop a neutral run (skip(0), limit(MAX)) and leave two
    /// same-kind operations adjacent; the next pass fuses them.
    pub fn squash_to_fixpoint(pipeline: &mut Pipeline<E>) {
        loop {
            let before = pipeline.len();
            Self::squash_once(pipeline);
            if pipeline.len() >= before {
                break;
            }
        }
    }

    fn squash_once(pipeline: &mut Pipeline<E>) {
        squash(&FilterSquash::new(), pipeline);
        squash(&SortedSquash::new(), pipeline);
        squash_distinct(pipeline);
        squash(&SkipSquash::new(), pipeline);
        squash(&LimitSquash::new(), pipeline);
    }
}

impl<E: Entity> Default for PipelineOptimizer<E> {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}
