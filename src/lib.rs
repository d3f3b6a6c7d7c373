//! Suite Splitter - balanced parallel partitioning of hierarchical test suites
//!
//! Pages live in a dot-separated tree. Pages that inherit the same suite
//! setup and teardown are grouped, weighted by their recorded runtimes and
//! split across workers with a longest-processing-time-first heuristic.
//! Each resulting group becomes an execution context with a common root.
//!
//! ## Features
//!
//! - Fixture-aware grouping, so a worker always runs a page with its suite setup
//! - History-backed weights (average or latest runtime)
//! - Suite root enforcement for context roots
//! - Parallel dispatch of contexts to an external command
//!
//! ## Example
//!
//! ```rust
//! use suite_splitter::{ContextGenerator, PagePath, PageType, StaticWeights, WikiTree};
//!
//! let mut tree = WikiTree::new();
//! let suite = tree.add_path(&PagePath::parse("Suite"), PageType::Suite)?;
//! let one = tree.add_page(&suite, "TestOne", PageType::Test)?;
//! let two = tree.add_page(&suite, "TestTwo", PageType::Test)?;
//!
//! let generator = ContextGenerator::new(&tree, StaticWeights::uniform(1));
//! let contexts = generator.generate(vec![one, two], 2)?;
//! assert_eq!(contexts.len(), 1);
//! assert_eq!(contexts[0].root, suite);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod grouping;
pub mod models;
pub mod output;
pub mod partition;
pub mod results;
pub mod root;
pub mod tree;
pub mod utils;
pub mod weight;

pub use error::{FailureKind, PartitionError};
pub use generator::ContextGenerator;
pub use grouping::{FixtureGrouper, FixtureNames};
pub use models::{
    ContextOutcome, ExecutionContext, FixturePair, Page, PageId, PageOutcome, PagePath,
    PageStatus, PageType, WeightedGroup, WeightedPage,
};
pub use partition::{LoadBalancingStrategy, PartitionStrategy, WholeGroupStrategy};
pub use root::CommonRootResolver;
pub use tree::{PageTree, TreeManifest, WikiTree};
pub use weight::{
    HistoryWeightSource, RuntimeStrategy, StaticWeights, WeightSource, WeightedGroupBuilder,
};
