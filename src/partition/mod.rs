//! Group partitioning
//!
//! Pages start out grouped by fixture pair, i.e. by what can safely run
//! together. A strategy reshapes those groups to make better use of the
//! available workers. Groups never mix fixture pairs.

use tracing::debug;

use crate::models::{WeightedGroup, WeightedPage};

/// Reshapes weighted groups for `count` parallel workers
pub trait PartitionStrategy {
    fn partition(&self, groups: Vec<WeightedGroup>, count: usize) -> Vec<WeightedGroup>;
}

impl<P: PartitionStrategy + ?Sized> PartitionStrategy for Box<P> {
    fn partition(&self, groups: Vec<WeightedGroup>, count: usize) -> Vec<WeightedGroup> {
        (**self).partition(groups, count)
    }
}

/// Splits groups heavier than `large` across the workers using the
/// longest-processing-time-first heuristic.
///
/// Aimed at a single large suite, or a large set of tests sharing one suite
/// setup and teardown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadBalancingStrategy {
    large: u64,
}

impl LoadBalancingStrategy {
    pub fn new(large: u64) -> Self {
        Self { large }
    }

    pub fn large(&self) -> u64 {
        self.large
    }

    /// Split one group into at most `count` bins of balanced weight
    pub fn split(&self, group: &WeightedGroup, count: usize) -> Vec<WeightedGroup> {
        let k = count.min(group.len());
        if k <= 1 {
            return vec![group.clone()];
        }

        let mut pages: Vec<WeightedPage> = group.pages().to_vec();
        pages.sort_by(|a, b| b.weight.cmp(&a.weight));

        let mut bins: Vec<(u64, Vec<WeightedPage>)> = vec![(0, Vec::new()); k];
        for page in pages {
            let bin = lightest_bin(&bins);
            bins[bin].0 = bins[bin].0.saturating_add(page.weight);
            bins[bin].1.push(page);
        }

        bins.into_iter()
            .filter(|(_, pages)| !pages.is_empty())
            .map(|(_, pages)| group.with_pages(pages))
            .collect()
    }
}

impl PartitionStrategy for LoadBalancingStrategy {
    fn partition(&self, groups: Vec<WeightedGroup>, count: usize) -> Vec<WeightedGroup> {
        let mut result = Vec::with_capacity(groups.len());

        for group in groups {
            if group.total_weight() > self.large && !group.is_empty() && count > 0 {
                let split = self.split(&group, count);
                debug!(
                    "Split group {} (weight {} > {}) into {} parts",
                    group.fixtures(),
                    group.total_weight(),
                    self.large,
                    split.len()
                );
                result.extend(split);
            } else {
                result.push(group);
            }
        }

        heaviest_first(&mut result);
        result
    }
}

/// Keeps every fixture group whole, ordered heaviest first
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WholeGroupStrategy;

impl PartitionStrategy for WholeGroupStrategy {
    fn partition(&self, mut groups: Vec<WeightedGroup>, _count: usize) -> Vec<WeightedGroup> {
        heaviest_first(&mut groups);
        groups
    }
}

/// Stable, so equally heavy groups keep their fixture-pair order
fn heaviest_first(groups: &mut [WeightedGroup]) {
    groups.sort_by(|a, b| b.total_weight().cmp(&a.total_weight()));
}

/// Index of the bin with the least weight. Among equally light bins the one
/// with fewer pages wins, then the first one.
fn lightest_bin(bins: &[(u64, Vec<WeightedPage>)]) -> usize {
    bins.iter()
        .enumerate()
        .min_by_key(|(i, (weight, pages))| (*weight, pages.len(), *i))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
