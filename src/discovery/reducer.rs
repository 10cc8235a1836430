//! Greedy reduction of a required package set.
//!
//! A package already pulled in by another package's dependency closure is
//! redundant to list. The reducer walks the required set once, in a fixed
//! order, and drops everything the current package subsumes, both from the
//! packages still waiting and from the ones kept so far. The result always
//! covers the required set but is not guaranteed to be the smallest cover;
//! a different walk order may keep a different package out of a cycle.

use crate::package::{PackageBackend, PackageId};
use indicatif::ProgressBar;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduction {
    pub minimal: BTreeSet<PackageId>,
    /// Dropped package → the package whose closure contained it.
    pub subsumed: BTreeMap<PackageId, PackageId>,
    /// Packages whose dependencies couldn't be queried; always kept.
    pub unresolved: Vec<PackageId>,
}

pub struct MinimalSetReducer<'a> {
    backend: &'a dyn PackageBackend,
    progress: ProgressBar,
}

impl<'a> MinimalSetReducer<'a> {
    pub fn new(backend: &'a dyn PackageBackend) -> Self {
        Self {
            backend,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Reduces `required`, walking it in ascending name order.
    pub async fn reduce(&self, required: &BTreeSet<PackageId>) -> Reduction {
        self.reduce_in_order(required.iter().cloned()).await
    }

    /// Reduces the packages yielded by `order`, walking them in that order.
    /// Repeated names are walked once.
    pub async fn reduce_in_order<I>(&self, order: I) -> Reduction
    where
        I: IntoIterator<Item = PackageId>,
    {
        let mut queue: VecDeque<PackageId> = VecDeque::new();
        let mut remaining: BTreeSet<PackageId> = BTreeSet::new();
        for package in order {
            if remaining.insert(package.clone()) {
                queue.push_back(package);
            }
        }

        let mut reduction = Reduction::default();

        while let Some(package) = queue.pop_front() {
            // Already subsumed by an earlier package
            if !remaining.remove(&package) {
                continue;
            }

            self.progress.set_message(format!("Pruning {}...", package));

            let deps = match self.backend.find_dependencies(&package).await {
                Ok(deps) => deps,
                Err(e) => {
                    log::debug!("No dependency data for {}: {}", package, e);
                    reduction.unresolved.push(package.clone());
                    BTreeSet::new()
                }
            };

            let mut removed = Vec::new();
            for dep in &deps {
                if reduction.minimal.remove(dep) || remaining.remove(dep) {
                    reduction.subsumed.insert(dep.clone(), package.clone());
                    removed.push(dep.as_str());
                }
            }

            if !removed.is_empty() {
                log::info!("Pruning {} removes: {}", package, removed.join(" "));
            }

            reduction.minimal.insert(package);
        }

        self.progress.finish_and_clear();

        if !reduction.unresolved.is_empty() {
            log::warn!(
                "Could not query dependencies of {} package(s), kept as-is: {}",
                reduction.unresolved.len(),
                reduction.unresolved.join(" ")
            );
        }

        reduction
    }
}
