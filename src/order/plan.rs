//! Wait dependencies between groups.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::warn;

use super::descriptor::GroupDescriptor;
use crate::error::{ChainError, Result};

/// The "waits for" relation between groups.
///
/// A circular wait would only show up at run time as every group in the
/// cycle timing out, so it is rejected up front. A dependency on a group
/// that is never declared is allowed: waiting on it times out.
#[derive(Debug, Clone, Default)]
pub struct GroupPlan {
    waits: BTreeMap<String, BTreeSet<String>>,
}

impl GroupPlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a plan from group descriptors.
    pub fn from_groups<'a>(groups: impl IntoIterator<Item = &'a GroupDescriptor>) -> Self {
        groups.into_iter().fold(Self::new(), |plan, group| {
            plan.add_group(&group.name, group.depends_on.iter().cloned())
        })
    }

    /// Add a group with the groups it waits for.
    pub fn add_group(
        mut self,
        name: impl Into<String>,
        waits_for: impl IntoIterator<Item = String>,
    ) -> Self {
        self.waits.entry(name.into()).or_default().extend(waits_for);
        self
    }

    /// Check if a group is declared.
    pub fn contains(&self, group: &str) -> bool {
        self.waits.contains_key(group)
    }

    /// Groups that `group` waits for.
    pub fn waits_for(&self, group: &str) -> Option<&BTreeSet<String>> {
        self.waits.get(group)
    }

    /// Number of declared groups.
    pub fn len(&self) -> usize {
        self.waits.len()
    }

    /// Check if no group is declared.
    pub fn is_empty(&self) -> bool {
        self.waits.is_empty()
    }

    /// Pairs of `(group, dependency)` where the dependency is not declared.
    pub fn dangling(&self) -> Vec<(&str, &str)> {
        self.waits
            .iter()
            .flat_map(|(group, deps)| deps.iter().map(move |dep| (group.as_str(), dep.as_str())))
            .filter(|(_, dep)| !self.contains(dep))
            .collect()
    }

    /// Reject circular waits and warn about undeclared dependencies.
    pub fn validate(&self) -> Result<()> {
        if let Some(cycle) = self.find_cycle() {
            return Err(ChainError::CircularWait {
                cycle: cycle.join(" -> "),
            });
        }

        for (group, dep) in self.dangling() {
            warn!(
                "Group '{}' waits for undeclared group '{}'; the wait will time out unless it registers",
                group, dep
            );
        }

        Ok(())
    }

    /// Find a cycle, returning the path if one exists.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Unvisited,
            Visiting,
            Visited,
        }

        fn dfs<'a>(
            node: &'a str,
            plan: &'a GroupPlan,
            state: &mut HashMap<&'a str, State>,
            path: &mut Vec<&'a str>,
        ) -> Option<Vec<String>> {
            state.insert(node, State::Visiting);
            path.push(node);

            if let Some(deps) = plan.waits.get(node) {
                for dep in deps {
                    match state.get(dep.as_str()) {
                        Some(State::Visiting) => {
                            let start = path.iter().position(|s| *s == dep.as_str())?;
                            let mut cycle: Vec<String> =
                                path[start..].iter().map(|s| s.to_string()).collect();
                            cycle.push(dep.clone());
                            return Some(cycle);
                        }
                        Some(State::Unvisited) | None => {
                            if let Some(cycle) = dfs(dep, plan, state, path) {
                                return Some(cycle);
                            }
                        }
                        Some(State::Visited) => {}
                    }
                }
            }

            path.pop();
            state.insert(node, State::Visited);
            None
        }

        let mut state: HashMap<&str, State> = self
            .waits
            .keys()
            .map(|g| (g.as_str(), State::Unvisited))
            .collect();
        let mut path = Vec::new();

        for group in self.waits.keys() {
            if state.get(group.as_str()) == Some(&State::Unvisited) {
                if let Some(cycle) = dfs(group, self, &mut state, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }
}
