//! Deterministic ordering of steps and groups by declared priority.
//!
//! - [`OrderingEngine`] - Stable priority sort with an explicit fallback
//! - [`FallbackPolicy`] - Where items without a declared priority go
//! - [`StepDescriptor`] / [`GroupDescriptor`] - Declared metadata per item
//! - [`GroupPlan`] - Wait-dependency validation across groups

pub mod descriptor;
pub mod plan;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use descriptor::{GroupDescriptor, StepDescriptor};
pub use plan::GroupPlan;

/// Something with a name and an optional declared priority.
///
/// Lower priorities run first.
pub trait Prioritized {
    /// Name used in logs and reports.
    fn name(&self) -> &str;

    /// Declared priority, if any.
    fn priority(&self) -> Option<i32>;
}

impl<T: Prioritized + ?Sized> Prioritized for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn priority(&self) -> Option<i32> {
        (**self).priority()
    }
}

/// Placement of items that declare no priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Treat as priority 0, ahead of every positive priority.
    #[default]
    Front,
    /// Treat as `i32::MAX`, after every declared priority.
    End,
}

impl FallbackPolicy {
    /// Priority assigned to undeclared items.
    pub fn value(&self) -> i32 {
        match self {
            FallbackPolicy::Front => 0,
            FallbackPolicy::End => i32::MAX,
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackPolicy::Front => write!(f, "front"),
            FallbackPolicy::End => write!(f, "end"),
        }
    }
}

/// Computes a total order over prioritized items.
///
/// The sort is stable: items sharing a priority keep their input order.
/// Ordering has no side effects, so calling it again on the same input gives
/// the same result.
///
/// # Example
///
/// ```
/// use testchain::order::{NamedItem, OrderingEngine};
///
/// let items = vec![
///     NamedItem::new("b", Some(2)),
///     NamedItem::new("untagged", None),
///     NamedItem::new("a", Some(1)),
/// ];
///
/// let steps = OrderingEngine::for_steps().order(items.clone());
/// let names: Vec<_> = steps.iter().map(|i| i.name.as_str()).collect();
/// assert_eq!(names, ["untagged", "a", "b"]);
///
/// let groups = OrderingEngine::for_groups().order(items);
/// let names: Vec<_> = groups.iter().map(|i| i.name.as_str()).collect();
/// assert_eq!(names, ["a", "b", "untagged"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderingEngine {
    fallback: FallbackPolicy,
}

impl OrderingEngine {
    /// Create an engine with the given fallback policy.
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self { fallback }
    }

    /// Engine for steps within a chain: undeclared steps go first.
    pub fn for_steps() -> Self {
        Self::new(FallbackPolicy::Front)
    }

    /// Engine for groups: undeclared groups go last.
    pub fn for_groups() -> Self {
        Self::new(FallbackPolicy::End)
    }

    /// The fallback policy in effect.
    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    /// Effective priority of an item under this engine's policy.
    pub fn effective_priority<T: Prioritized + ?Sized>(&self, item: &T) -> i32 {
        item.priority().unwrap_or_else(|| self.fallback.value())
    }

    /// Sort `items` by effective priority.
    pub fn order<T: Prioritized>(&self, mut items: Vec<T>) -> Vec<T> {
        items.sort_by_key(|item| self.effective_priority(item));
        items
    }

    /// Sort references to `items`, leaving the slice untouched.
    pub fn order_refs<'a, T: Prioritized>(&self, items: &'a [T]) -> Vec<&'a T> {
        self.order(items.iter().collect())
    }
}

/// A plain name/priority pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl NamedItem {
    pub fn new(name: impl Into<String>, priority: Option<i32>) -> Self {
        Self {
            name: name.into(),
            priority,
        }
    }
}

impl Prioritized for NamedItem {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> Option<i32> {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(declared: &[(&str, Option<i32>)]) -> Vec<NamedItem> {
        declared.iter().map(|(n, p)| NamedItem::new(*n, *p)).collect()
    }

    fn names(items: &[NamedItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn orders_by_priority() {
        let ordered = OrderingEngine::for_steps().order(items(&[
            ("D", Some(4)),
            ("B", Some(2)),
            ("A", Some(1)),
            ("C", Some(3)),
        ]));
        assert_eq!(names(&ordered), ["A", "B", "C", "D"]);
    }

    #[test]
    fn equal_priorities_keep_input_order() {
        let ordered = OrderingEngine::for_steps().order(items(&[
            ("x", Some(1)),
            ("first", Some(0)),
            ("y", Some(1)),
            ("second", None),
            ("z", Some(1)),
        ]));
        assert_eq!(names(&ordered), ["first", "second", "x", "y", "z"]);
    }

    #[test]
    fn front_policy_places_undeclared_before_positive() {
        let ordered = OrderingEngine::new(FallbackPolicy::Front)
            .order(items(&[("a", Some(1)), ("u", None), ("n", Some(-1))]));
        assert_eq!(names(&ordered), ["n", "u", "a"]);
    }

    #[test]
    fn end_policy_places_undeclared_last() {
        let ordered = OrderingEngine::new(FallbackPolicy::End)
            .order(items(&[("u", None), ("b", Some(5)), ("v", None), ("a", Some(1))]));
        assert_eq!(names(&ordered), ["a", "b", "u", "v"]);
    }

    #[test]
    fn end_policy_ties_with_explicit_max() {
        let ordered = OrderingEngine::for_groups()
            .order(items(&[("u", None), ("max", Some(i32::MAX))]));
        assert_eq!(names(&ordered), ["u", "max"]);
    }

    #[test]
    fn ordering_is_idempotent() {
        let engine = OrderingEngine::for_groups();
        let input = items(&[("c", None), ("a", Some(3)), ("b", Some(3)), ("d", Some(1))]);
        let once = engine.order(input.clone());
        let twice = engine.order(once.clone());
        assert_eq!(once, twice);
        assert_eq!(engine.order(input), once);
    }

    #[test]
    fn order_refs_leaves_input_untouched() {
        let input = items(&[("b", Some(2)), ("a", Some(1))]);
        let ordered = OrderingEngine::for_steps().order_refs(&input);
        assert_eq!(ordered[0].name, "a");
        assert_eq!(names(&input), ["b", "a"]);
    }

    #[test]
    fn empty_input() {
        let ordered = OrderingEngine::default().order(Vec::<NamedItem>::new());
        assert!(ordered.is_empty());
    }

    #[test]
    fn policy_values_and_display() {
        assert_eq!(FallbackPolicy::Front.value(), 0);
        assert_eq!(FallbackPolicy::End.value(), i32::MAX);
        assert_eq!(FallbackPolicy::End.to_string(), "end");
        assert_eq!(OrderingEngine::for_groups().fallback(), FallbackPolicy::End);
    }

    #[test]
    fn policy_parses_from_yaml() {
        let policy: FallbackPolicy = serde_yaml::from_str("end").unwrap();
        assert_eq!(policy, FallbackPolicy::End);
    }
}
