//! Declared metadata for steps and groups.

use serde::{Deserialize, Serialize};

use super::Prioritized;

/// Declared metadata of one step in a chain.
///
/// `link` is the step's priority. `flow` and `pad` only affect the display
/// name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<i32>,
    #[serde(default)]
    pub pad: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
}

impl StepDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn link(mut self, link: i32) -> Self {
        self.link = Some(link);
        self
    }

    pub fn pad(mut self, pad: usize) -> Self {
        self.pad = pad;
        self
    }

    pub fn flow(mut self, flow: impl Into<String>) -> Self {
        self.flow = Some(flow.into());
        self
    }

    /// Name shown in reports: `#<link> | <flow> | <name>`.
    ///
    /// The link is zero-padded to `pad` digits. The flow segment is left out
    /// when no flow is set, and the whole prefix when the link is unset or 0.
    pub fn display_name(&self) -> String {
        let link = match self.link {
            Some(link) if link != 0 => link,
            _ => return self.name.clone(),
        };
        let flow = match self.flow.as_deref() {
            Some(flow) if !flow.is_empty() => format!("{} | ", flow),
            _ => String::new(),
        };
        format!("#{:0>pad$} | {}{}", link, flow, self.name, pad = self.pad)
    }

    /// Set properties as key/value pairs for reporting.
    pub fn traits(&self) -> Vec<(String, String)> {
        let mut traits = vec![("Name".to_string(), self.name.clone())];
        if let Some(link) = self.link {
            traits.push(("Link".to_string(), link.to_string()));
        }
        if self.pad > 0 {
            traits.push(("Pad".to_string(), self.pad.to_string()));
        }
        if let Some(flow) = &self.flow {
            traits.push(("Flow".to_string(), flow.clone()));
        }
        traits
    }
}

impl Prioritized for StepDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> Option<i32> {
        self.link
    }
}

/// Declared metadata of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    /// Group that must finish before this one starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
}

impl GroupDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn depends_on(mut self, group: impl Into<String>) -> Self {
        self.depends_on = Some(group.into());
        self
    }

    /// Set properties as key/value pairs for reporting.
    pub fn traits(&self) -> Vec<(String, String)> {
        let mut traits = vec![("Name".to_string(), self.name.clone())];
        if let Some(order) = self.order {
            traits.push(("Order".to_string(), order.to_string()));
        }
        if let Some(group) = &self.depends_on {
            traits.push(("DependsOn".to_string(), group.clone()));
        }
        traits
    }
}

impl Prioritized for GroupDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> Option<i32> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderingEngine;

    #[test]
    fn display_name_without_link_is_plain() {
        assert_eq!(StepDescriptor::new("Login").display_name(), "Login");
        assert_eq!(
            StepDescriptor::new("Login").link(0).flow("Auth").display_name(),
            "Login"
        );
    }

    #[test]
    fn display_name_with_link_and_flow() {
        let step = StepDescriptor::new("Login").link(5).pad(2).flow("Auth");
        assert_eq!(step.display_name(), "#05 | Auth | Login");
    }

    #[test]
    fn display_name_omits_empty_flow() {
        let step = StepDescriptor::new("Login").link(12);
        assert_eq!(step.display_name(), "#12 | Login");
        let step = StepDescriptor::new("Login").link(3).flow("");
        assert_eq!(step.display_name(), "#3 | Login");
    }

    #[test]
    fn step_traits_list_set_properties() {
        let step = StepDescriptor::new("Sleep").link(2).flow("Main");
        assert_eq!(
            step.traits(),
            vec![
                ("Name".to_string(), "Sleep".to_string()),
                ("Link".to_string(), "2".to_string()),
                ("Flow".to_string(), "Main".to_string()),
            ]
        );
    }

    #[test]
    fn group_traits_list_set_properties() {
        let group = GroupDescriptor::new("Consumer").depends_on("Producer");
        assert_eq!(
            group.traits(),
            vec![
                ("Name".to_string(), "Consumer".to_string()),
                ("DependsOn".to_string(), "Producer".to_string()),
            ]
        );
    }

    #[test]
    fn descriptors_sort_by_declared_priority() {
        let steps = vec![
            StepDescriptor::new("C").link(3),
            StepDescriptor::new("A").link(1),
            StepDescriptor::new("B").link(2),
        ];
        let ordered = OrderingEngine::for_steps().order(steps);
        assert_eq!(ordered[0].name, "A");

        let groups = vec![
            GroupDescriptor::new("untagged"),
            GroupDescriptor::new("first").order(1),
        ];
        let ordered = OrderingEngine::for_groups().order(groups);
        assert_eq!(ordered[0].name, "first");
    }
}
