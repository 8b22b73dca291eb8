//! Order command implementation.
//!
//! The `testchain order` command prints the execution order of named items.

use serde::Serialize;

use crate::cli::args::OrderArgs;
use crate::config::ChainConfig;
use crate::error::{ChainError, Result};
use crate::order::{NamedItem, OrderingEngine};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The order command implementation.
pub struct OrderCommand {
    args: OrderArgs,
    engine: OrderingEngine,
}

#[derive(Debug, Serialize)]
struct OrderedEntry<'a> {
    position: usize,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<i32>,
    effective_priority: i32,
}

impl OrderCommand {
    /// Create a new order command using the configured fallback policy.
    pub fn new(args: OrderArgs, config: &ChainConfig) -> Self {
        let engine = if args.groups {
            config.ordering.group_engine()
        } else {
            config.ordering.step_engine()
        };
        Self { args, engine }
    }

    /// Get the engine this command orders with.
    pub fn engine(&self) -> OrderingEngine {
        self.engine
    }
}

/// Parse `name` or `name=priority`.
pub fn parse_item(raw: &str) -> std::result::Result<NamedItem, String> {
    let raw = raw.trim();
    let (name, priority) = match raw.split_once('=') {
        Some((name, priority)) => {
            let priority = priority
                .trim()
                .parse::<i32>()
                .map_err(|_| format!("Invalid priority in '{}'", raw))?;
            (name.trim(), Some(priority))
        }
        None => (raw, None),
    };
    if name.is_empty() {
        return Err(format!("Missing item name in '{}'", raw));
    }
    Ok(NamedItem::new(name, priority))
}

impl Command for OrderCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut items = Vec::with_capacity(self.args.items.len());
        for raw in &self.args.items {
            match parse_item(raw) {
                Ok(item) => items.push(item),
                Err(message) => {
                    ui.error(&message);
                    return Ok(CommandResult::failure(2));
                }
            }
        }

        let ordered = self.engine.order(items);
        let entries: Vec<OrderedEntry<'_>> = ordered
            .iter()
            .enumerate()
            .map(|(i, item)| OrderedEntry {
                position: i + 1,
                name: &item.name,
                priority: item.priority,
                effective_priority: self.engine.effective_priority(item),
            })
            .collect();

        if self.args.json {
            let json =
                serde_json::to_string_pretty(&entries).map_err(|e| ChainError::Other(e.into()))?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        let kind = if self.args.groups { "Group" } else { "Step" };
        ui.show_header(&format!(
            "{} order (undeclared: {})",
            kind,
            self.engine.fallback()
        ));
        for entry in &entries {
            let priority = match entry.priority {
                Some(p) => p.to_string(),
                None => format!("default {}", entry.effective_priority),
            };
            ui.message(&format!("{:>3}. {} ({})", entry.position, entry.name, priority));
        }

        Ok(CommandResult::success())
    }
}
