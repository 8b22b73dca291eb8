//! Demo command implementation.
//!
//! The `testchain demo` command runs a built-in chain and prints the outcome
//! of each step.

use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::barrier::GroupBarrier;
use crate::cli::args::Scenario;
use crate::config::ChainConfig;
use crate::context::{ChainContext, OutputKey};
use crate::error::{ChainError, MissingOutputError, Result};
use crate::order::{GroupDescriptor, GroupPlan, StepDescriptor};
use crate::runner::{StepError, StepStatus};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Failure raised by the deliberately unfinished step of the flow scenario.
#[derive(Debug, thiserror::Error)]
#[error("The method or operation is not implemented.")]
pub struct NotImplemented;

/// Outcome of one step, as printed.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub group: Option<String>,
    pub name: String,
    pub status: StepStatus,
    pub detail: Option<String>,
}

impl StepReport {
    fn new<T>(step: &StepDescriptor, result: &std::result::Result<T, StepError>) -> Self {
        let detail = match result {
            Ok(_) => None,
            Err(StepError::Failed(failure)) => Some(failure.to_string()),
            Err(StepError::Skipped(skip)) => Some(skip.reason.clone()),
        };
        Self {
            group: None,
            name: step.display_name(),
            status: StepStatus::of(result),
            detail,
        }
    }

    fn in_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }
}

/// The demo command implementation.
pub struct DemoCommand {
    scenario: Scenario,
    config: ChainConfig,
}

impl DemoCommand {
    /// Create a new demo command.
    pub fn new(scenario: Scenario, config: ChainConfig) -> Self {
        Self { scenario, config }
    }

    /// Run the scenario and collect step reports.
    pub fn run_scenario(&self) -> Result<Vec<StepReport>> {
        match self.scenario {
            Scenario::Flow => self.flow(),
            Scenario::Collections => self.collections(),
            Scenario::Skip => Ok(self.skip()),
        }
    }

    fn chain(&self) -> ChainContext {
        ChainContext::new().with_step_deadline(self.config.steps.deadline())
    }

    /// Four ordered steps: set a value, sleep on it, fail, then a guarded step.
    fn flow(&self) -> Result<Vec<StepReport>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        // Declared out of order; the engine sorts them by link.
        let steps = vec![
            StepDescriptor::new("Guarded").link(4).pad(2).flow("Main"),
            StepDescriptor::new("Sleep").link(2).pad(2).flow("Main"),
            StepDescriptor::new("Set sleep").link(1).pad(2).flow("Main"),
            StepDescriptor::new("Not implemented").link(3).pad(2).flow("Main"),
        ];
        let steps = self.config.ordering.step_engine().order(steps);

        let chain = self.chain();
        let sleep_key = OutputKey::<u64>::new("Sleep", None);
        let mut reports = Vec::with_capacity(steps.len());

        for step in &steps {
            let runner = chain.step(step.display_name());
            let report = match step.name.as_str() {
                "Set sleep" => StepReport::new(
                    step,
                    &runner.run(|output| {
                        sleep_key.put(output, 50);
                        Ok(())
                    }),
                ),
                "Sleep" => {
                    let key = sleep_key.clone();
                    let result = runtime.block_on(runner.run_async(|output, token| async move {
                        let ms = key.get(&output)?;
                        tokio::select! {
                            _ = tokio::time::sleep(Duration::from_millis(ms)) => {}
                            _ = token.cancelled() => debug!("Sleep cancelled"),
                        }
                        Ok::<_, anyhow::Error>(())
                    }));
                    StepReport::new(step, &result)
                }
                "Not implemented" => StepReport::new(
                    step,
                    &runner.run(|_| -> anyhow::Result<()> { Err(NotImplemented.into()) }),
                ),
                _ => StepReport::new(
                    step,
                    &runner.run_unless::<NotImplemented, _, _>(|_| Ok(())),
                ),
            };
            reports.push(report);
        }

        Ok(reports)
    }

    /// A consumer group waits for a producer group and reads its output.
    fn collections(&self) -> Result<Vec<StepReport>> {
        const SHARED_KEY: &str = "SharedKey";

        let groups = vec![
            GroupDescriptor::new("Consumer").depends_on("Producer"),
            GroupDescriptor::new("Producer").order(1),
        ];
        GroupPlan::from_groups(&groups).validate()?;
        let groups = self.config.ordering.group_engine().order(groups);

        let barrier = GroupBarrier::from_config(&self.config.barrier);
        let shared = ChainContext::process_scoped().with_step_deadline(self.config.steps.deadline());

        let reports = thread::scope(|scope| {
            let handles: Vec<_> = groups
                .iter()
                .map(|group| {
                    let barrier = &barrier;
                    let chain = shared.fork();
                    scope.spawn(move || run_group(group, barrier, &chain, SHARED_KEY))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|_| ChainError::Other(anyhow::anyhow!("group thread panicked")))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        Ok(reports.into_iter().flatten().collect())
    }

    /// A missing output drives a guarded skip and a stand-alone skip check.
    fn skip(&self) -> Vec<StepReport> {
        let chain = self.chain();
        let read = StepDescriptor::new("Read token").link(1);
        let use_token = StepDescriptor::new("Use token").link(2);
        let cleanup = StepDescriptor::new("Cleanup").link(3);
        let report = StepDescriptor::new("Report").link(4);

        let mut reports = vec![StepReport::new(
            &read,
            &chain
                .step(read.display_name())
                .run(|output| Ok(output.get::<String>("Token")?)),
        )];

        reports.push(StepReport::new(
            &use_token,
            &chain
                .step(use_token.display_name())
                .run_unless::<MissingOutputError, _, _>(|output| Ok(output.get::<String>("Token")?.len())),
        ));

        let runner = chain.step(cleanup.display_name());
        let result = runner
            .skip_if::<MissingOutputError>(Some("nothing to clean up"))
            .and_then(|()| runner.run(|_| Ok(())));
        reports.push(StepReport::new(&cleanup, &result));

        reports.push(StepReport::new(
            &report,
            &chain
                .step(report.display_name())
                .run(|_| Ok(chain.errors().len())),
        ));

        reports
    }
}

fn run_group(
    group: &GroupDescriptor,
    barrier: &GroupBarrier,
    chain: &ChainContext,
    shared_key: &str,
) -> Vec<StepReport> {
    let _registration = barrier.register_scoped(group.name.clone());
    let mut reports = Vec::new();

    if let Some(dependency) = &group.depends_on {
        let wait = StepDescriptor::new(format!("Wait for {}", dependency));
        let result = chain
            .step(wait.display_name())
            .run(|_| Ok(barrier.wait_for_default(dependency)?));
        let waited = result.is_ok();
        reports.push(StepReport::new(&wait, &result).in_group(&group.name));
        if !waited {
            return reports;
        }

        let consume = StepDescriptor::new("Consume");
        let result = chain
            .step(consume.display_name())
            .run_with_group(dependency, shared_key, |output| Ok(output.get_string(shared_key)?));
        reports.push(StepReport::new(&consume, &result).in_group(&group.name));
    } else {
        let produce = StepDescriptor::new("Produce");
        let result = chain.step(produce.display_name()).run(|output| {
            thread::sleep(Duration::from_millis(20));
            output.set(shared_key, "Shared Result".to_string());
            Ok(())
        });
        reports.push(StepReport::new(&produce, &result).in_group(&group.name));
    }

    reports
}

impl Command for DemoCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let reports = self.run_scenario()?;

        ui.show_header(&format!("Scenario: {:?}", self.scenario).to_lowercase());
        for report in &reports {
            let name = match &report.group {
                Some(group) => format!("{} / {}", group, report.name),
                None => report.name.clone(),
            };
            ui.message(&format!(
                "{} {:<32} {}",
                report.status.display_char(),
                name,
                report.status
            ));
            if let Some(detail) = &report.detail {
                for line in detail.lines() {
                    ui.message(&format!("    {}", line));
                }
            }
        }

        let count = |status: StepStatus| reports.iter().filter(|r| r.status == status).count();
        let failed = count(StepStatus::Failed);
        ui.message(&format!(
            "{} completed, {} failed, {} skipped",
            count(StepStatus::Completed),
            failed,
            count(StepStatus::Skipped)
        ));

        if failed > 0 {
            Ok(CommandResult::failure(1))
        } else {
            ui.success("All steps completed or skipped");
            Ok(CommandResult::success())
        }
    }
}
