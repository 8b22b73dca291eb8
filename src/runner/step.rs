//! Step execution with failure capture and skip guards.

use std::error::Error as StdError;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::context::{ChainContext, ChainOutput};
use crate::error::StepTimeout;

use super::failure::{annotate, ChainFailure};
use super::outcome::{Skip, StepError};

/// How long a body may keep running after its cancellation token fires.
pub const CANCEL_GRACE: Duration = Duration::from_millis(100);

/// Runs one named step against a [`ChainContext`].
///
/// Every failure of the body is recorded in the chain's history before it is
/// returned, so later steps can see it. Guarded variants skip the body when
/// an earlier failure of a given kind was recorded.
///
/// Created with [`ChainContext::step`].
#[derive(Debug)]
pub struct StepRunner<'a> {
    context: &'a ChainContext,
    name: String,
    deadline: Option<Duration>,
}

impl<'a> StepRunner<'a> {
    pub(crate) fn new(context: &'a ChainContext, name: impl Into<String>) -> Self {
        Self {
            context,
            name: name.into(),
            deadline: context.step_deadline(),
        }
    }

    /// Cancel async bodies after `deadline`. A zero duration disables it.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline).filter(|d| !d.is_zero());
        self
    }

    /// Remove any deadline, including the context default.
    pub fn no_deadline(mut self) -> Self {
        self.deadline = None;
        self
    }

    /// Name of the step.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deadline async bodies will run under.
    pub fn effective_deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Run the body unconditionally.
    ///
    /// A failure is wrapped, recorded in the chain and returned as
    /// [`StepError::Failed`].
    #[track_caller]
    pub fn run<T, F>(self, body: F) -> Result<T, StepError>
    where
        F: FnOnce(&ChainOutput) -> anyhow::Result<T>,
    {
        let location = Location::caller();
        self.run_at(body, location)
    }

    /// Run the body unless a failure of kind `K` was recorded earlier.
    ///
    /// When one was, the body is not executed and the result is
    /// [`StepError::Skipped`] with the matched failure's message as reason.
    #[track_caller]
    pub fn run_unless<K, T, F>(self, body: F) -> Result<T, StepError>
    where
        K: StdError + Send + Sync + 'static,
        F: FnOnce(&ChainOutput) -> anyhow::Result<T>,
    {
        let location = Location::caller();
        self.guard::<K>(location)?;
        self.run_at(body, location)
    }

    /// Run an async body, cancelling it once the deadline passes.
    ///
    /// At the deadline the body's [`CancellationToken`] fires and the body is
    /// polled for up to [`CANCEL_GRACE`] more so it can wind down. Either way
    /// the step is reported as a [`StepTimeout`] failure.
    #[track_caller]
    pub fn run_async<T, F, Fut>(self, body: F) -> impl Future<Output = Result<T, StepError>> + 'a
    where
        T: 'a,
        F: FnOnce(Arc<ChainOutput>, CancellationToken) -> Fut + 'a,
        Fut: Future<Output = anyhow::Result<T>> + 'a,
    {
        let location = Location::caller();
        async move { self.run_async_at(body, location).await }
    }

    /// Async counterpart of [`run_unless`](Self::run_unless).
    #[track_caller]
    pub fn run_unless_async<K, T, F, Fut>(
        self,
        body: F,
    ) -> impl Future<Output = Result<T, StepError>> + 'a
    where
        K: StdError + Send + Sync + 'static,
        T: 'a,
        F: FnOnce(Arc<ChainOutput>, CancellationToken) -> Fut + 'a,
        Fut: Future<Output = anyhow::Result<T>> + 'a,
    {
        let location = Location::caller();
        async move {
            self.guard::<K>(location)?;
            self.run_async_at(body, location).await
        }
    }

    /// Run the body only if `key`, produced by group `group`, is present in
    /// the output. Otherwise the step is skipped.
    #[track_caller]
    pub fn run_with_group<T, F>(self, group: &str, key: &str, body: F) -> Result<T, StepError>
    where
        F: FnOnce(&ChainOutput) -> anyhow::Result<T>,
    {
        let location = Location::caller();
        if !self.context.output().contains_key(key) {
            let skip = Skip::new(
                &self.name,
                format!("output '{}' from group '{}' is not available", key, group),
            );
            warn!("Step '{}' skipped: {}", self.name, skip.reason);
            return Err(StepError::Skipped(skip));
        }
        self.run_at(body, location)
    }

    /// Skip when a failure of kind `K` was recorded, without running anything.
    ///
    /// The reason defaults to the matched failure's message. Nothing is
    /// recorded in the chain.
    pub fn skip_if<K>(&self, reason: Option<&str>) -> Result<(), StepError>
    where
        K: StdError + Send + Sync + 'static,
    {
        match self.context.errors().find_kind::<K>() {
            Some(matched) => {
                let reason = reason.map_or_else(|| matched.to_string(), str::to_string);
                Err(StepError::Skipped(Skip::matching(&self.name, reason, &matched)))
            }
            None => Ok(()),
        }
    }

    fn run_at<T, F>(self, body: F, location: &'static Location<'static>) -> Result<T, StepError>
    where
        F: FnOnce(&ChainOutput) -> anyhow::Result<T>,
    {
        debug!("Running step '{}'", self.name);
        let output: &ChainOutput = self.context.output();
        let result = body(output);
        self.settle(result, location)
    }

    async fn run_async_at<T, F, Fut>(
        self,
        body: F,
        location: &'static Location<'static>,
    ) -> Result<T, StepError>
    where
        F: FnOnce(Arc<ChainOutput>, CancellationToken) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        debug!("Running async step '{}' (deadline: {:?})", self.name, self.deadline);
        let token = CancellationToken::new();
        let work = body(Arc::clone(self.context.output()), token.clone());
        let mut work = std::pin::pin!(work);

        let result = match self.deadline {
            Some(limit) => match tokio::time::timeout(limit, &mut work).await {
                Ok(result) => result,
                Err(_) => {
                    token.cancel();
                    // The body gets a short window to observe cancellation and unwind.
                    if tokio::time::timeout(CANCEL_GRACE, &mut work).await.is_err() {
                        warn!(
                            "Step '{}' ignored cancellation for {:?}, abandoning it",
                            self.name, CANCEL_GRACE
                        );
                    }
                    Err(anyhow::Error::new(StepTimeout {
                        step: self.name.clone(),
                        timeout: limit,
                    }))
                }
            },
            None => work.await,
        };

        self.settle(result, location)
    }

    /// Skip if a failure of kind `K` is on record, recording the skip itself.
    fn guard<K>(&self, location: &'static Location<'static>) -> Result<(), StepError>
    where
        K: StdError + Send + Sync + 'static,
    {
        let Some(matched) = self.context.errors().find_kind::<K>() else {
            return Ok(());
        };

        let skip = Skip::matching(&self.name, matched.to_string(), &matched);
        warn!(
            "Step '{}' skipped: earlier failure in '{}' matched guard",
            self.name, matched.step
        );
        self.record(anyhow::Error::new(skip.clone()), location);
        Err(StepError::Skipped(skip))
    }

    fn settle<T>(
        &self,
        result: anyhow::Result<T>,
        location: &'static Location<'static>,
    ) -> Result<T, StepError> {
        match result {
            Ok(value) => {
                debug!("Step '{}' completed", self.name);
                Ok(value)
            }
            Err(error) => {
                let failure = self.record(error, location);
                warn!("Step '{}' errored: {}", self.name, failure.error());
                Err(StepError::Failed(failure))
            }
        }
    }

    fn record(&self, error: anyhow::Error, location: &'static Location<'static>) -> Arc<ChainFailure> {
        let errors = self.context.errors();
        let failure = Arc::new(ChainFailure::new(
            &self.name,
            location,
            annotate(errors),
            error,
        ));
        errors.push(Arc::clone(&failure));
        failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MissingOutputError;
    use crate::runner::{Annotation, StepStatus};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("The method or operation is not implemented.")]
    struct NotImplemented;

    #[derive(Debug, thiserror::Error)]
    #[error("Deliberate failure")]
    struct InvalidOperation;

    #[test]
    fn run_returns_body_value() {
        let chain = ChainContext::new();
        let value = chain.step("a").run(|_| Ok(7)).unwrap();
        assert_eq!(value, 7);
        assert!(chain.errors().is_empty());
    }

    #[test]
    fn run_records_and_returns_failure() {
        let chain = ChainContext::new();
        let err = chain
            .step("Step1_Fails")
            .run(|_| -> anyhow::Result<()> { Err(InvalidOperation.into()) })
            .unwrap_err();

        let failure = err.failure().unwrap();
        assert_eq!(failure.step, "Step1_Fails");
        assert_eq!(failure.annotation, Annotation::Failed);
        assert!(failure.is_kind::<InvalidOperation>());
        assert_eq!(failure.file_name(), "step.rs");
        assert_eq!(chain.errors().len(), 1);
    }

    #[test]
    fn second_failure_is_annotated_skipped() {
        let chain = ChainContext::new();
        let _ = chain.step("a").run(|_| -> anyhow::Result<()> { anyhow::bail!("one") });
        let err = chain
            .step("b")
            .run(|_| -> anyhow::Result<()> { anyhow::bail!("two") })
            .unwrap_err();
        assert_eq!(err.failure().unwrap().annotation, Annotation::Skipped);
    }

    #[test]
    fn run_unless_skips_on_matching_kind() {
        let chain = ChainContext::new();
        let _ = chain
            .step("Step1_Fails")
            .run(|_| -> anyhow::Result<()> { Err(InvalidOperation.into()) });

        let executed = AtomicBool::new(false);
        let result = chain.step("Step2").run_unless::<InvalidOperation, (), _>(|_| {
            executed.store(true, Ordering::SeqCst);
            anyhow::bail!("This should not execute")
        });

        assert!(!executed.load(Ordering::SeqCst));
        let skip = result.unwrap_err();
        let skip = skip.skip().unwrap();
        assert_eq!(skip.matched_step.as_deref(), Some("Step1_Fails"));
        assert!(skip.reason.contains("Deliberate failure"));
        assert_eq!(chain.errors().len(), 2);
        assert_eq!(chain.errors().latest().unwrap().annotation, Annotation::Skipped);
    }

    #[test]
    fn run_unless_runs_on_other_kind() {
        let chain = ChainContext::new();
        let _ = chain
            .step("a")
            .run(|_| -> anyhow::Result<()> { Err(InvalidOperation.into()) });

        let result = chain.step("b").run_unless::<NotImplemented, _, _>(|_| Ok("ran"));
        assert_eq!(result.unwrap(), "ran");
    }

    #[test]
    fn run_unless_matches_original_through_rewrap() {
        let chain = ChainContext::new();
        let inner = ChainContext::new();
        let _ = chain.step("outer").run(|_| -> anyhow::Result<()> {
            inner
                .step("inner")
                .run(|_| -> anyhow::Result<()> { Err(NotImplemented.into()) })?;
            Ok(())
        });

        let result = chain.step("guarded").run_unless::<NotImplemented, (), _>(|_| Ok(()));
        assert!(result.unwrap_err().is_skip());
    }

    #[test]
    fn missing_output_is_recorded_with_its_kind() {
        let chain = ChainContext::new();
        let err = chain
            .step("reader")
            .run(|output| Ok(output.get::<u64>("Sleep")?))
            .unwrap_err();
        assert!(err.failure().unwrap().is_kind::<MissingOutputError>());
        let skipped = chain.step("next").run_unless::<MissingOutputError, (), _>(|_| Ok(()));
        assert_eq!(StepStatus::of(&skipped), StepStatus::Skipped);
    }

    #[test]
    fn skip_if_does_not_record() {
        let chain = ChainContext::new();
        assert!(chain.step("x").skip_if::<InvalidOperation>(None).is_ok());

        let _ = chain
            .step("a")
            .run(|_| -> anyhow::Result<()> { Err(InvalidOperation.into()) });
        let err = chain
            .step("x")
            .skip_if::<InvalidOperation>(Some("custom"))
            .unwrap_err();
        assert_eq!(err.skip().unwrap().reason, "custom");
        assert_eq!(chain.errors().len(), 1);
    }

    #[test]
    fn run_with_group_skips_without_key() {
        let chain = ChainContext::new();
        let result = chain
            .step("consume")
            .run_with_group("Producer", "SharedKey", |output| Ok(output.get::<String>("SharedKey")?));
        let err = result.unwrap_err();
        assert!(err.skip().unwrap().reason.contains("'Producer'"));
        assert!(chain.errors().is_empty());

        chain.output().set("SharedKey", "Shared Result".to_string());
        let value = chain
            .step("consume")
            .run_with_group("Producer", "SharedKey", |output| Ok(output.get::<String>("SharedKey")?))
            .unwrap();
        assert_eq!(value, "Shared Result");
    }

    #[test]
    fn zero_deadline_disables_timeout() {
        let chain = ChainContext::new();
        let runner = chain.step("a").deadline(Duration::ZERO);
        assert!(runner.effective_deadline().is_none());
        let runner = chain.step("a").deadline(Duration::from_secs(1)).no_deadline();
        assert!(runner.effective_deadline().is_none());
    }

    #[tokio::test]
    async fn run_async_returns_value() {
        let chain = ChainContext::new();
        let value = chain
            .step("async")
            .run_async(|output, _token| async move {
                output.set("k", 1u8);
                Ok(5)
            })
            .await
            .unwrap();
        assert_eq!(value, 5);
        assert_eq!(chain.output().get::<u8>("k").unwrap(), 1);
    }

    #[tokio::test]
    async fn run_async_times_out_as_step_timeout() {
        let chain = ChainContext::new();
        let err = chain
            .step("slow")
            .deadline(Duration::from_millis(20))
            .run_async(|_, _| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        let failure = err.failure().unwrap();
        assert!(failure.is_kind::<StepTimeout>());
        let timeout = failure.original().downcast_ref::<StepTimeout>().unwrap();
        assert_eq!(timeout.step, "slow");
        assert_eq!(timeout.timeout, Duration::from_millis(20));
    }

    #[tokio::test]
    async fn run_async_cancels_token_at_deadline() {
        let chain = ChainContext::new();
        let observed = CancellationToken::new();
        let handle = observed.clone();
        let _ = chain
            .step("slow")
            .deadline(Duration::from_millis(10))
            .run_async(move |_, token| async move {
                let watcher = token.clone();
                tokio::spawn(async move {
                    watcher.cancelled().await;
                    handle.cancel();
                });
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        tokio::time::timeout(Duration::from_secs(1), observed.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn run_async_body_observes_cancellation() {
        let chain = ChainContext::new();
        let saw_cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&saw_cancel);

        let err = chain
            .step("cooperative")
            .deadline(Duration::from_millis(20))
            .run_async(move |_, token| async move {
                token.cancelled().await;
                flag.store(true, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("stopped early"))
            })
            .await
            .unwrap_err();

        assert!(saw_cancel.load(Ordering::SeqCst));
        let failure = err.failure().unwrap();
        assert!(failure.is_kind::<StepTimeout>());
        assert_eq!(chain.errors().len(), 1);
    }

    #[tokio::test]
    async fn run_async_abandons_body_ignoring_cancellation() {
        let chain = ChainContext::new();
        let start = std::time::Instant::now();
        let err = chain
            .step("stubborn")
            .deadline(Duration::from_millis(10))
            .run_async(|_, _| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(err.failure().unwrap().is_kind::<StepTimeout>());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn run_unless_async_skips_without_running() {
        let chain = ChainContext::new();
        let _ = chain
            .step("C")
            .run(|_| -> anyhow::Result<()> { Err(NotImplemented.into()) });

        let executed = AtomicBool::new(false);
        let result = chain
            .step("D")
            .run_unless_async::<NotImplemented, (), _, _>(|_, _| {
                executed.store(true, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;
        assert!(result.unwrap_err().is_skip());
        assert!(!executed.load(Ordering::SeqCst));
    }
}
