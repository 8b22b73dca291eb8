//! Tests for the public library API surface.

use testchain::config::{load_config_with_env, ChainConfig};
use testchain::{
    ChainContext, FallbackPolicy, GroupBarrier, OrderingEngine, OutputScope, StepDescriptor,
};

#[test]
fn root_reexports_are_usable() {
    let chain = ChainContext::default();
    assert_eq!(chain.scope(), OutputScope::Chain);
    assert_eq!(OrderingEngine::for_steps().fallback(), FallbackPolicy::Front);
    assert_eq!(StepDescriptor::new("x").link(1).display_name(), "#1 | x");
}

#[test]
fn global_barrier_uses_default_timings() {
    let barrier = GroupBarrier::global();
    assert_eq!(barrier.poll_interval().as_millis(), 500);
    assert_eq!(barrier.default_timeout().as_secs(), 360);
}

#[test]
fn config_wires_into_components() {
    let temp = tempfile::TempDir::new().unwrap();
    std::fs::write(
        temp.path().join(".testchain.yml"),
        "barrier:\n  poll_interval_ms: 20\nsteps:\n  deadline_ms: 250\nordering:\n  steps: end\n",
    )
    .unwrap();

    let config: ChainConfig = load_config_with_env(temp.path(), None, |_| None).unwrap();
    let barrier = GroupBarrier::from_config(&config.barrier);
    assert_eq!(barrier.poll_interval().as_millis(), 20);

    let chain = ChainContext::new().with_step_deadline(config.steps.deadline());
    assert_eq!(chain.step("a").effective_deadline().unwrap().as_millis(), 250);
    assert_eq!(config.ordering.step_engine().fallback(), FallbackPolicy::End);
}
