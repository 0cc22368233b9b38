//! End-to-end behavior of the engine and the trigger surface against the
//! in-memory adapters and the simulated driver.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use common::{apply, dry_run, Lab, LEAF_RUNNING};
use converge::adapters::memory::{EventBus, MemoryResultSink};
use converge::adapters::simulated::{Fault, MemoryDriver};
use converge::model::{
    ChangeAction, ChangeEvent, ErrorKind, Initiator, ObjectKind, ReconciliationRequest,
    RequestError, RequestOptions, ResultStatus, Stage,
};
use converge::ports::Clock;
use converge::reconcile::{NotReady, StageTimeouts};
use converge::trigger::{watch, Dispatch, IgnoreReason};
use converge::Settings;

fn renamed(target_id: &str) -> ChangeEvent {
    ChangeEvent::new(target_id, ObjectKind::Device, ChangeAction::Updated, Utc::now())
        .with_change("name", json!("leaf-old"), json!("leaf-new"))
}

// Scenario: a relevant update runs the engine and the diff shows only the
// renamed hostname.
#[tokio::test]
async fn relevant_update_previews_only_the_name_change() {
    let lab = Lab::new();
    lab.add_leaf("leaf1", "leaf-new", "10.0.0.1");
    let triggers = lab.triggers(&Settings::default());

    let dispatch = triggers.on_event(&renamed("leaf1")).await;

    let result = dispatch.result().expect("engine should run");
    assert_eq!(result.status(), ResultStatus::DryRunPreview);
    assert_eq!(result.initiator(), Initiator::Hook);
    assert_eq!(result.diff(), Some("-hostname leaf-old\n+hostname leaf-new"));
    assert_eq!(lab.driver.counts().commit, 0);
}

// Scenario: an update touching only non-whitelisted fields never reaches
// the engine.
#[tokio::test]
async fn irrelevant_update_never_invokes_the_engine() {
    let lab = Lab::new();
    lab.add_leaf("leaf1", "leaf-new", "10.0.0.1");
    let triggers = lab.triggers(&Settings::default());

    let event = ChangeEvent::new("leaf1", ObjectKind::Device, ChangeAction::Updated, Utc::now())
        .with_change("comment", json!("a"), json!("b"));
    let dispatch = triggers.on_event(&event).await;

    assert_eq!(dispatch, Dispatch::Ignored(IgnoreReason::NotRelevant));
    assert_eq!(lab.driver.counts().connect, 0);
    assert!(lab.results.results().is_empty());
}

// Scenario: a target without an address is skipped before any session is
// constructed.
#[tokio::test]
async fn target_without_address_is_skipped() {
    let lab = Lab::new();
    let mut target = lab.add_leaf("leaf2", "leaf2", "10.0.0.2");
    target.address = None;
    lab.inventory.upsert(target);

    let result = lab.engine.run(lab.request("leaf2", dry_run(), Initiator::Manual)).await;

    assert_eq!(result.status(), ResultStatus::Skipped);
    assert_eq!(result.reason(), Some("missing address"));
    assert_eq!(result.error_kind(), Some(ErrorKind::Validation));
    assert!(!result.is_escalated());
    assert_eq!(result.stages_completed(), &[Stage::Init]);
    assert_eq!(lab.driver.counts().connect, 0);
}

#[tokio::test]
async fn unknown_driver_kind_is_skipped_without_connecting() {
    let lab = Lab::new();
    let target = lab.add_leaf("leaf2", "leaf2", "10.0.0.2").with_driver("eos");
    lab.inventory.upsert(target);

    let result = lab.engine.run(lab.request("leaf2", apply(), Initiator::Manual)).await;

    assert_eq!(result.status(), ResultStatus::Skipped);
    assert_eq!(result.reason(), Some("no driver registered for `eos`"));
    assert_eq!(lab.driver.counts().connect, 0);
}

#[tokio::test]
async fn unknown_target_is_skipped() {
    let lab = Lab::new();
    let result = lab.engine.run(lab.request("ghost", dry_run(), Initiator::Manual)).await;

    assert_eq!(result.status(), ResultStatus::Skipped);
    assert_eq!(result.reason(), Some("target `ghost` not found"));
    assert!(result.stages_completed().is_empty());
}

// Scenario: a dry run with pending changes discards exactly once and never
// commits.
#[tokio::test]
async fn dry_run_discards_once_and_never_commits() {
    let lab = Lab::new();
    lab.add_leaf("leaf3", "leaf3", "10.0.0.3");

    let result = lab.engine.run(lab.request("leaf3", dry_run(), Initiator::Manual)).await;

    assert_eq!(result.status(), ResultStatus::DryRunPreview);
    assert_eq!(result.diff(), Some("-hostname leaf-old\n+hostname leaf3"));
    assert_eq!(
        result.stages_completed(),
        &[
            Stage::Init,
            Stage::Validate,
            Stage::Render,
            Stage::Connect,
            Stage::Load,
            Stage::Diff,
            Stage::Discard,
            Stage::Done
        ]
    );
    let counts = lab.driver.counts();
    assert_eq!(counts.commit, 0);
    assert_eq!(counts.discard, 1);
    assert_eq!(counts.close, 1);
    assert_eq!(lab.driver.running_config("10.0.0.3").as_deref(), Some(LEAF_RUNNING));
}

#[tokio::test]
async fn dry_run_never_commits_whatever_the_diff() {
    let lab = Lab::new();
    lab.add_leaf("leaf3", "leaf3", "10.0.0.3");

    for options in [dry_run(), RequestOptions { replace: true, ..dry_run() }] {
        let result = lab.engine.run(lab.request("leaf3", options, Initiator::Manual)).await;
        assert_eq!(result.status(), ResultStatus::DryRunPreview);
    }
    lab.driver.add_device("10.0.0.3", "hostname leaf3\ninterface Ethernet1\n   description to-spine1\n");
    let result = lab.engine.run(lab.request("leaf3", dry_run(), Initiator::Manual)).await;
    assert_eq!(result.status(), ResultStatus::Noop);

    assert_eq!(lab.driver.counts().commit, 0);
}

// Scenario: applying twice in a row commits once and then reports a no-op
// with an empty diff.
#[tokio::test]
async fn second_apply_is_a_noop() {
    let lab = Lab::new();
    lab.add_leaf("leaf3", "leaf3", "10.0.0.3");

    let first = lab.engine.run(lab.request("leaf3", apply(), Initiator::Manual)).await;
    assert_eq!(first.status(), ResultStatus::Success);
    assert_eq!(first.diff(), Some("-hostname leaf-old\n+hostname leaf3"));
    assert_eq!(first.verified_marker(), Some("hostname leaf3 revision 1"));
    assert!(first.stages_completed().contains(&Stage::Verify));

    let second = lab.engine.run(lab.request("leaf3", apply(), Initiator::Manual)).await;
    assert_eq!(second.status(), ResultStatus::Noop);
    assert_eq!(second.diff(), Some(""));
    assert!(second.stages_completed().contains(&Stage::Commit));

    assert_eq!(lab.driver.counts().commit, 2);
    assert_eq!(lab.results.results().len(), 2);
    assert_eq!(
        lab.driver.running_config("10.0.0.3").as_deref(),
        Some("hostname leaf3\ninterface Ethernet1\n   description to-spine1\n")
    );
}

// Scenario: a connect failure stops the run before anything is loaded.
#[tokio::test]
async fn connect_failure_never_loads_or_commits() {
    let lab = Lab::new();
    lab.add_leaf("leaf4", "leaf4", "10.0.0.4");
    lab.driver.arm("10.0.0.4", Fault::Unreachable);

    let result = lab.engine.run(lab.request("leaf4", apply(), Initiator::Manual)).await;

    assert_eq!(result.status(), ResultStatus::Failed);
    let error = result.error().unwrap();
    assert_eq!(error.kind, ErrorKind::Connection);
    assert_eq!(error.stage, Stage::Connect);
    assert_eq!(result.stages_completed(), &[Stage::Init, Stage::Validate, Stage::Render]);
    let counts = lab.driver.counts();
    assert_eq!((counts.load, counts.commit), (0, 0));
    assert!(result.clone().into_outcome().is_err());
}

#[tokio::test]
async fn stalled_connect_times_out() {
    let driver = MemoryDriver::new();
    let timeouts = StageTimeouts { connect: Duration::from_millis(50), ..StageTimeouts::default() };
    let lab = Lab::with_timeouts(driver, timeouts);
    lab.add_leaf("leaf4", "leaf4", "10.0.0.4");
    lab.driver.arm("10.0.0.4", Fault::StallConnect);

    let result = lab.engine.run(lab.request("leaf4", apply(), Initiator::Manual)).await;

    let error = result.error().unwrap();
    assert_eq!(error.kind, ErrorKind::Connection);
    assert!(error.message.contains("timed out"), "{}", error.message);
    assert_eq!(lab.driver.counts().load, 0);
}

#[tokio::test]
async fn stalled_load_times_out() {
    let driver = MemoryDriver::new().with_load_delay(Duration::from_millis(300));
    let timeouts = StageTimeouts { load: Duration::from_millis(30), ..StageTimeouts::default() };
    let lab = Lab::with_timeouts(driver, timeouts);
    lab.add_leaf("leaf4", "leaf4", "10.0.0.4");

    let result = lab.engine.run(lab.request("leaf4", apply(), Initiator::Manual)).await;

    let error = result.error().unwrap();
    assert_eq!(error.kind, ErrorKind::Connection);
    assert_eq!(error.stage, Stage::Load);
    assert!(error.message.contains("timed out"), "{}", error.message);
    assert_eq!(result.diff(), None);
    let counts = lab.driver.counts();
    assert_eq!((counts.diff, counts.commit, counts.close), (0, 0, 1));
    assert_eq!(lab.results.results().len(), 1);
}

#[tokio::test]
async fn stalled_commit_is_a_partial_state_failure() {
    let driver = MemoryDriver::new().with_commit_delay(Duration::from_millis(300));
    let timeouts = StageTimeouts { commit: Duration::from_millis(30), ..StageTimeouts::default() };
    let lab = Lab::with_timeouts(driver, timeouts);
    lab.add_leaf("leaf4", "leaf4", "10.0.0.4");

    let result = lab.engine.run(lab.request("leaf4", apply(), Initiator::Manual)).await;

    let error = result.error().unwrap();
    assert_eq!(error.kind, ErrorKind::Commit);
    assert_eq!(error.stage, Stage::Commit);
    assert!(error.message.contains("timed out"), "{}", error.message);
    assert!(result.partial_state());
    let counts = lab.driver.counts();
    assert_eq!((counts.confirm, counts.close), (0, 1));
    assert_eq!(lab.results.results(), vec![result]);
}

#[tokio::test]
async fn rejected_candidate_has_no_diff() {
    let lab = Lab::new();
    lab.add_leaf("leaf5", "leaf5", "10.0.0.5");
    lab.driver.arm("10.0.0.5", Fault::RejectLoad);

    let result = lab.engine.run(lab.request("leaf5", apply(), Initiator::Manual)).await;

    let error = result.error().unwrap();
    assert_eq!(error.kind, ErrorKind::ConfigRejected);
    assert_eq!(error.stage, Stage::Load);
    assert_eq!(result.diff(), None);
    let counts = lab.driver.counts();
    assert_eq!((counts.commit, counts.close), (0, 1));
}

#[tokio::test]
async fn commit_failure_flags_partial_state() {
    let lab = Lab::new();
    lab.add_leaf("leaf6", "leaf6", "10.0.0.6");
    lab.driver.arm("10.0.0.6", Fault::FailCommit);

    let result = lab.engine.run(lab.request("leaf6", apply(), Initiator::Manual)).await;

    assert_eq!(result.status(), ResultStatus::Failed);
    assert_eq!(result.error_kind(), Some(ErrorKind::Commit));
    assert!(result.partial_state());
    assert!(result.diff().is_some());
    assert!(!result.stages_completed().contains(&Stage::Commit));
    let counts = lab.driver.counts();
    assert_eq!((counts.commit, counts.confirm, counts.close), (1, 0, 1));
    assert_eq!(lab.results.results(), vec![result]);
}

#[tokio::test]
async fn cleared_fault_recovers_on_the_next_run() {
    let lab = Lab::new();
    lab.add_leaf("leaf6", "leaf6", "10.0.0.6");
    lab.driver.arm("10.0.0.6", Fault::FailCommit);

    let failed = lab.engine.run(lab.request("leaf6", apply(), Initiator::Manual)).await;
    assert_eq!(failed.error_kind(), Some(ErrorKind::Commit));

    lab.driver.disarm_all("10.0.0.6");
    let retried = lab.engine.run(lab.request("leaf6", apply(), Initiator::Manual)).await;
    assert_eq!(retried.status(), ResultStatus::Success);
    assert_eq!(retried.verified_marker(), Some("hostname leaf6 revision 1"));
}

#[tokio::test]
async fn failed_verification_only_warns() {
    let lab = Lab::new();
    lab.add_leaf("leaf7", "leaf7", "10.0.0.7");
    lab.driver.arm("10.0.0.7", Fault::FailConfirm);

    let result = lab.engine.run(lab.request("leaf7", apply(), Initiator::Manual)).await;

    assert_eq!(result.status(), ResultStatus::Success);
    assert!(result.verify_warning().unwrap().contains("post-commit verification failed"));
    assert!(!result.stages_completed().contains(&Stage::Verify));
    assert_eq!(result.stages_completed().last(), Some(&Stage::Done));
    assert!(!result.partial_state());
}

#[tokio::test]
async fn render_failures_never_connect() {
    let lab = Lab::new();
    let missing = lab.add_leaf("leaf8", "leaf8", "10.0.0.8");
    let mut blank = missing.clone();
    blank.id = "leaf9".into();
    blank.template_key = "blank".into();
    lab.inventory.upsert(blank);
    let mut unknown = missing;
    unknown.template_key = "spine".into();
    lab.inventory.upsert(unknown);

    for target in ["leaf8", "leaf9"] {
        let result = lab.engine.run(lab.request(target, apply(), Initiator::Manual)).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::Render), "{target}");
        assert_eq!(result.error().unwrap().stage, Stage::Render);
    }
    assert_eq!(lab.driver.counts().connect, 0);
}

#[tokio::test]
async fn stale_request_clock_fails_render() {
    let lab = Lab::new();
    lab.add_leaf("leaf1", "leaf1", "10.0.0.1");
    let later = lab.clock.now() + chrono::Duration::minutes(5);
    let request = ReconciliationRequest::new("r-future", "leaf1", apply(), Initiator::Manual, later)
        .unwrap();

    let result = lab.engine.run(request).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Render));
    assert!(result.error().unwrap().message.contains("predates"));
    assert_eq!(lab.driver.counts().connect, 0);
}

#[tokio::test]
async fn commit_disabled_stages_then_discards() {
    let lab = Lab::new();
    lab.add_leaf("leaf1", "leaf1", "10.0.0.1");
    let options = RequestOptions { dry_run: false, replace: false, commit: false };

    let result = lab.engine.run(lab.request("leaf1", options, Initiator::Manual)).await;

    assert_eq!(result.status(), ResultStatus::DryRunPreview);
    let counts = lab.driver.counts();
    assert_eq!((counts.commit, counts.discard), (0, 1));
}

#[tokio::test]
async fn replace_mode_removes_unmanaged_lines() {
    let lab = Lab::new();
    lab.add_leaf("leaf1", "leaf1", "10.0.0.1");
    lab.driver.add_device("10.0.0.1", &format!("{LEAF_RUNNING}ip routing\n"));

    let merge = lab.engine.run(lab.request("leaf1", dry_run(), Initiator::Manual)).await;
    assert!(!merge.diff().unwrap().contains("ip routing"));

    let options = RequestOptions { dry_run: false, replace: true, commit: true };
    let replace = lab.engine.run(lab.request("leaf1", options, Initiator::Manual)).await;
    assert_eq!(replace.status(), ResultStatus::Success);
    assert!(replace.diff().unwrap().contains("-ip routing"));
    assert!(!lab.driver.running_config("10.0.0.1").unwrap().contains("ip routing"));
}

#[tokio::test]
async fn sink_failures_do_not_change_the_result() {
    let lab = Lab::with_results(MemoryResultSink::rejecting());
    lab.add_leaf("leaf1", "leaf1", "10.0.0.1");

    let result = lab.engine.run(lab.request("leaf1", apply(), Initiator::Manual)).await;

    assert_eq!(result.status(), ResultStatus::Success);
}

#[test]
fn hook_requests_never_replace() {
    let lab = Lab::new();
    let triggers = lab.triggers(&Settings::default());

    let request = triggers.hook_request(&renamed("leaf1")).unwrap();
    assert!(!request.replace());
    assert_eq!(request.initiator(), Initiator::Hook);

    let forced = ReconciliationRequest::new(
        "r1",
        "leaf1",
        RequestOptions { replace: true, ..dry_run() },
        Initiator::Hook,
        Utc::now(),
    );
    assert_eq!(forced, Err(RequestError::ReplaceFromHook));
}

#[tokio::test]
async fn hook_gates_follow_settings() {
    let lab = Lab::new();
    lab.add_leaf("leaf1", "leaf-new", "10.0.0.1");

    let defaults = lab.triggers(&Settings::default());
    let mut deleted = renamed("leaf1");
    deleted.action = ChangeAction::Deleted;
    assert_eq!(defaults.on_event(&deleted).await, Dispatch::Ignored(IgnoreReason::Deleted));

    let mut created = renamed("leaf1");
    created.action = ChangeAction::Created;
    assert_eq!(
        defaults.on_event(&created).await,
        Dispatch::Ignored(IgnoreReason::AutoCreateDisabled)
    );

    let mut settings = Settings::default();
    settings.hook.auto_on_update = false;
    settings.hook.auto_on_create = true;
    let flipped = lab.triggers(&settings);
    assert_eq!(
        flipped.on_event(&renamed("leaf1")).await,
        Dispatch::Ignored(IgnoreReason::AutoUpdateDisabled)
    );
    assert!(flipped.on_event(&created).await.result().is_some());
    assert_eq!(lab.driver.counts().connect, 1);
}

#[tokio::test]
async fn hook_skips_unready_targets_without_running() {
    let lab = Lab::new();
    let mut target = lab.add_leaf("leaf1", "leaf-new", "10.0.0.1");
    target.credentials_ref = None;
    lab.inventory.upsert(target);
    let triggers = lab.triggers(&Settings::default());

    let dispatch = triggers.on_event(&renamed("leaf1")).await;

    assert_eq!(dispatch, Dispatch::Ignored(IgnoreReason::NotReady(NotReady::MissingCredentialsRef)));
    assert_eq!(lab.driver.counts().connect, 0);
    assert!(lab.results.results().is_empty());
}

#[tokio::test]
async fn hook_apply_setting_commits() {
    let lab = Lab::new();
    lab.add_leaf("leaf1", "leaf-new", "10.0.0.1");
    let mut settings = Settings::default();
    settings.hook.dry_run = false;

    let result = lab.triggers(&settings).on_event(&renamed("leaf1")).await;

    assert_eq!(result.result().unwrap().status(), ResultStatus::Success);
    assert_eq!(lab.driver.counts().commit, 1);
}

#[tokio::test]
async fn interface_events_use_their_own_whitelist() {
    let lab = Lab::new();
    lab.add_leaf("leaf1", "leaf-new", "10.0.0.1");
    let triggers = lab.triggers(&Settings::default());

    let mtu = ChangeEvent::new("leaf1", ObjectKind::Interface, ChangeAction::Updated, Utc::now())
        .with_change("mtu", json!(1500), json!(9214));
    assert!(triggers.on_event(&mtu).await.result().is_some());

    let name = ChangeEvent::new("leaf1", ObjectKind::Interface, ChangeAction::Updated, Utc::now())
        .with_change("name", json!("Ethernet1"), json!("Ethernet2"));
    assert_eq!(triggers.on_event(&name).await, Dispatch::Ignored(IgnoreReason::NotRelevant));
}

#[tokio::test]
async fn prebound_uses_configured_defaults() {
    let lab = Lab::new();
    lab.add_leaf("leaf1", "leaf1", "10.0.0.1");
    let triggers = lab.triggers(&Settings::default());

    let result = triggers.prebound("leaf1").await.unwrap();
    assert_eq!(result.initiator(), Initiator::Button);
    assert_eq!(result.status(), ResultStatus::DryRunPreview);

    let mut settings = Settings::default();
    settings.prebound.dry_run = false;
    let result = lab.triggers(&settings).prebound("leaf1").await.unwrap();
    assert_eq!(result.status(), ResultStatus::Success);

    assert_eq!(triggers.prebound("  ").await, Err(RequestError::EmptyTarget));
}

#[tokio::test]
async fn manual_requests_get_sequential_ids() {
    let lab = Lab::new();
    lab.add_leaf("leaf1", "leaf1", "10.0.0.1");
    let triggers = lab.triggers(&Settings::default());

    let first = triggers.manual("leaf1", dry_run()).await.unwrap();
    let second = triggers.manual("leaf1", dry_run()).await.unwrap();
    assert_eq!(first.request_id(), "req-1");
    assert_eq!(second.request_id(), "req-2");
    assert_eq!(second.target_id(), "leaf1");
}

// Concurrent requests for one target must never overlap their loads; the
// simulated device panics on a re-entrant load.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_target_requests_never_interleave() {
    let lab = Lab::with_driver(MemoryDriver::new().with_load_delay(Duration::from_millis(20)));
    lab.add_leaf("leaf1", "leaf1", "10.0.0.1");

    let mut handles = Vec::new();
    for _ in 0..6 {
        let engine = Arc::clone(&lab.engine);
        let request = lab.request("leaf1", dry_run(), Initiator::Manual);
        handles.push(tokio::spawn(async move { engine.run(request).await }));
    }
    for handle in handles {
        let result = handle.await.expect("run must not panic");
        assert_eq!(result.status(), ResultStatus::DryRunPreview);
    }
    assert_eq!(lab.driver.counts().load, 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_targets_reconcile_independently() {
    let lab = Lab::with_driver(MemoryDriver::new().with_load_delay(Duration::from_millis(20)));
    for n in 1..=4 {
        lab.add_leaf(&format!("leaf{n}"), &format!("leaf{n}"), &format!("10.0.0.{n}"));
    }

    let mut handles = Vec::new();
    for n in 1..=4 {
        let engine = Arc::clone(&lab.engine);
        let request = lab.request(&format!("leaf{n}"), apply(), Initiator::Manual);
        handles.push(tokio::spawn(async move { engine.run(request).await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().status(), ResultStatus::Success);
    }
    assert_eq!(lab.driver.counts().commit, 4);
}

#[tokio::test]
async fn cancelling_before_commit_closes_the_session() {
    let lab = Lab::with_driver(MemoryDriver::new().with_load_delay(Duration::from_millis(500)));
    lab.add_leaf("leaf1", "leaf1", "10.0.0.1");

    let run = lab.engine.run(lab.request("leaf1", apply(), Initiator::Manual));
    assert!(tokio::time::timeout(Duration::from_millis(50), run).await.is_err());

    let counts = lab.driver.counts();
    assert_eq!((counts.load, counts.commit, counts.close), (1, 0, 1));
    assert!(lab.results.results().is_empty());
    assert_eq!(lab.driver.running_config("10.0.0.1").as_deref(), Some(LEAF_RUNNING));

    // The target lock was released with the cancelled run.
    let result = lab.engine.run(lab.request("leaf1", dry_run(), Initiator::Manual)).await;
    assert_eq!(result.status(), ResultStatus::DryRunPreview);
}

#[tokio::test]
async fn cancelling_during_commit_still_finishes_it() {
    let lab = Lab::with_driver(MemoryDriver::new().with_commit_delay(Duration::from_millis(200)));
    lab.add_leaf("leaf1", "leaf1", "10.0.0.1");

    let run = lab.engine.run(lab.request("leaf1", apply(), Initiator::Manual));
    assert!(tokio::time::timeout(Duration::from_millis(50), run).await.is_err());
    tokio::time::sleep(Duration::from_millis(500)).await;

    let published = lab.results.results();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].status(), ResultStatus::Success);
    assert_eq!(lab.driver.counts().close, 1);
    assert!(lab.driver.running_config("10.0.0.1").unwrap().starts_with("hostname leaf1\n"));
}

#[tokio::test]
async fn watch_dispatches_every_published_event() {
    let lab = Lab::new();
    lab.add_leaf("leaf1", "leaf-new", "10.0.0.1");
    lab.add_leaf("leaf2", "leaf-new", "10.0.0.2");
    let triggers = lab.triggers(&Settings::default());

    let bus = EventBus::new();
    let listening = watch(triggers, &bus);
    bus.publish(&renamed("leaf1"));
    bus.publish(&renamed("leaf2"));
    bus.publish(
        &ChangeEvent::new("leaf1", ObjectKind::Device, ChangeAction::Updated, Utc::now())
            .with_change("comment", json!(""), json!("x")),
    );
    bus.close();

    let outcomes = listening.await;
    assert_eq!(outcomes.len(), 3);
    let ran = outcomes.iter().filter_map(Dispatch::result).count();
    assert_eq!(ran, 2);
    assert_eq!(lab.results.results().len(), 2);
}
