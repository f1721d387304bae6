#![forbid(unsafe_code)]

mod common;

use chrono::TimeDelta;
use common::{Harness, Readings, admin, admin_config, guest};
use config::{Config, ViewMode};
use orchestrator::domain::NetworkCounters;
use orchestrator::{ControlEvent, MonitorEngine, StatusTarget};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn command(
    actor: config::Actor,
    text: &str,
) -> (ControlEvent, mpsc::UnboundedReceiver<String>) {
    let (reply, replies) = mpsc::unbounded_channel();
    let event = ControlEvent::Command {
        actor,
        text: text.to_string(),
        reply,
    };
    (event, replies)
}

async fn run(engine: &mut MonitorEngine, actor: config::Actor, text: &str) -> Vec<String> {
    let (reply, mut replies) = mpsc::unbounded_channel();
    engine.handle_command(actor, text, reply).await;
    let mut out = Vec::new();
    while let Ok(message) = replies.try_recv() {
        out.push(message);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn timers_fire_on_their_own_periods() {
    let harness = Harness::new();
    let mut engine = harness.engine(Config::default());
    let cancel = CancellationToken::new();
    let (_control_tx, control_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            engine.run_until(cancel, control_rx).await;
            engine
        }
    });

    tokio::time::sleep(Duration::from_secs(125)).await;
    cancel.cancel();
    let engine = handle.await.unwrap();

    // samples at 0, 30, 60, 90, 120; alert checks at 0, 60, 120
    assert_eq!(harness.transport.publish_count(), 5);
    assert_eq!(harness.platform.snapshots(), 8);
    assert_eq!(engine.store().history().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn interval_change_rearms_sample_timer() {
    let harness = Harness::new();
    let mut engine = harness.engine(admin_config());
    let cancel = CancellationToken::new();
    let (control_tx, control_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            engine.run_until(cancel, control_rx).await;
            engine
        }
    });

    tokio::time::sleep(Duration::from_secs(5)).await;
    let (event, mut replies) = command(admin(), "!config interval 10");
    control_tx.send(event).unwrap();
    assert_eq!(
        replies.recv().await.as_deref(),
        Some("Update interval set to 10 seconds")
    );

    tokio::time::sleep(Duration::from_secs(61)).await;
    cancel.cancel();
    let engine = handle.await.unwrap();

    // samples at 0, then 15, 25, 35, 45, 55, 65
    assert_eq!(harness.transport.publish_count(), 7);
    // alert checks keep their own schedule at 0 and 60
    assert_eq!(
        harness.platform.snapshots() - harness.transport.publish_count(),
        2
    );
    assert_eq!(engine.config().update_interval, Duration::from_secs(10));
    let audit = engine.store().recent_audit(1);
    assert_eq!(audit[0].command, "config interval 10");
    assert!(audit[0].success);
}

#[tokio::test(start_paused = true)]
async fn reload_with_zero_interval_keeps_running() {
    let harness = Harness::new();
    let mut engine = harness.engine(Config::default());
    let cancel = CancellationToken::new();
    let (control_tx, control_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            engine.run_until(cancel, control_rx).await;
            engine
        }
    });

    tokio::time::sleep(Duration::from_secs(5)).await;
    let reloaded = Config {
        update_interval: Duration::ZERO,
        view_mode: ViewMode::Compact,
        ..Config::default()
    };
    control_tx
        .send(ControlEvent::Reload(Box::new(reloaded)))
        .unwrap();

    tokio::time::sleep(Duration::from_secs(61)).await;
    cancel.cancel();
    let engine = handle.await.unwrap();

    // samples at 0, 30, 60 on the old interval
    assert_eq!(harness.transport.publish_count(), 3);
    assert_eq!(engine.config().update_interval, Duration::from_secs(30));
    assert_eq!(engine.config().view_mode, ViewMode::Compact);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_start_interval_is_clamped() {
    let harness = Harness::new();
    let engine = harness.engine(Config {
        update_interval: Duration::ZERO,
        ..Config::default()
    });
    assert_eq!(engine.config().update_interval, Duration::from_secs(10));

    let engine = harness.engine(Config {
        update_interval: Duration::from_secs(3600),
        ..Config::default()
    });
    assert_eq!(engine.config().update_interval, Duration::from_secs(300));
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_restart_times_out() {
    let harness = Harness::new();
    let mut engine = harness.engine(admin_config());
    let cancel = CancellationToken::new();
    let (control_tx, control_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            engine.run_until(cancel, control_rx).await;
            engine
        }
    });

    let (event, mut replies) = command(admin(), "!service restart nginx");
    control_tx.send(event).unwrap();
    let prompt = replies.recv().await.unwrap();
    assert!(prompt.contains("restart nginx?"));

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(
        replies.recv().await.as_deref(),
        Some("Confirmation timeout. Restart cancelled.")
    );

    let (event, _replies) = command(admin(), "yes");
    control_tx.send(event).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert!(harness.platform.restarts().is_empty());
}

#[tokio::test]
async fn confirmed_restart_runs_once_for_the_requesting_admin() {
    let harness = Harness::new();
    let mut config = admin_config();
    config.admin_user_ids.push(guest().id);
    let mut engine = harness.engine(config);

    let prompt = run(&mut engine, admin(), "!service restart nginx").await;
    assert_eq!(prompt.len(), 1);

    // a different actor cannot confirm
    assert!(run(&mut engine, guest(), "yes").await.is_empty());
    assert!(harness.platform.restarts().is_empty());

    let done = run(&mut engine, admin(), "Yes").await;
    assert_eq!(done, vec!["Service nginx restarted successfully".to_string()]);
    assert_eq!(harness.platform.restarts(), vec!["nginx".to_string()]);

    // nothing left to confirm
    assert!(run(&mut engine, admin(), "yes").await.is_empty());
    let audit = engine.store().recent_audit(1);
    assert_eq!(audit[0].command, "service restart nginx");
    assert_eq!(audit[0].actor, "alice");
    assert!(audit[0].success);
}

#[tokio::test]
async fn failed_restart_is_audited_as_failure() {
    let harness = Harness::new();
    harness.platform.fail_restarts();
    let mut engine = harness.engine(admin_config());

    run(&mut engine, admin(), "!service restart nginx").await;
    let reply = run(&mut engine, admin(), "yes").await;
    assert!(reply[0].starts_with("Failed to restart service:"));
    assert!(!engine.store().recent_audit(1)[0].success);
}

#[tokio::test]
async fn admin_commands_are_gated() {
    let harness = Harness::new();
    let mut engine = harness.engine(admin_config());

    for text in ["!config", "!config interval 20", "!audit", "!service status nginx"] {
        assert_eq!(
            run(&mut engine, guest(), text).await,
            vec!["Admin only!".to_string()]
        );
    }
    assert!(engine.store().audit().is_empty());
    assert_eq!(engine.config().update_interval, Duration::from_secs(30));

    let role_admin = config::Actor {
        id: 9,
        name: "carol".into(),
        role_ids: vec![77],
    };
    let mut config = admin_config();
    config.admin_role_ids = vec![77];
    let mut engine = harness.engine(config);
    let reply = run(&mut engine, role_admin, "!service status nginx").await;
    assert_eq!(reply, vec!["Service nginx: active".to_string()]);
    assert_eq!(engine.store().recent_audit(1)[0].command, "service status nginx");
}

#[tokio::test]
async fn rejected_config_change_is_audited_and_ignored() {
    let harness = Harness::new();
    let mut engine = harness.engine(admin_config());

    let reply = run(&mut engine, admin(), "!config interval 5").await;
    assert_eq!(reply, vec!["Interval must be between 10 and 300 seconds".to_string()]);
    assert_eq!(engine.config().update_interval, Duration::from_secs(30));

    let audit = engine.store().recent_audit(1);
    assert_eq!(audit[0].command, "config interval 5");
    assert!(!audit[0].success);

    // usage errors are answered but not recorded
    let reply = run(&mut engine, admin(), "!config view").await;
    assert_eq!(reply, vec!["Usage: `!config <setting> <value>`".to_string()]);
    assert_eq!(engine.store().audit().len(), 1);
}

#[tokio::test]
async fn accepted_config_change_is_saved() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    let harness = Harness::new();
    let mut engine = harness.engine(admin_config()).with_config_path(&path);

    let reply = run(&mut engine, admin(), "!config view compact").await;
    assert_eq!(reply, vec!["View mode set to compact".to_string()]);
    let reply = run(&mut engine, admin(), "!config threshold cpu 92.5").await;
    assert_eq!(reply, vec!["cpu threshold set to 92.5".to_string()]);

    let saved = Config::load(&path).unwrap();
    assert_eq!(saved.view_mode, ViewMode::Compact);
    assert_eq!(saved.thresholds.cpu, 92.5);
    assert_eq!(saved.admin_user_ids, vec![1]);
}

#[tokio::test]
async fn alerts_are_stored_and_forwarded_when_a_channel_is_set() {
    let harness = Harness::new();
    harness.platform.set_readings(Readings {
        cpu: 95.0,
        ..Readings::default()
    });

    let mut engine = harness.engine(Config::default());
    let alerts = engine.check_alerts().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(engine.store().alerts().len(), 1);
    assert!(harness.transport.notified().is_empty());

    let mut engine = harness.engine(Config {
        alert_channel_id: 42,
        ..Config::default()
    });
    engine.check_alerts().await;
    let notified = harness.transport.notified();
    assert_eq!(notified.len(), 1);
    assert_eq!(notified[0].0, 42);
    assert_eq!(notified[0].1.message, "CPU usage is high: 95.0%");
}

#[tokio::test]
async fn alert_cooldown_follows_snapshot_time() {
    let harness = Harness::new();
    harness.platform.set_readings(Readings {
        cpu: 85.0,
        ..Readings::default()
    });
    let mut engine = harness.engine(Config::default());

    assert_eq!(engine.check_alerts().await.len(), 1);
    harness.clock.advance(TimeDelta::seconds(100));
    assert!(engine.check_alerts().await.is_empty());
    harness.clock.advance(TimeDelta::seconds(201));
    assert_eq!(engine.check_alerts().await.len(), 1);
    assert_eq!(engine.store().alerts().len(), 2);
}

#[tokio::test]
async fn sample_publishes_rates_and_history() {
    let harness = Harness::new();
    let mut engine = harness.engine(Config::default());

    harness.platform.set_counters(NetworkCounters::new(1000, 2000));
    engine.sample(StatusTarget::Existing).await;

    harness.clock.advance(TimeDelta::seconds(1));
    harness.platform.set_counters(NetworkCounters::new(2024, 3024));
    let report = engine.sample(StatusTarget::Fresh).await;

    assert_eq!(report.rates.current.sent, 1.0);
    assert_eq!(report.rates.current.received, 1.0);
    assert_eq!(engine.rates().peak.sent, 1.0);
    assert_eq!(engine.store().history().len(), 2);

    let targets: Vec<_> = harness
        .transport
        .published()
        .into_iter()
        .map(|(target, _)| target)
        .collect();
    assert_eq!(targets, vec![StatusTarget::Existing, StatusTarget::Fresh]);
}

#[tokio::test]
async fn history_and_alert_listings() {
    let harness = Harness::new();
    let mut engine = harness.engine(Config::default());

    let reply = run(&mut engine, guest(), "!history").await;
    assert_eq!(reply, vec!["No historical data available yet.".to_string()]);

    for cpu in [10.0, 30.0] {
        harness.platform.set_readings(Readings {
            cpu,
            ..Readings::default()
        });
        engine.sample(StatusTarget::Existing).await;
        harness.clock.advance(TimeDelta::minutes(10));
    }

    let reply = run(&mut engine, guest(), "!history 1h").await;
    assert!(reply[0].contains("last 1h"));
    assert!(reply[0].contains("cpu: avg 20.0%, peak 30.0%"));
    assert!(reply[0].contains("2 samples"));

    let reply = run(&mut engine, guest(), "!alerts").await;
    assert_eq!(reply, vec!["No alerts have been triggered recently.".to_string()]);
}
