//! End-to-end provisioning sessions against the in-memory broker.

mod support;

use std::sync::Arc;

use meshprov::domain::report::{Issue, Presence, ResourceKind, ResourceOutcome, SessionState};
use meshprov::error::{ConfigError, Error};
use meshprov::infrastructure::config::settings::{ConfigLoader, EnvOverrides};
use meshprov::infrastructure::orchestration::session::ProvisioningSession;
use meshprov::testkit::broker::InMemoryBroker;
use meshprov::testkit::config::{fast_settings, mesh_topology, order_topology, ORDER_DOCUMENT};
use meshprov::testkit::connector::StaticConnector;
use meshprov::testkit::probe::ScriptedProbe;
use tokio::sync::watch;

fn shutdown() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

#[tokio::test]
async fn order_fan_out_is_created_and_routed() {
    let connector = StaticConnector::empty();
    let (_tx, rx) = shutdown();

    let report = ProvisioningSession::new()
        .provision(&fast_settings(order_topology()), &connector, rx)
        .await
        .unwrap();

    assert_eq!(report.state, SessionState::Ready);
    assert_eq!(
        report.routing.endpoints("order-created").unwrap(),
        ["audit:3000", "notify:3000"]
    );
    assert_eq!(report.subscription("audit-sub").unwrap().outcome, ResourceOutcome::Created);
    assert_eq!(report.subscription("notify-sub").unwrap().outcome, ResourceOutcome::Created);

    let stored = connector
        .broker_handle()
        .subscription("local-project", "audit-sub")
        .unwrap();
    assert_eq!(stored.push_endpoint, "http://audit:3000");
    assert_eq!(stored.topic_path, "projects/local-project/topics/order-created");
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let connector = StaticConnector::empty();
    let settings = fast_settings(mesh_topology());
    let broker = connector.broker_handle();

    let (_tx, rx) = shutdown();
    let first = ProvisioningSession::new()
        .provision(&settings, &connector, rx)
        .await
        .unwrap();
    let topics_after_first = broker.topics("local-project");
    let subscriptions_after_first = broker.subscription_count("local-project");

    let (_tx, rx) = shutdown();
    let second = ProvisioningSession::new()
        .provision(&settings, &connector, rx)
        .await
        .unwrap();

    assert_eq!(first.count(ResourceKind::Topic, "created"), 3);
    assert_eq!(first.count(ResourceKind::Subscription, "created"), 5);
    assert!(second
        .resources()
        .all(|r| r.outcome == ResourceOutcome::AlreadyExisted));
    assert_eq!(second.state, SessionState::Ready);
    assert_eq!(broker.topics("local-project"), topics_after_first);
    assert_eq!(broker.subscription_count("local-project"), subscriptions_after_first);
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn fan_out_lists_every_endpoint_of_a_topic() {
    let report = ProvisioningSession::new()
        .provision(
            &fast_settings(mesh_topology()),
            &StaticConnector::empty(),
            shutdown().1,
        )
        .await
        .unwrap();

    assert_eq!(
        report.routing.endpoints("order-created").unwrap(),
        ["audit:3000/events", "projection:3001/events", "stock:3002/events"]
    );
    assert_eq!(report.routing.endpoints("order-cancelled").unwrap().len(), 1);
    assert_eq!(report.routing.pipe_count(), 5);
}

#[tokio::test]
async fn one_failed_subscription_does_not_block_the_other() {
    let broker = Arc::new(InMemoryBroker::new());
    broker.reject("audit-sub", 400, "invalid push endpoint");
    let connector = StaticConnector::new(Arc::clone(&broker), Arc::new(ScriptedProbe::new()));

    let report = ProvisioningSession::new()
        .provision(&fast_settings(order_topology()), &connector, shutdown().1)
        .await
        .unwrap();

    assert_eq!(report.state, SessionState::Degraded);
    assert!(matches!(
        report.subscription("audit-sub").unwrap().outcome,
        ResourceOutcome::Failed { .. }
    ));
    assert_eq!(report.subscription("notify-sub").unwrap().outcome, ResourceOutcome::Created);
    assert_eq!(report.subscription("notify-sub").unwrap().presence, Presence::Present);
    assert!(report.issues.iter().any(|issue| matches!(
        issue,
        Issue::ResourceCreation { name, .. } if name == "audit-sub"
    )));
    assert!(report.issues.iter().any(|issue| matches!(
        issue,
        Issue::VerificationMismatch { name, .. } if name == "audit-sub"
    )));
}

#[tokio::test]
async fn failed_topic_still_attempts_its_subscriptions() {
    let broker = Arc::new(InMemoryBroker::new());
    broker.reject("order-created", 500, "internal");
    let connector = StaticConnector::new(Arc::clone(&broker), Arc::new(ScriptedProbe::new()));

    let report = ProvisioningSession::new()
        .provision(&fast_settings(order_topology()), &connector, shutdown().1)
        .await
        .unwrap();

    assert_eq!(report.state, SessionState::Degraded);
    assert_eq!(report.count(ResourceKind::Subscription, "failed"), 2);
    assert_eq!(broker.create_count(), 3);
}

#[tokio::test]
async fn resource_missing_from_listing_degrades() {
    let broker = Arc::new(InMemoryBroker::new());
    broker.hide_from_listing("notify-sub");
    let connector = StaticConnector::new(Arc::clone(&broker), Arc::new(ScriptedProbe::new()));

    let report = ProvisioningSession::new()
        .provision(&fast_settings(order_topology()), &connector, shutdown().1)
        .await
        .unwrap();

    assert_eq!(report.state, SessionState::Degraded);
    let notify = report.subscription("notify-sub").unwrap();
    assert_eq!(notify.outcome, ResourceOutcome::Created);
    assert_eq!(notify.presence, Presence::Absent);
}

#[tokio::test]
async fn unhealthy_dependency_still_reaches_a_terminal_state() {
    let probe = ScriptedProbe::new()
        .healthy_after("http://audit:3000/health", 1)
        .status("http://projection:3001/health", 503);
    let connector = StaticConnector::new(Arc::new(InMemoryBroker::new()), Arc::new(probe));

    let report = ProvisioningSession::new()
        .provision(&fast_settings(mesh_topology()), &connector, shutdown().1)
        .await
        .unwrap();

    assert!(report.state.is_terminal());
    assert_eq!(report.state, SessionState::Ready);
    assert_eq!(report.health_check("audit").unwrap().outcome.attempts(), 2);
    assert_eq!(report.health_check("projection").unwrap().outcome.attempts(), 3);
    assert_eq!(connector.probe_handle().calls("http://projection:3001/health"), 3);
}

#[tokio::test]
async fn broker_that_comes_up_late_is_waited_for() {
    let broker = Arc::new(InMemoryBroker::new());
    broker.reachable_after(2);
    let connector = StaticConnector::new(Arc::clone(&broker), Arc::new(ScriptedProbe::new()));

    let report = ProvisioningSession::new()
        .provision(&fast_settings(order_topology()), &connector, shutdown().1)
        .await
        .unwrap();

    assert_eq!(report.broker_attempts, 3);
    assert_eq!(report.state, SessionState::Ready);
}

#[tokio::test]
async fn missing_topics_is_fatal_with_zero_broker_calls() {
    let (_dir, path) = support::write_config(
        "pubsub-config.json",
        r#"{"subscriptions": []}"#,
    );
    let connector = StaticConnector::empty();
    let mut session = ProvisioningSession::new();

    let err = session
        .run(
            &ConfigLoader::new(&path).with_env(EnvOverrides::none()),
            &connector,
            shutdown().1,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Config(ConfigError::MissingField { field: "topics" })
    ));
    assert_eq!(session.state(), SessionState::Fatal);
    assert_eq!(connector.broker_handle().total_calls(), 0);
    assert!(connector.requested_endpoints().is_empty());
}

#[tokio::test]
async fn emulator_host_override_redirects_the_broker() {
    let (_dir, path) = support::write_config("pubsub-config.json", ORDER_DOCUMENT);
    let connector = StaticConnector::empty();
    let loader = ConfigLoader::new(&path).with_env(EnvOverrides::fixed([
        ("PUBSUB_EMULATOR_HOST", "pubsub:8681"),
        ("PUBSUB_PROJECT_ID", "staging"),
    ]));

    let report = ProvisioningSession::new()
        .run(&loader, &connector, shutdown().1)
        .await
        .unwrap();

    assert_eq!(connector.requested_endpoints(), vec!["pubsub:8681".to_string()]);
    assert_eq!(report.broker_endpoint, "pubsub:8681");
    assert_eq!(report.project_id, "staging");
    assert_eq!(connector.broker_handle().topics("staging"), vec!["order-created"]);
    assert!(connector.broker_handle().topics("local-project").is_empty());
}
