use std::collections::HashSet;
use std::sync::Arc;

use clara_models::{owning_dpe, EngineStatus, ReportKind};
use clara_orchestrations::codec::{decode, ControlCommand};
use clara_orchestrations::topics::report_topic_for;
use clara_orchestrations::transport::LocalTransport;
use clara_orchestrations::{EngineData, Error, Orchestrator, OrchestratorConfig, RequestState};
use serde_json::json;

fn setup() -> (Arc<LocalTransport>, Orchestrator) {
    let transport = Arc::new(LocalTransport::default());
    let config = OrchestratorConfig::default().with_name("test-orch");
    let orchestrator = Orchestrator::new(transport.clone(), config).unwrap();
    (transport, orchestrator)
}

const NAMES: &[&str] = &[
    "10.1.1.1_java",
    "10.1.1.1:7771_java",
    "10.1.1.1_java:master",
    "10.1.1.1_java:master:engine1",
    "192.168.0.7:9000_cpp:c1:Tracker",
    "node-3_python:fit:Kalman",
];

#[test]
fn test_owning_dpe_is_idempotent() {
    for name in NAMES {
        let dpe = owning_dpe(name).unwrap();
        let again = owning_dpe(dpe.canonical_name()).unwrap();
        assert_eq!(dpe, again, "owning DPE of {} is not stable", name);
    }
}

#[test]
fn test_report_topics_are_distinct_across_kinds_and_services() {
    let services = [
        "10.1.1.1_java:master:engine1",
        "10.1.1.1_java:master:engine2",
        "10.1.1.1_java:slave:engine1",
        "10.1.1.1_cpp:master:engine1",
        "192.168.0.7:9000_cpp:c1:Tracker",
    ];
    let kinds = [
        ReportKind::Done,
        ReportKind::Data,
        ReportKind::Status(EngineStatus::Warning),
        ReportKind::Status(EngineStatus::Error),
    ];

    let mut topics = HashSet::new();
    for service in services {
        for kind in kinds {
            assert!(topics.insert(report_topic_for(kind, service).unwrap().to_string()));
        }
    }
    assert_eq!(topics.len(), services.len() * kinds.len());
}

#[tokio::test]
async fn test_zero_interval_is_rejected_without_transport_calls() {
    let (transport, orchestrator) = setup();

    let result = orchestrator
        .start_reporting_done("10.1.1.1_java:master:engine1", 0)
        .await;

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_exit_service_targets_owning_dpe() {
    let (transport, orchestrator) = setup();
    let expected = owning_dpe("10.1.1.1_java").unwrap();

    let mut request = orchestrator.exit("10.1.1.1_java:master:engine1").unwrap();
    let target = request.target();
    assert_eq!(target.host(), expected.host());
    assert_eq!(target.port(), expected.port());
    assert_eq!(target.port(), 7771);

    request.send().await.unwrap();
    assert_eq!(request.state(), RequestState::Dispatched);

    let published = transport.last_published().unwrap();
    assert_eq!(published.target.canonical_name(), "10.1.1.1:7771_java");
    assert_eq!(
        decode(published.message.as_text().unwrap()).unwrap(),
        ControlCommand::RemoveService {
            service: "10.1.1.1_java:master:engine1".parse().unwrap()
        }
    );
}

#[tokio::test]
async fn test_config_with_unregistered_type_fails_before_transport() {
    let (transport, orchestrator) = setup();

    let mut request = orchestrator.configure("10.1.1.1_java:master:engine1").unwrap();
    let result = request.with_data(EngineData::new("binary/hipo", json!("bank")));

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_discovery_on_empty_registrar() {
    let (_transport, orchestrator) = setup();

    assert_eq!(orchestrator.list_dpes().await.unwrap(), HashSet::new());
    assert!(orchestrator.list_containers("10.1.1.1_java").await.unwrap().is_empty());
    assert!(orchestrator
        .list_services("10.1.1.1_java:master")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_requests_to_unknown_components_are_silently_dropped() {
    let (transport, orchestrator) = setup();

    orchestrator
        .deploy_container("10.9.9.9_java:ghost")
        .unwrap()
        .send()
        .await
        .unwrap();
    orchestrator
        .execute("10.9.9.9_java:ghost:engine")
        .unwrap()
        .with_data(EngineData::string("input"))
        .unwrap()
        .send()
        .await
        .unwrap();

    assert_eq!(transport.published().len(), 2);
}
