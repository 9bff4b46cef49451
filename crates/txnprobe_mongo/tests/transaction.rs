//! Container-backed integration tests.
//!
//! The ignored tests launch a real replica-set container and need a local
//! Docker daemon: `cargo test -p txnprobe_mongo -- --ignored`.

use std::error::Error;
use std::time::Duration;

use serde_json::json;
use txnprobe_core::{
    provision, Deployment, DeploymentState, ProbeConfig, ProbeDriver, TransactionProbe,
    TxnProfile, TxnScript, WriteTarget, DEFAULT_RECEIPT,
};
use txnprobe_mongo::{MongoDriver, MongoReplica};

#[tokio::test]
async fn connect_requires_running_deployment() {
    let deployment = MongoReplica::new();
    assert_eq!(deployment.state(), DeploymentState::Stopped);

    let err = MongoDriver::connect(deployment.endpoint().as_deref(), &ProbeConfig::default())
        .await
        .unwrap_err();

    assert!(err.is_setup());
}

#[tokio::test]
async fn unreachable_endpoint_fails_setup() {
    let config = ProbeConfig::default()
        .with_connect_timeout(Duration::from_millis(500))
        .with_server_selection_timeout(Duration::from_millis(500));

    let err = MongoDriver::connect(
        Some("mongodb://127.0.0.1:1/?directConnection=true"),
        &config,
    )
    .await
    .unwrap_err();

    assert!(err.is_setup());
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn transaction_commits_across_databases() {
    let mut deployment = MongoReplica::new();
    let endpoint = provision(&mut deployment).await.expect("container should start");
    assert!(endpoint.starts_with("mongodb://"));

    let config = ProbeConfig::default();
    let driver = MongoDriver::connect(Some(&endpoint), &config)
        .await
        .expect("client should connect");

    let report = TransactionProbe::new(config, driver)
        .run()
        .await
        .expect("probe should pass");

    assert_eq!(report.receipt, DEFAULT_RECEIPT);
    assert_eq!(report.seeded, 2);
    assert!(report.committed.iter().all(|(_, count)| *count == 1));

    deployment.stop().await.expect("container should stop");
    assert_eq!(deployment.state(), DeploymentState::Stopped);
    assert!(deployment.endpoint().is_none());

    // The old endpoint is gone with the container.
    let fast = ProbeConfig::default()
        .with_connect_timeout(Duration::from_secs(2))
        .with_server_selection_timeout(Duration::from_secs(2));
    let err = MongoDriver::connect(Some(&endpoint), &fast).await.unwrap_err();
    assert!(err.is_setup());
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn forced_failure_is_wrapped_with_cause() {
    let mut deployment = MongoReplica::new();
    let endpoint = provision(&mut deployment).await.expect("container should start");

    let config = ProbeConfig::default();
    let mut driver = MongoDriver::connect(Some(&endpoint), &config)
        .await
        .expect("client should connect");

    // Two inserts with the same _id: the second one conflicts inside the
    // transaction, which the executor cannot retry away.
    let target = WriteTarget::new("mydb1", "foo");
    let script = TxnScript::new("unreachable")
        .with_write(target.clone(), json!({ "_id": 7 }))
        .with_write(target.clone(), json!({ "_id": 7 }));

    let err = driver
        .execute(&TxnProfile::safe(), &script)
        .await
        .unwrap_err();

    assert!(err.is_transaction());
    assert!(err.source().is_some(), "original cause should be preserved");

    // The aborted transaction left nothing behind: the same _id is free.
    let retry = TxnScript::new("committed").with_write(target.clone(), json!({ "_id": 7 }));
    let receipt = driver.execute(&TxnProfile::safe(), &retry).await.unwrap();
    assert_eq!(receipt, "committed");

    driver.close().await.unwrap();
    deployment.stop().await.expect("container should stop");
}
