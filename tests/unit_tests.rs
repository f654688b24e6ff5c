use std::sync::Arc;
use std::time::Duration;
use system_stats::{
    client::statsd::encode,
    metrics::{disk::mount_key, take_snapshot},
    CollectionParameters, Collector, Metric, MetricKind, MetricsClient, Namespaced,
    RecordingClient, Snapshot, StatsError, StatsdClient,
};
use tokio::net::UdpSocket;

/// Test Metric serialization and deserialization
#[test]
fn test_metric_serialization() {
    let metric = Metric::gauge("cpu.percent", 37.5);

    let json = serde_json::to_string(&metric).expect("Should serialize to JSON");
    assert!(json.contains("\"kind\":\"gauge\""));
    assert!(json.contains("cpu.percent"));

    let deserialized: Metric = serde_json::from_str(&json).expect("Should deserialize from JSON");
    assert_eq!(deserialized, metric);
}

/// Test statsd suffixes for every metric kind
#[test]
fn test_metric_kind_suffixes() {
    assert_eq!(MetricKind::Counter.statsd_suffix(), "c");
    assert_eq!(MetricKind::Gauge.statsd_suffix(), "g");
    assert_eq!(MetricKind::Timer.statsd_suffix(), "ms");
}

/// Test wire encoding of namespaced metrics
#[test]
fn test_encode_namespaced_metric() {
    let metric = Metric::gauge("percent", 99.5).prefixed("host1.cpu");
    assert_eq!(encode(&metric), "host1.cpu.percent:99.5|g");
}

/// Test mount point naming used by the disk resource
#[test]
fn test_disk_mount_keys() {
    assert_eq!(mount_key("/"), "root");
    assert_eq!(mount_key("/var/lib/docker"), "var_lib_docker");
}

/// Test StatsError creation and formatting
#[test]
fn test_stats_error_types() {
    let config_error = StatsError::config_error("Invalid configuration");
    assert!(format!("{}", config_error).contains("Invalid configuration"));

    let transport_error = StatsError::transport_error("Connection refused");
    assert!(format!("{}", transport_error).contains("Connection refused"));

    let resource_error = StatsError::resource_error("disk", "mount table unreadable");
    assert_eq!(
        format!("{}", resource_error),
        "Resource disk failed: mount table unreadable"
    );

    let lifecycle_error = StatsError::lifecycle_error("not running");
    assert!(!lifecycle_error.is_timeout());

    let timeout = StatsError::StopTimeout {
        resources: vec!["cpu".to_string(), "disk".to_string()],
    };
    assert!(timeout.is_timeout());
    assert!(format!("{}", timeout).ends_with("cpu, disk"));
}

/// Test CollectionParameters builder pattern
#[test]
fn test_collection_parameters() {
    let params = CollectionParameters::new("host1")
        .with_statsd_address("10.1.1.1:8125")
        .with_extended(true)
        .with_interval(Duration::from_secs(2))
        .with_disk_interval(Duration::from_secs(60))
        .with_stop_timeout(Some(Duration::from_secs(15)));

    assert_eq!(params.namespace, "host1");
    assert_eq!(params.statsd_address, "10.1.1.1:8125");
    assert!(params.extended);
    assert_eq!(params.cpu_interval, Duration::from_secs(2));
    assert_eq!(params.memory_interval, Duration::from_secs(2));
    assert_eq!(params.disk_interval, Duration::from_secs(60));
    assert_eq!(params.stop_timeout, Some(Duration::from_secs(15)));
    assert!(params.validate().is_ok());

    let empty = CollectionParameters::new("host1").with_statsd_address("  ");
    assert!(matches!(empty.validate(), Err(StatsError::Config(_))));
}

/// Test Snapshot JSON layout
#[test]
fn test_snapshot_json_layout() {
    let snapshot = Snapshot::from_metrics(
        vec![
            Metric::gauge("cpu.percent", 5.0),
            Metric::gauge("disk.root.percent", 40.0),
        ],
        Duration::from_secs(1),
    );

    let json_str = serde_json::to_string(&snapshot).expect("Should serialize");
    let json_value: serde_json::Value = serde_json::from_str(&json_str).expect("Should parse JSON");

    assert!(json_value.get("timestamp").is_some());
    assert_eq!(json_value["window_ms"], 1000);
    assert_eq!(json_value["resources"]["disk"][0]["name"], "root.percent");
    assert_eq!(json_value["resources"]["cpu"][0]["kind"], "gauge");
}

/// Test that the statsd client delivers a namespaced flush end to end
#[tokio::test]
async fn test_statsd_namespaced_delivery() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();

    let statsd = StatsdClient::dial(&format!(":{}", addr.port()))
        .await
        .expect("Should dial loopback");
    assert_eq!(statsd.peer_addr(), addr);

    let root = Arc::new(Namespaced::new(Arc::new(statsd), "host1"));
    let memory = Namespaced::new(root.clone(), "memory");
    memory.gauge("used", 1024.0).await.unwrap();
    root.flush().await.unwrap();

    let mut buf = [0u8; 512];
    let n = tokio::time::timeout(Duration::from_secs(2), server.recv(&mut buf))
        .await
        .expect("Datagram should arrive")
        .unwrap();
    assert_eq!(&buf[..n], b"host1.memory.used:1024|g");
}

/// Test a collector built from parameters fails fast on a bad address
#[tokio::test]
async fn test_collector_from_bad_parameters() {
    let params = CollectionParameters::new("host1").with_statsd_address("no-port-here");
    let result = Collector::from_parameters(&params).await;
    assert!(matches!(result, Err(StatsError::Transport(_))));

    let params = CollectionParameters::new("host1").with_memory_interval(Duration::ZERO);
    let result = Collector::from_parameters(&params).await;
    assert!(matches!(result, Err(StatsError::Config(_))));
}

/// Test the system resources report under their own names
#[tokio::test]
async fn test_system_resources_report() {
    let recorder = Arc::new(RecordingClient::new());
    let params = CollectionParameters::new("ignored").with_interval(Duration::from_millis(300));
    let mut collector =
        Collector::with_system_resources(recorder.clone(), &params).expect("Should build");

    collector.start().await.expect("Should start");
    tokio::time::sleep(Duration::from_millis(700)).await;
    collector.stop().await.expect("Should stop");

    let names = recorder.names();
    assert!(names.contains(&"memory.total".to_string()));
    assert!(names.contains(&"cpu.percent".to_string()));
    assert_eq!(recorder.flush_count(), 1);
}

/// Test a one-off snapshot through the full lifecycle
#[tokio::test]
async fn test_take_snapshot() {
    let snapshot = take_snapshot(Duration::from_millis(300), true)
        .await
        .expect("Should take snapshot");

    assert!(!snapshot.is_empty());
    assert!(snapshot.resources.contains_key("cpu"));
    assert!(snapshot.resources.contains_key("memory"));
    assert!(snapshot.resources["memory"]
        .iter()
        .any(|m| m.name == "swap.percent"));
}
