//! Full cascade against mocked metadata services

use envtel_core::{config::DetectionConfig, domain::EnvContext, ports::Detector};
use envtel_detect::CloudDetector;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::Sandbox;

#[tokio::test]
async fn test_no_signals_is_on_premise() {
    let sandbox = Sandbox::new("CLOUD_NONE").await;
    let cloud = CloudDetector::with_options(sandbox.options()).unwrap();

    let (ctx, found) = cloud.detect_or_default().await;
    assert!(!found);
    assert_eq!(ctx, EnvContext::on_premise());
    assert_eq!(ctx.provider, "on-premise");
    assert_eq!(ctx.environment, "on-premise");
    assert_eq!(ctx.region, "unknown");
}

#[tokio::test]
async fn test_aws_wins_over_azure_and_gcp() {
    let sandbox = Sandbox::new("CLOUD_ALL").await;
    sandbox.set_env("AWS_LAMBDA_FUNCTION_NAME", "fn");
    sandbox.set_env("FUNCTIONS_WORKER_RUNTIME", "python");
    sandbox.set_env("K_SERVICE", "svc");

    let (ctx, found) = CloudDetector::with_options(sandbox.options())
        .unwrap()
        .detect_or_default()
        .await;
    assert!(found);
    assert_eq!(ctx.provider, "aws");
    assert_eq!(ctx.environment, "lambda");
}

#[tokio::test]
async fn test_azure_wins_over_gcp() {
    let sandbox = Sandbox::new("CLOUD_AZGCP").await;
    sandbox.set_env("WEBSITE_SITE_NAME", "site");
    sandbox.set_env("K_SERVICE", "svc");

    let ctx = CloudDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.provider, "azure");
    assert_eq!(ctx.environment, "app-service");
}

#[tokio::test]
async fn test_gcp_metadata_detected_through_cascade() {
    let sandbox = Sandbox::new("CLOUD_GCE").await;
    Mock::given(method("GET"))
        .and(path("/computeMetadata/v1/instance/id"))
        .respond_with(ResponseTemplate::new(200).set_body_string("77"))
        .mount(&sandbox.server)
        .await;

    let (ctx, found) = CloudDetector::with_options(sandbox.options())
        .unwrap()
        .detect_or_default()
        .await;
    assert!(found);
    assert_eq!(ctx.provider, "gcp");
    assert_eq!(ctx.environment, "gce");
    assert_eq!(ctx.instance_id, "77");
}

#[tokio::test]
async fn test_from_config_points_at_configured_endpoint() {
    let sandbox = Sandbox::new("CLOUD_CFG").await;
    Mock::given(method("GET"))
        .and(path("/latest/meta-data/instance-id"))
        .respond_with(ResponseTemplate::new(200).set_body_string("i-cfg"))
        .mount(&sandbox.server)
        .await;

    let config = DetectionConfig {
        metadata_endpoint: sandbox.server.uri(),
        env_prefix: sandbox.prefix.clone(),
        fs_root: sandbox.root.path().to_path_buf(),
        aws_timeout_ms: 200,
        metadata_timeout_ms: 200,
    };
    let cloud = CloudDetector::from_config(&config).unwrap();
    assert_eq!(cloud.detector_names(), vec!["aws", "azure", "gcp"]);

    let ctx = cloud.detect().await.unwrap();
    assert_eq!(ctx.environment, "ec2");
    assert_eq!(ctx.instance_id, "i-cfg");
}
