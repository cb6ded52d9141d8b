//! AWS detector against a mocked IMDS

use std::time::{Duration, Instant};

use envtel_core::ports::Detector;
use envtel_detect::AwsDetector;
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::Sandbox;

async fn mount_token(sandbox: &Sandbox, status: u16, token: &str) {
    Mock::given(method("PUT"))
        .and(path("/latest/api/token"))
        .and(header("X-aws-ec2-metadata-token-ttl-seconds", "21600"))
        .respond_with(ResponseTemplate::new(status).set_body_string(token))
        .mount(&sandbox.server)
        .await;
}

fn identity_document() -> serde_json::Value {
    serde_json::json!({
        "region": "us-east-1",
        "accountId": "123456789012",
        "instanceId": "i-0abc123",
        "availabilityZone": "us-east-1a"
    })
}

#[tokio::test]
async fn test_ec2_with_imdsv2_token() {
    let sandbox = Sandbox::new("AWS_EC2").await;
    mount_token(&sandbox, 200, "session-token").await;
    Mock::given(method("GET"))
        .and(path("/latest/dynamic/instance-identity/document"))
        .and(header("X-aws-ec2-metadata-token", "session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_document()))
        .expect(1)
        .mount(&sandbox.server)
        .await;

    let ctx = AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .expect("EC2 should be detected");

    assert_eq!(ctx.provider, "aws");
    assert_eq!(ctx.environment, "ec2");
    assert_eq!(ctx.region, "us-east-1");
    assert_eq!(ctx.account_id, "123456789012");
    assert_eq!(ctx.instance_id, "i-0abc123");
}

#[tokio::test]
async fn test_ec2_without_token_falls_back_to_plain_get() {
    let sandbox = Sandbox::new("AWS_NOTOKEN").await;
    mount_token(&sandbox, 403, "").await;
    Mock::given(method("GET"))
        .and(path("/latest/dynamic/instance-identity/document"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_document()))
        .mount(&sandbox.server)
        .await;

    let ctx = AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .expect("EC2 should be detected without a token");

    assert_eq!(ctx.environment, "ec2");
    assert_eq!(ctx.instance_id, "i-0abc123");
}

#[tokio::test]
async fn test_ec2_from_instance_id_endpoint() {
    let sandbox = Sandbox::new("AWS_IID").await;
    sandbox.set_env("AWS_ACCOUNT_ID", "999");
    Mock::given(method("GET"))
        .and(path("/latest/meta-data/instance-id"))
        .respond_with(ResponseTemplate::new(200).set_body_string("i-fallback\n"))
        .mount(&sandbox.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/latest/meta-data/placement/region"))
        .respond_with(ResponseTemplate::new(200).set_body_string("eu-west-1"))
        .mount(&sandbox.server)
        .await;

    let ctx = AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .expect("EC2 should be detected from instance-id");

    assert_eq!(ctx.environment, "ec2");
    assert_eq!(ctx.instance_id, "i-fallback");
    assert_eq!(ctx.region, "eu-west-1");
    assert_eq!(ctx.account_id, "999");
}

#[tokio::test]
async fn test_identity_document_empty_region_uses_env() {
    let sandbox = Sandbox::new("AWS_EMPTYREGION").await;
    sandbox.set_env("AWS_REGION", "ap-south-1");
    Mock::given(method("GET"))
        .and(path("/latest/dynamic/instance-identity/document"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "region": "",
            "accountId": "1",
            "instanceId": "i-1"
        })))
        .mount(&sandbox.server)
        .await;

    let ctx = AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.region, "ap-south-1");
}

#[tokio::test]
async fn test_malformed_identity_document_is_a_miss() {
    let sandbox = Sandbox::new("AWS_MALFORMED").await;
    Mock::given(method("GET"))
        .and(path("/latest/dynamic/instance-identity/document"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&sandbox.server)
        .await;

    assert!(AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .is_none());
}

#[tokio::test]
async fn test_slow_metadata_times_out_quickly() {
    let sandbox = Sandbox::new("AWS_SLOW").await;
    Mock::given(method("GET"))
        .and(path("/latest/dynamic/instance-identity/document"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(identity_document())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&sandbox.server)
        .await;

    let detector =
        AwsDetector::with_options(sandbox.options().with_timeout(Duration::from_millis(100)))
            .unwrap();
    let started = Instant::now();
    let result = detector.detect().await;

    assert!(result.is_none());
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "detection took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_unresponsive_imds_costs_at_most_two_timeouts() {
    let sandbox = Sandbox::new("AWS_STALLED").await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&sandbox.server)
        .await;

    let detector =
        AwsDetector::with_options(sandbox.options().with_timeout(Duration::from_millis(100)))
            .unwrap();
    let started = Instant::now();
    let result = detector.detect().await;
    let elapsed = started.elapsed();

    assert!(result.is_none());
    let requests = sandbox.server.received_requests().await.unwrap();
    let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(
        paths,
        vec!["/latest/api/token", "/latest/dynamic/instance-identity/document"],
        "instance-id and region must not be requested once IMDS stalls"
    );
    assert!(elapsed < Duration::from_secs(1), "detection took {elapsed:?}");
}

#[tokio::test]
async fn test_token_timeout_still_tries_plain_get() {
    let sandbox = Sandbox::new("AWS_SLOWTOKEN").await;
    Mock::given(method("PUT"))
        .and(path("/latest/api/token"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&sandbox.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/latest/dynamic/instance-identity/document"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_document()))
        .expect(1)
        .mount(&sandbox.server)
        .await;

    let ctx = AwsDetector::with_options(sandbox.options().with_timeout(Duration::from_millis(100)))
        .unwrap()
        .detect()
        .await
        .expect("EC2 should be detected after the token request times out");
    assert_eq!(ctx.instance_id, "i-0abc123");
}

#[tokio::test]
async fn test_ecs_from_env() {
    let sandbox = Sandbox::new("AWS_ECS").await;
    sandbox.set_env("ECS_CONTAINER_METADATA_URI_V4", "http://169.254.170.2/v4/abc");
    sandbox.set_env("AWS_REGION", "us-west-2");
    sandbox.set_env("CDK_DEFAULT_ACCOUNT", "222");

    let ctx = AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(
        (ctx.provider.as_str(), ctx.environment.as_str(), ctx.region.as_str()),
        ("aws", "ecs", "us-west-2")
    );
    assert_eq!(ctx.account_id, "222");
    assert_eq!(ctx.instance_id, "unknown");
}

#[tokio::test]
async fn test_ecs_takes_precedence_over_lambda() {
    let sandbox = Sandbox::new("AWS_ECSLAMBDA").await;
    sandbox.set_env("ECS_CONTAINER_METADATA_URI_V4", "http://169.254.170.2/v4/abc");
    sandbox.set_env("AWS_LAMBDA_FUNCTION_NAME", "handler");

    let ctx = AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.environment, "ecs");
}

#[tokio::test]
async fn test_lambda_region_fallback_chain() {
    let sandbox = Sandbox::new("AWS_LAMBDA").await;
    sandbox.set_env("AWS_LAMBDA_FUNCTION_NAME", "my-function");
    sandbox.set_env("AWS_REGION", "");
    sandbox.set_env("AWS_DEFAULT_REGION", "eu-central-1");

    let ctx = AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.environment, "lambda");
    assert_eq!(ctx.region, "eu-central-1");
    assert_eq!(ctx.account_id, "unknown");
    assert_eq!(ctx.instance_id, "my-function");
}

#[tokio::test]
async fn test_eks_from_env_markers() {
    let sandbox = Sandbox::new("AWS_EKS_ENV").await;
    sandbox.set_env("KUBERNETES_SERVICE_HOST", "10.100.0.1");
    sandbox.set_env("AWS_ROLE_ARN", "arn:aws:iam::123:role/pod");
    sandbox.set_env("AWS_REGION", "us-east-2");

    let ctx = AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.environment, "eks");
    assert_eq!(ctx.region, "us-east-2");
}

#[tokio::test]
async fn test_eks_from_file_markers() {
    let sandbox = Sandbox::new("AWS_EKS_FILE").await;
    sandbox.touch("/var/run/secrets/kubernetes.io/serviceaccount/token");
    sandbox.touch("/etc/eks/release");

    let ctx = AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.environment, "eks");
}

#[tokio::test]
async fn test_plain_kubernetes_is_not_eks() {
    let sandbox = Sandbox::new("AWS_K8S_ONLY").await;
    sandbox.set_env("KUBERNETES_SERVICE_HOST", "10.0.0.1");
    sandbox.touch("/var/run/secrets/kubernetes.io/serviceaccount/token");

    assert!(AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .is_none());
}

#[tokio::test]
async fn test_no_signals_is_a_miss() {
    let sandbox = Sandbox::new("AWS_NONE").await;
    assert!(AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .is_none());
}

#[tokio::test]
async fn test_region_and_account_chains_prefer_first_variable() {
    let sandbox = Sandbox::new("AWS_CHAINS").await;
    sandbox.set_env("AWS_LAMBDA_FUNCTION_NAME", "fn");
    sandbox.set_env("AWS_REGION", "us-east-1");
    sandbox.set_env("AWS_DEFAULT_REGION", "eu-west-1");
    sandbox.set_env("AWS_ACCOUNT_ID", "111");
    sandbox.set_env("CDK_DEFAULT_ACCOUNT", "222");

    let ctx = AwsDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.region, "us-east-1");
    assert_eq!(ctx.account_id, "111");
}
