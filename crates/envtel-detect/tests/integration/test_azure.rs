//! Azure detector against a mocked IMDS

use envtel_core::ports::Detector;
use envtel_detect::AzureDetector;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::Sandbox;

async fn mount_instance(sandbox: &Sandbox, body: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/metadata/instance"))
        .and(query_param("api-version", "2021-02-01"))
        .and(header("Metadata", "true"))
        .respond_with(body)
        .mount(&sandbox.server)
        .await;
}

#[tokio::test]
async fn test_vm_from_imds() {
    let sandbox = Sandbox::new("AZ_VM").await;
    mount_instance(
        &sandbox,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "compute": {
                "location": "westeurope",
                "subscriptionId": "sub-123",
                "vmId": "vm-abc",
                "name": "my-vm"
            },
            "network": {}
        })),
    )
    .await;

    let ctx = AzureDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .expect("Azure VM should be detected");

    assert_eq!(ctx.provider, "azure");
    assert_eq!(ctx.environment, "vm");
    assert_eq!(ctx.region, "westeurope");
    assert_eq!(ctx.account_id, "sub-123");
    assert_eq!(ctx.instance_id, "vm-abc");
}

#[tokio::test]
async fn test_vm_missing_fields_fall_back() {
    let sandbox = Sandbox::new("AZ_VMPARTIAL").await;
    sandbox.set_env("AZURE_SUBSCRIPTION_ID", "env-sub");
    mount_instance(
        &sandbox,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "compute": { "location": "eastus" }
        })),
    )
    .await;

    let ctx = AzureDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.region, "eastus");
    assert_eq!(ctx.account_id, "env-sub");
    assert_eq!(ctx.instance_id, "unknown");
}

#[tokio::test]
async fn test_malformed_imds_is_a_miss() {
    let sandbox = Sandbox::new("AZ_MALFORMED").await;
    mount_instance(&sandbox, ResponseTemplate::new(200).set_body_string("<html>")).await;

    assert!(AzureDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .is_none());
}

#[tokio::test]
async fn test_imds_server_error_is_a_miss() {
    let sandbox = Sandbox::new("AZ_500").await;
    mount_instance(&sandbox, ResponseTemplate::new(500)).await;

    assert!(AzureDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .is_none());
}

#[tokio::test]
async fn test_functions_from_env() {
    let sandbox = Sandbox::new("AZ_FUNC").await;
    sandbox.set_env("FUNCTIONS_WORKER_RUNTIME", "node");
    sandbox.set_env("WEBSITE_INSTANCE_ID", "inst-1");
    sandbox.set_env("REGION_NAME", "North Europe");

    let ctx = AzureDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.environment, "functions");
    assert_eq!(ctx.region, "North Europe");
    assert_eq!(ctx.instance_id, "inst-1");
}

#[tokio::test]
async fn test_functions_take_precedence_over_app_service() {
    let sandbox = Sandbox::new("AZ_FUNCAPP").await;
    sandbox.set_env("FUNCTIONS_WORKER_RUNTIME", "dotnet");
    sandbox.set_env("WEBSITE_SITE_NAME", "site");

    let ctx = AzureDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.environment, "functions");
}

#[tokio::test]
async fn test_app_service_from_site_name() {
    let sandbox = Sandbox::new("AZ_APP").await;
    sandbox.set_env("WEBSITE_SITE_NAME", "my-site");
    sandbox.set_env("AZURE_REGION", "");
    sandbox.set_env("REGION_NAME", "");
    sandbox.set_env("LOCATION", "uksouth");

    let ctx = AzureDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.environment, "app-service");
    assert_eq!(ctx.region, "uksouth");
    assert_eq!(ctx.instance_id, "unknown");
}

#[tokio::test]
async fn test_aks_from_file_marker() {
    let sandbox = Sandbox::new("AZ_AKS").await;
    sandbox.set_env("KUBERNETES_SERVICE_HOST", "10.0.0.1");
    sandbox.touch("/etc/kubernetes/azure.json");

    let ctx = AzureDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.environment, "aks");
    assert_eq!(ctx.region, "unknown");
}

#[tokio::test]
async fn test_aks_marker_without_kubernetes_is_a_miss() {
    let sandbox = Sandbox::new("AZ_AKS_NOK8S").await;
    sandbox.set_env("AKS_CLUSTER_NAME", "cluster");

    assert!(AzureDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .is_none());
}

#[tokio::test]
async fn test_plain_kubernetes_is_not_aks() {
    let sandbox = Sandbox::new("AZ_K8S_ONLY").await;
    sandbox.set_env("KUBERNETES_SERVICE_HOST", "10.0.0.1");

    assert!(AzureDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .is_none());
}

#[tokio::test]
async fn test_region_and_subscription_chains_prefer_first_variable() {
    let sandbox = Sandbox::new("AZ_CHAINS").await;
    sandbox.set_env("WEBSITE_SITE_NAME", "site");
    sandbox.set_env("AZURE_REGION", "westeurope");
    sandbox.set_env("REGION_NAME", "North Europe");
    sandbox.set_env("LOCATION", "uksouth");
    sandbox.set_env("AZURE_SUBSCRIPTION_ID", "sub-primary");
    sandbox.set_env("SUBSCRIPTION_ID", "sub-secondary");

    let ctx = AzureDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.region, "westeurope");
    assert_eq!(ctx.account_id, "sub-primary");
}

#[tokio::test]
async fn test_region_chain_skips_to_second_variable() {
    let sandbox = Sandbox::new("AZ_CHAIN2").await;
    sandbox.set_env("WEBSITE_SITE_NAME", "site");
    sandbox.set_env("REGION_NAME", "North Europe");
    sandbox.set_env("LOCATION", "uksouth");

    let ctx = AzureDetector::with_options(sandbox.options())
        .unwrap()
        .detect()
        .await
        .unwrap();
    assert_eq!(ctx.region, "North Europe");
}
