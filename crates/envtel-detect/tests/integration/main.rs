//! Integration tests for envtel-detect
//!
//! Uses wiremock to simulate the AWS, Azure and GCP metadata services and
//! tempdir fixture trees for filesystem markers. Every test namespaces its
//! environment variables with a unique prefix so tests can run in parallel.

mod common;

mod test_aws;
mod test_azure;
mod test_cloud;
