//! Resolution against a mocked metadata endpoint, one test per deployment mode.

use beacon_resolver::*;
use std::net::IpAddr;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn metadata_server(entries: &[(&str, &str)]) -> MockServer {
    let server = MockServer::start().await;
    for (key, value) in entries {
        Mock::given(method("GET"))
            .and(path(format!("/2015-12-19/{}", key)))
            .respond_with(ResponseTemplate::new(200).set_body_string(*value))
            .mount(&server)
            .await;
    }
    server
}

fn resolver_for(server: &MockServer) -> AddressResolver {
    let metadata = MetadataClient::new(format!("{}/2015-12-19", server.uri())).unwrap();
    AddressResolver::new(metadata, 5000)
}

fn fake_interfaces() -> Vec<(String, IpAddr)> {
    vec![
        ("lo".to_string(), "127.0.0.1".parse().unwrap()),
        ("wlan0".to_string(), "192.168.0.42".parse().unwrap()),
    ]
}

#[tokio::test]
async fn test_containerized_uses_primary_ip_and_fixed_port() {
    let server = metadata_server(&[("self/container/primary_ip", "10.42.13.7\n")]).await;

    let address = resolver_for(&server)
        .resolve(DeploymentMode::Containerized)
        .await
        .unwrap();

    assert_eq!(address.host(), "10.42.13.7");
    assert_eq!(address.port(), 5000);
}

#[tokio::test]
async fn test_host_networked_uses_published_port_prefix() {
    let server = metadata_server(&[
        ("self/service/ports/0", "8080:tcp"),
        ("self/host/agent_ip", "172.31.4.20"),
    ])
    .await;

    let address = resolver_for(&server)
        .resolve(DeploymentMode::HostNetworked)
        .await
        .unwrap();

    assert_eq!(address.host(), "172.31.4.20");
    assert_eq!(address.port(), 8080);
}

#[tokio::test]
async fn test_host_networked_without_delimiter_is_malformed() {
    let server = metadata_server(&[
        ("self/service/ports/0", "8080"),
        ("self/host/agent_ip", "172.31.4.20"),
    ])
    .await;

    let err = resolver_for(&server)
        .resolve(DeploymentMode::HostNetworked)
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::MalformedMetadata { .. }));
}

#[tokio::test]
async fn test_empty_primary_ip_is_malformed() {
    let server = metadata_server(&[("self/container/primary_ip", "  \n")]).await;

    let err = resolver_for(&server)
        .resolve(DeploymentMode::Containerized)
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::MalformedMetadata { .. }));
}

#[tokio::test]
async fn test_unreachable_metadata_is_fatal() {
    let metadata = MetadataClient::new("http://127.0.0.1:1/2015-12-19").unwrap();
    let resolver = AddressResolver::new(metadata, 5000);

    let err = resolver.resolve(DeploymentMode::Containerized).await.unwrap_err();
    assert!(matches!(err, ResolveError::MetadataUnavailable { .. }));
}

#[tokio::test]
async fn test_local_uses_first_non_loopback_interface() {
    // Local mode never touches metadata, so an unreachable base is fine.
    let metadata = MetadataClient::new("http://127.0.0.1:1").unwrap();
    let resolver = AddressResolver::new(metadata, 5000).with_interfaces(fake_interfaces);

    let address = resolver.resolve(DeploymentMode::Local).await.unwrap();
    assert_eq!(address.host(), "192.168.0.42");
    assert_eq!(address.port(), 5000);
}

#[tokio::test]
async fn test_local_without_interfaces_fails() {
    let metadata = MetadataClient::new("http://127.0.0.1:1").unwrap();
    let resolver = AddressResolver::new(metadata, 5000)
        .with_interfaces(|| vec![("lo".to_string(), "127.0.0.1".parse().unwrap())]);

    let err = resolver.resolve(DeploymentMode::Local).await.unwrap_err();
    assert!(matches!(err, ResolveError::NoLocalAddress));
}

#[tokio::test]
async fn test_every_mode_yields_valid_address() {
    let server = metadata_server(&[
        ("self/container/primary_ip", "10.42.13.7"),
        ("self/service/ports/0", "31000:5000/tcp"),
        ("self/host/agent_ip", "172.31.4.20"),
    ])
    .await;
    let resolver = resolver_for(&server).with_interfaces(fake_interfaces);

    for mode in [
        DeploymentMode::Containerized,
        DeploymentMode::HostNetworked,
        DeploymentMode::Local,
    ] {
        let address = resolver.resolve(mode).await.unwrap();
        assert!(!address.host().is_empty(), "{}", mode);
        assert!(address.port() >= 1, "{}", mode);
    }
}
