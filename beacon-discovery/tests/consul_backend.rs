//! Consul backend against a mocked agent API.

use beacon_discovery::*;
use beacon_health::{HealthAggregator, ReadinessGate};
use beacon_resolver::{ServiceAddress, ServiceIdentity};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn identity() -> ServiceIdentity {
    ServiceIdentity::new("AspNetService", "1.0")
}

fn address() -> ServiceAddress {
    ServiceAddress::new("10.42.13.7", 5000).unwrap()
}

#[tokio::test]
async fn test_register_sends_service_and_http_check() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/register"))
        .and(body_partial_json(serde_json::json!({
            "ID": "AspNetService-10.42.13.7-5000",
            "Name": "AspNetService",
            "Address": "10.42.13.7",
            "Port": 5000,
            "Tags": ["1.0"],
            "Check": {
                "HTTP": "http://10.42.13.7:5000/health",
                "Status": "passing"
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let registrar = ServiceRegistrar::new(Arc::new(ConsulBackend::new(server.uri()).unwrap()));
    let handle = registrar
        .register(&identity(), &address(), Arc::new(HealthAggregator::new()))
        .await
        .unwrap();

    assert_eq!(handle.id(), "AspNetService-10.42.13.7-5000");
}

#[tokio::test]
async fn test_unhealthy_probe_seeds_critical_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/register"))
        .and(body_partial_json(serde_json::json!({"Check": {"Status": "critical"}})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let gate = ReadinessGate::new();
    gate.close();

    let backend = ConsulBackend::new(server.uri()).unwrap();
    let registrar = ServiceRegistrar::new(Arc::new(backend));
    registrar
        .register(&identity(), &address(), Arc::new(gate))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_refusal_is_registration_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/register"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid check"))
        .mount(&server)
        .await;

    let registrar = ServiceRegistrar::new(Arc::new(ConsulBackend::new(server.uri()).unwrap()));
    let err = registrar
        .register(&identity(), &address(), Arc::new(HealthAggregator::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::RegistrationRejected(_)));
}

#[tokio::test]
async fn test_unreachable_agent() {
    let registrar =
        ServiceRegistrar::new(Arc::new(ConsulBackend::new("http://127.0.0.1:1").unwrap()));
    let err = registrar
        .register(&identity(), &address(), Arc::new(HealthAggregator::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::BackendUnreachable(_)));
}

#[tokio::test]
async fn test_deregister_once_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/register"))
        .and(header("X-Consul-Token", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/AspNetService-10.42.13.7-5000"))
        .and(header("X-Consul-Token", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let backend = ConsulBackend::new(server.uri()).unwrap().with_token("secret");
    let registrar = ServiceRegistrar::new(Arc::new(backend));
    let handle = registrar
        .register(&identity(), &address(), Arc::new(HealthAggregator::new()))
        .await
        .unwrap();

    registrar.deregister(&handle).await.unwrap();
    registrar.deregister(&handle).await.unwrap();
    assert_eq!(handle.state().await, RegistrationState::Deregistered);
}

#[tokio::test]
async fn test_deregister_of_reaped_service_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/AspNetService-10.42.13.7-5000"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Unknown service ID"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = ConsulBackend::new(server.uri()).unwrap();
    backend.remove("AspNetService-10.42.13.7-5000").await.unwrap();
}

#[tokio::test]
async fn test_deregister_server_error_keeps_handle_registered() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/register"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/deregister/AspNetService-10.42.13.7-5000"))
        .respond_with(ResponseTemplate::new(500).set_body_string("agent overloaded"))
        .mount(&server)
        .await;

    let registrar = ServiceRegistrar::new(Arc::new(ConsulBackend::new(server.uri()).unwrap()));
    let handle = registrar
        .register(&identity(), &address(), Arc::new(HealthAggregator::new()))
        .await
        .unwrap();

    let err = registrar.deregister(&handle).await.unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::DeregistrationFailed(ref body) if body == "agent overloaded"
    ));
    assert_eq!(handle.state().await, RegistrationState::Registered);
}
