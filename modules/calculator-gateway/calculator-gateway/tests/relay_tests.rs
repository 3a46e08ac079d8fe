//! End-to-end relay tests: caller -> gateway -> calculation service, all
//! in-process on ephemeral ports.

use std::sync::Arc;
use std::time::{Duration, Instant};

use calc_transport_grpc::bind_tcp;
use calculator::CalculatorModule;
use calculator_gateway::infra::GrpcConnector;
use calculator_gateway::{CalculatorGateway, DeadlinePolicy, Service, UpstreamConfig};
use calculator_sdk::{
    CalculateRequest, CalculateResponse, CalculateService, CalculateServiceServer,
    CalculationRequest, CalculatorClient, CalculatorError, CalculatorGrpcClient,
};
use futures::future::join_all;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::service::Routes;
use tonic::{Request, Response, Status};

struct Running {
    uri: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Running {
    async fn stop(self) {
        self.cancel.cancel();
        self.handle.await.unwrap();
    }
}

async fn listen() -> (TcpListener, String) {
    let listener = bind_tcp("127.0.0.1:0").await.unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    (listener, uri)
}

async fn start_calculator() -> Running {
    let (listener, uri) = listen().await;
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let handle = tokio::spawn(async move {
        CalculatorModule::new().serve(listener, token).await.unwrap();
    });
    Running { uri, cancel, handle }
}

/// Calculation service stand-in that answers after `delay`.
struct SlowCalculator {
    delay: Duration,
}

#[tonic::async_trait]
impl CalculateService for SlowCalculator {
    async fn calculate(
        &self,
        request: Request<CalculateRequest>,
    ) -> Result<Response<CalculateResponse>, Status> {
        tokio::time::sleep(self.delay).await;
        let req = request.into_inner();
        Ok(Response::new(CalculateResponse {
            result: req.a.wrapping_add(req.b),
        }))
    }
}

/// Calculation service stand-in whose behaviour is keyed on the operands:
/// `x / 0` is rejected, a negative `a` answers after `slow_for`, anything
/// else answers `a + b` at once.
struct MixedCalculator {
    slow_for: Duration,
}

#[tonic::async_trait]
impl CalculateService for MixedCalculator {
    async fn calculate(
        &self,
        request: Request<CalculateRequest>,
    ) -> Result<Response<CalculateResponse>, Status> {
        let req = request.into_inner();
        if req.opr == "/" && req.b == 0 {
            return Err(Status::invalid_argument("division by zero"));
        }
        if req.a < 0 {
            tokio::time::sleep(self.slow_for).await;
        }
        Ok(Response::new(CalculateResponse {
            result: req.a.wrapping_add(req.b),
        }))
    }
}

async fn start_slow_calculator(delay: Duration) -> Running {
    start_stand_in(SlowCalculator { delay }).await
}

async fn start_stand_in<S: CalculateService>(svc: S) -> Running {
    let (listener, uri) = listen().await;
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let routes = Routes::new(CalculateServiceServer::new(svc));
    let handle = tokio::spawn(async move {
        calc_transport_grpc::serve_tcp(listener, routes, token)
            .await
            .unwrap();
    });
    Running { uri, cancel, handle }
}

async fn start_gateway(cfg: &UpstreamConfig) -> (Running, Arc<Service<GrpcConnector>>) {
    let (listener, uri) = listen().await;
    let service = Arc::new(Service::from_config(cfg));
    let gateway = CalculatorGateway::new(Arc::clone(&service));
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let handle = tokio::spawn(async move {
        gateway.serve(listener, token).await.unwrap();
    });
    (Running { uri, cancel, handle }, service)
}

/// Poll `cond` for up to `within`.
async fn eventually(within: Duration, cond: impl Fn() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < within {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

fn upstream(uri: &str) -> UpstreamConfig {
    UpstreamConfig {
        uri: uri.to_owned(),
        ..Default::default()
    }
}

#[tokio::test]
async fn relays_results_unchanged() {
    let calc = start_calculator().await;
    let (gateway, _service) = start_gateway(&upstream(&calc.uri)).await;
    let client = CalculatorGrpcClient::connect(&gateway.uri).await.unwrap();

    let resp = client.calculate(CalculationRequest::new(15, "+", 5)).await.unwrap();
    assert_eq!(resp.result, 20);
    let resp = client.calculate(CalculationRequest::new(20, "/", 4)).await.unwrap();
    assert_eq!(resp.result, 5);
    let resp = client
        .calculate(CalculationRequest::new(i32::MAX, "*", 2))
        .await
        .unwrap();
    assert_eq!(resp.result, -2);

    drop(client);
    gateway.stop().await;
    calc.stop().await;
}

#[tokio::test]
async fn relays_business_errors_verbatim() {
    let calc = start_calculator().await;
    let (gateway, service) = start_gateway(&upstream(&calc.uri)).await;
    let client = CalculatorGrpcClient::connect(&gateway.uri).await.unwrap();

    let err = client
        .calculate(CalculationRequest::new(10, "/", 0))
        .await
        .unwrap_err();
    assert_eq!(err, CalculatorError::InvalidArgument("division by zero".to_owned()));

    let err = client
        .calculate(CalculationRequest::new(10, "%", 3))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CalculatorError::InvalidArgument("unsupported operation: %".to_owned())
    );

    // A business error is a complete round trip; the connection stays pooled.
    let stats = service.pool_stats();
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.opened, 1);
    assert_eq!(stats.idle, 1);

    drop(client);
    gateway.stop().await;
    calc.stop().await;
}

#[tokio::test]
async fn slow_upstream_yields_deadline_exceeded_without_leaks() {
    let slow = start_slow_calculator(Duration::from_secs(2)).await;
    let cfg = UpstreamConfig {
        deadline: Duration::from_millis(100),
        ..upstream(&slow.uri)
    };
    let (gateway, service) = start_gateway(&cfg).await;
    let client = CalculatorGrpcClient::connect(&gateway.uri).await.unwrap();

    for _ in 0..3 {
        let err = client
            .calculate(CalculationRequest::new(1, "+", 1))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CalculatorError::DeadlineExceeded(
                "calculation service did not respond within 100ms".to_owned()
            )
        );
    }

    let stats = service.pool_stats();
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.idle, 0);
    assert_eq!(stats.opened, stats.closed);

    drop(client);
    gateway.stop().await;
    slow.stop().await;
}

#[tokio::test]
async fn unreachable_upstream_yields_unavailable() {
    // Reserve a port, then free it so nothing is listening there.
    let (listener, dead_uri) = listen().await;
    drop(listener);

    let cfg = UpstreamConfig {
        connect_timeout: Duration::from_millis(200),
        ..upstream(&dead_uri)
    };
    let (gateway, service) = start_gateway(&cfg).await;
    let client = CalculatorGrpcClient::connect(&gateway.uri).await.unwrap();

    let err = client
        .calculate(CalculationRequest::new(1, "+", 1))
        .await
        .unwrap_err();
    let CalculatorError::Unavailable(message) = err else {
        panic!("expected Unavailable, got {err:?}");
    };
    assert!(message.starts_with("calculation service unavailable:"), "{message}");
    assert_eq!(service.pool_stats().in_use, 0);

    drop(client);
    gateway.stop().await;
}

#[tokio::test]
async fn concurrent_mixed_requests_return_pool_to_baseline() {
    let calc = start_calculator().await;
    let mut cfg = upstream(&calc.uri);
    cfg.pool.max_idle = 4;
    let (gateway, service) = start_gateway(&cfg).await;
    let client = CalculatorGrpcClient::connect(&gateway.uri).await.unwrap();

    let calls = (0..32).map(|i| {
        let client = client.clone();
        async move {
            let req = if i % 4 == 0 {
                CalculationRequest::new(i, "/", 0)
            } else {
                CalculationRequest::new(i, "+", 1)
            };
            (i, client.calculate(req).await)
        }
    });

    for (i, result) in join_all(calls).await {
        if i % 4 == 0 {
            assert_eq!(
                result.unwrap_err(),
                CalculatorError::InvalidArgument("division by zero".to_owned())
            );
        } else {
            assert_eq!(result.unwrap().result, i + 1);
        }
    }

    let stats = service.pool_stats();
    assert_eq!(stats.in_use, 0);
    assert!(stats.idle <= 4, "{stats:?}");
    assert_eq!(stats.opened - stats.closed, stats.idle);

    drop(client);
    gateway.stop().await;
    calc.stop().await;
}

#[tokio::test]
async fn dial_per_request_closes_every_connection() {
    let calc = start_calculator().await;
    let mut cfg = upstream(&calc.uri);
    cfg.pool.max_idle = 0;
    let (gateway, service) = start_gateway(&cfg).await;
    let client = CalculatorGrpcClient::connect(&gateway.uri).await.unwrap();

    for i in 0..3 {
        let resp = client.calculate(CalculationRequest::new(i, "*", 2)).await.unwrap();
        assert_eq!(resp.result, i * 2);
    }

    let stats = service.pool_stats();
    assert_eq!(stats.opened, 3);
    assert_eq!(stats.closed, 3);
    assert_eq!(stats.idle, 0);

    drop(client);
    gateway.stop().await;
    calc.stop().await;
}

#[tokio::test]
async fn concurrent_requests_with_timeouts_return_pool_to_baseline() {
    let upstream_svc = start_stand_in(MixedCalculator {
        slow_for: Duration::from_secs(2),
    })
    .await;
    let mut cfg = UpstreamConfig {
        deadline: Duration::from_millis(200),
        ..upstream(&upstream_svc.uri)
    };
    cfg.pool.max_idle = 4;
    let (gateway, service) = start_gateway(&cfg).await;
    let client = CalculatorGrpcClient::connect(&gateway.uri).await.unwrap();

    let calls = (0..32).map(|i| {
        let client = client.clone();
        async move {
            let req = match i % 4 {
                0 => CalculationRequest::new(i, "/", 0),
                1 => CalculationRequest::new(-i, "+", 1),
                _ => CalculationRequest::new(i, "+", 1),
            };
            (i, client.calculate(req).await)
        }
    });

    let started = Instant::now();
    for (i, result) in join_all(calls).await {
        match i % 4 {
            0 => assert_eq!(
                result.unwrap_err(),
                CalculatorError::InvalidArgument("division by zero".to_owned())
            ),
            1 => assert_eq!(
                result.unwrap_err(),
                CalculatorError::DeadlineExceeded(
                    "calculation service did not respond within 200ms".to_owned()
                )
            ),
            _ => assert_eq!(result.unwrap().result, i + 1),
        }
    }
    assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());

    let stats = service.pool_stats();
    assert_eq!(stats.in_use, 0);
    assert!(stats.idle <= 4, "{stats:?}");
    assert_eq!(stats.opened - stats.closed, stats.idle);
    assert!(stats.closed >= 8, "timed out connections are closed: {stats:?}");

    drop(client);
    gateway.stop().await;
    upstream_svc.stop().await;
}

#[tokio::test]
async fn cancelled_caller_releases_outbound_connection() {
    let slow = start_slow_calculator(Duration::from_secs(5)).await;
    let cfg = UpstreamConfig {
        deadline: Duration::from_secs(10),
        ..upstream(&slow.uri)
    };
    let (gateway, service) = start_gateway(&cfg).await;
    let client = CalculatorGrpcClient::connect(&gateway.uri).await.unwrap();

    let call = {
        let client = client.clone();
        tokio::spawn(async move { client.calculate(CalculationRequest::new(1, "+", 1)).await })
    };
    assert!(eventually(Duration::from_secs(2), || service.pool_stats().in_use == 1).await);

    call.abort();
    assert!(call.await.unwrap_err().is_cancelled());

    assert!(
        eventually(Duration::from_secs(2), || service.pool_stats().in_use == 0).await,
        "{:?}",
        service.pool_stats()
    );
    let stats = service.pool_stats();
    assert_eq!(stats.idle, 0);
    assert_eq!(stats.opened, stats.closed);

    drop(client);
    gateway.stop().await;
    slow.stop().await;
}

#[tokio::test]
async fn caller_bounded_policy_follows_caller_timeout() {
    let slow = start_slow_calculator(Duration::from_secs(5)).await;
    let cfg = UpstreamConfig {
        deadline: Duration::from_secs(10),
        deadline_policy: DeadlinePolicy::CallerBounded,
        ..upstream(&slow.uri)
    };
    let (gateway, service) = start_gateway(&cfg).await;
    let client = CalculatorGrpcClient::connect(&gateway.uri)
        .await
        .unwrap()
        .with_timeout(Duration::from_millis(200));

    let started = Instant::now();
    let err = client
        .calculate(CalculationRequest::new(1, "+", 1))
        .await
        .unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
    // The server's own grpc-timeout handling can answer before the relay does.
    assert!(
        matches!(
            &err,
            CalculatorError::DeadlineExceeded(_)
                | CalculatorError::Other {
                    code: tonic::Code::Cancelled,
                    ..
                }
        ),
        "{err:?}"
    );

    assert!(
        eventually(Duration::from_secs(2), || service.pool_stats().in_use == 0).await,
        "{:?}",
        service.pool_stats()
    );
    assert_eq!(service.pool_stats().idle, 0);

    drop(client);
    gateway.stop().await;
    slow.stop().await;
}
