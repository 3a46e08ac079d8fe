//! End-to-end tests against an in-process calculation service.

use calc_transport_grpc::bind_tcp;
use calculator::CalculatorModule;
use calculator_sdk::{CalculationRequest, CalculatorClient, CalculatorError, CalculatorGrpcClient};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct TestServer {
    uri: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = bind_tcp("127.0.0.1:0").await.unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            CalculatorModule::new().serve(listener, token).await.unwrap();
        });
        Self { uri, cancel, handle }
    }

    async fn stop(self) {
        self.cancel.cancel();
        self.handle.await.unwrap();
    }
}

#[tokio::test]
async fn arithmetic_over_the_wire() {
    let server = TestServer::start().await;
    let client = CalculatorGrpcClient::connect(&server.uri).await.unwrap();

    let cases = [(10, "+", 5, 15), (10, "-", 5, 5), (10, "*", 5, 50), (10, "/", 4, 2)];
    for (a, op, b, expected) in cases {
        let resp = client.calculate(CalculationRequest::new(a, op, b)).await.unwrap();
        assert_eq!(resp.result, expected, "{a} {op} {b}");
    }

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn overflow_wraps_over_the_wire() {
    let server = TestServer::start().await;
    let client = CalculatorGrpcClient::connect(&server.uri).await.unwrap();

    let resp = client
        .calculate(CalculationRequest::new(i32::MAX, "+", 1))
        .await
        .unwrap();
    assert_eq!(resp.result, i32::MIN);

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn business_errors_are_invalid_argument() {
    let server = TestServer::start().await;
    let client = CalculatorGrpcClient::connect(&server.uri).await.unwrap();

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
    assert!(err.is_business_error());

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn server_keeps_serving_after_errors() {
    let server = TestServer::start().await;
    let client = CalculatorGrpcClient::connect(&server.uri).await.unwrap();

    for _ in 0..5 {
        let _ = client.calculate(CalculationRequest::new(1, "/", 0)).await;
    }
    let resp = client.calculate(CalculationRequest::new(2, "*", 21)).await.unwrap();
    assert_eq!(resp.result, 42);

    drop(client);
    server.stop().await;
}
