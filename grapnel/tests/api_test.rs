use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use tokio_stream::wrappers::TcpListenerStream;
use tonic::server::NamedService;
use tower::ServiceExt;

use grapnel::routes;
use grapnel::state::AppState;

fn router() -> Router {
    routes::router(AppState::new())
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post_json(router: &Router, uri: &str, body: Value, auth: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        request = request.header(header::AUTHORIZATION, auth);
    }
    let response = router
        .clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn index_endpoints_answer() {
    let router = router();

    let (status, body) = get(&router, "/grpc/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Default endpoint for grpc" }));

    let (status, body) = get(&router, "/metadata/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "Default endpoint for reflection metadata" })
    );
}

#[tokio::test]
async fn call_executes_a_unary_method() {
    let addr = adder_service::spawn().await;
    let router = router();

    let (status, body) = post_json(
        &router,
        "/grpc/call",
        json!({
            "host": addr.to_string(),
            "method": "addsvc.Add.Sum",
            "message": { "a": 2, "b": 3 },
        }),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "v": 5 }));
}

#[tokio::test]
async fn call_rejects_envelopes_without_required_fields() {
    let router = router();

    let (status, body) = post_json(&router, "/grpc/call", json!({}), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));
}

#[tokio::test]
async fn call_rejects_dotless_method_names() {
    let router = router();

    let (status, body) = post_json(
        &router,
        "/grpc/call",
        json!({ "host": "127.0.0.1:1", "method": "Sum" }),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid method name format: Sum" }));
}

#[tokio::test]
async fn call_forwards_the_authorization_header() {
    let addr = adder_service::spawn().await;
    let router = router();

    let (status, body) = post_json(
        &router,
        "/grpc/call",
        json!({
            "host": addr.to_string(),
            "method": "addsvc.Add.Meta",
            "message": { "key": "authorization" },
        }),
        Some("Bearer XYZ"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "values": ["Bearer XYZ"] }));
}

#[tokio::test]
async fn metadata_lists_services_without_the_reflection_service() {
    let addr = adder_service::spawn().await;
    let router = router();

    let (status, body) = get(&router, &format!("/metadata/{addr}")).await;

    assert_eq!(status, StatusCode::OK);
    let services = body.as_array().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0]["serviceName"], "addsvc.Add");
    assert!(
        services
            .iter()
            .all(|s| s["serviceName"] != "grpc.reflection.v1alpha.ServerReflection")
    );
}

#[tokio::test]
async fn metadata_detail_includes_input_fields() {
    let addr = adder_service::spawn().await;
    let router = router();

    let (status, body) = get(&router, &format!("/metadata/{addr}/addsvc.Add/Sum")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isStreaming"], false);
    let fields = body["inputDetails"]["fields"].as_array().unwrap();
    let names: Vec<_> = fields.iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["a", "b"]);
    assert!(fields.iter().all(|f| f["type"] == "TYPE_INT32"));
}

#[tokio::test]
async fn metadata_detail_for_unknown_service_is_404() {
    let addr = adder_service::spawn().await;
    let router = router();

    let (status, body) = get(&router, &format!("/metadata/{addr}/ghost.Unrelated/Foo")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("'ghost.Unrelated' not found"));
}

#[tokio::test]
async fn metadata_detail_for_unknown_method_is_404() {
    let addr = adder_service::spawn().await;
    let router = router();

    let (status, body) = get(&router, &format!("/metadata/{addr}/addsvc.Add/Ghost")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({ "error": "Method Ghost not found in service addsvc.Add" })
    );
}

#[tokio::test]
async fn second_metadata_fetch_within_ttl_hits_the_cache() {
    let (addr, hits) = spawn_counted_fixture().await;
    let router = router();

    let (status, first) = get(&router, &format!("/metadata/{addr}")).await;
    assert_eq!(status, StatusCode::OK);
    let after_first = hits.load(Ordering::SeqCst);
    assert!(after_first > 0);

    let (status, second) = get(&router, &format!("/metadata/{addr}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);

    // The cached answer must not have touched the reflection service again.
    assert_eq!(hits.load(Ordering::SeqCst), after_first);
}

/// A fixture whose reflection service counts incoming requests.
async fn spawn_counted_fixture() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let reflection = tonic_reflection::server::Builder::configure()
        .register_file_descriptor_set(adder_service::file_descriptor_set())
        .build_v1alpha()
        .unwrap();
    let counted = Counted {
        inner: reflection,
        hits: Arc::clone(&hits),
    };

    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(counted)
            .add_service(adder_service::AdderServer::new())
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    (addr, hits)
}

#[derive(Clone)]
struct Counted<S> {
    inner: S,
    hits: Arc<AtomicUsize>,
}

impl<S: NamedService> NamedService for Counted<S> {
    const NAME: &'static str = S::NAME;
}

impl<S, B> tower::Service<Request<B>> for Counted<S>
where
    S: tower::Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.inner.call(req)
    }
}
