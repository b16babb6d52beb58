//! Tests for the dispatcher state machine
//!
//! # Test Coverage
//!
//! - Route lookup: 404, 405 with `Allow` on static and parameterized routes
//! - Negotiation short-circuits: 400 on malformed headers, 415, 406
//! - Request assembly: path parameters, raw and pre-parsed queries, malformed queries
//! - Handler outcomes: status errors, internal faults, 413 from oversized bodies
//! - Timeout and cancellation, with the request body released on every path
//! - Content-Type injection (skipped for wildcard ranges), middleware hooks, request ids, table reload

mod common;

use brrtdispatch::body::Body;
use brrtdispatch::dispatcher::{DispatchError, Dispatcher, RequestContext};
use brrtdispatch::handler::{HandlerError, StatusError};
use brrtdispatch::ids::RequestId;
use brrtdispatch::middleware::{Middleware, RequestHead, TracingMiddleware};
use brrtdispatch::registry::{Endpoint, EndpointRegistry};
use brrtdispatch::runtime_config::RuntimeConfig;
use brrtdispatch::server::{QueryParams, Request, Response, TransportRequest};
use common::handlers::{counted, endpoint};
use common::responses::body_text;
use common::sources::TrackedReader;
use http::{Method, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn dispatcher_for(registry: EndpointRegistry, config: RuntimeConfig) -> Dispatcher {
    common::test_tracing::init();
    Dispatcher::new(registry.build().unwrap(), config)
}

fn pets() -> Dispatcher {
    let registry = EndpointRegistry::new()
        .with_endpoint(endpoint(Method::GET, "/pets", &[], &["application/json"], "json"))
        .with_endpoint(endpoint(Method::GET, "/pets", &[], &["text/plain"], "text"))
        .with_endpoint(endpoint(
            Method::POST,
            "/pets",
            &["application/json"],
            &["application/json"],
            "created",
        ));
    dispatcher_for(registry, RuntimeConfig::default())
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let res = pets()
        .dispatch(TransportRequest::new(Method::GET, "/owners"))
        .await
        .unwrap();
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(!res.has_body());
}

#[tokio::test]
async fn test_wrong_method_is_405_with_allow() {
    let res = pets()
        .dispatch(TransportRequest::new(Method::DELETE, "/pets"))
        .await
        .unwrap();
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers.get("Allow"), Some("GET, POST"));
    assert!(!res.has_body());
}

#[tokio::test]
async fn test_wrong_method_on_param_route_is_405() {
    let registry = EndpointRegistry::new().with_endpoint(endpoint(
        Method::GET,
        "/items/{id}",
        &[],
        &["application/json"],
        "item",
    ));
    let dispatcher = dispatcher_for(registry, RuntimeConfig::default());

    let res = dispatcher
        .dispatch(TransportRequest::new(Method::DELETE, "/items/7"))
        .await
        .unwrap();
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers.get("Allow"), Some("GET"));

    let res = dispatcher
        .dispatch(TransportRequest::new(Method::GET, "/missing"))
        .await
        .unwrap();
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = dispatcher
        .dispatch(TransportRequest::new(Method::GET, "/items/7"))
        .await
        .unwrap();
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_accept_selects_endpoint_and_sets_content_type() {
    let dispatcher = pets();

    let req = TransportRequest::new(Method::GET, "/pets")
        .header("Accept", "application/json;q=0.4, text/plain;q=0.9");
    let res = dispatcher.dispatch(req).await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.headers.get("content-type"),
        Some("text/plain;charset=utf-8")
    );
    assert_eq!(body_text(res).await, "text");

    // No Accept: first registered endpoint wins
    let res = dispatcher
        .dispatch(TransportRequest::new(Method::GET, "/pets"))
        .await
        .unwrap();
    assert_eq!(
        res.headers.get("Content-Type"),
        Some("application/json;charset=utf-8")
    );
    assert_eq!(body_text(res).await, "json");
}

#[tokio::test]
async fn test_unsupported_media_type_is_415() {
    let req = TransportRequest::new(Method::POST, "/pets")
        .header("Content-Type", "text/csv")
        .body("a,b");
    let res = pets().dispatch(req).await.unwrap();
    assert_eq!(res.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(!res.has_body());

    let res = pets()
        .dispatch(TransportRequest::new(Method::POST, "/pets"))
        .await
        .unwrap();
    assert_eq!(res.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_not_acceptable_is_406() {
    let req = TransportRequest::new(Method::GET, "/pets").header("Accept", "image/png");
    let res = pets().dispatch(req).await.unwrap();
    assert_eq!(res.status, StatusCode::NOT_ACCEPTABLE);
    assert!(!res.has_body());
}

#[tokio::test]
async fn test_malformed_headers_are_400() {
    let dispatcher = pets();

    let req = TransportRequest::new(Method::POST, "/pets").header("Content-Type", "json");
    let res = dispatcher.dispatch(req).await.unwrap();
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let req = TransportRequest::new(Method::GET, "/pets").header("Accept", "text/plain;q=2");
    let res = dispatcher.dispatch(req).await.unwrap();
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(!res.has_body());
}

async fn echo_params(req: Request, _ctx: RequestContext) -> Result<Response, HandlerError> {
    let id = req.get_path_param("id").unwrap_or("-").to_string();
    let tags = req.query.get_all("tag").join("+");
    Ok(Response::ok(format!("{id}|{tags}")))
}

fn echo_dispatcher() -> Dispatcher {
    let registry = EndpointRegistry::new().with_endpoint(
        Endpoint::builder(Method::GET, "/pets/{id}")
            .handler(echo_params)
            .unwrap(),
    );
    dispatcher_for(registry, RuntimeConfig::default())
}

#[tokio::test]
async fn test_path_and_query_parameters() {
    let dispatcher = echo_dispatcher();

    let req = TransportRequest::new(Method::GET, "/pets/sir%20wags?tag=a&tag=b%26c&limit=");
    let res = dispatcher.dispatch(req).await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    // No producible type declared, so nothing to inject
    assert!(!res.headers.contains("Content-Type"));
    assert_eq!(body_text(res).await, "sir wags|a+b&c");

    let mut query = QueryParams::new();
    query.append("tag", "parsed");
    let req = TransportRequest::new(Method::GET, "/pets/7").query(query);
    let res = dispatcher.dispatch(req).await.unwrap();
    assert_eq!(body_text(res).await, "7|parsed");
}

#[tokio::test]
async fn test_malformed_query_is_400() {
    let req = TransportRequest::new(Method::GET, "/pets/7?tag");
    let res = echo_dispatcher().dispatch(req).await.unwrap();
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_error_becomes_bodyless_response() {
    let missing = |_req: Request, _ctx: RequestContext| async {
        Err::<Response, _>(HandlerError::from(
            StatusError::not_found()
                .with_header("X-Reason", "gone")
                .with_message("pet 7 was adopted"),
        ))
    };
    let registry = EndpointRegistry::new().with_endpoint(
        Endpoint::builder(Method::GET, "/pets/{id}")
            .produces("application/json")
            .handler(missing)
            .unwrap(),
    );
    let res = dispatcher_for(registry, RuntimeConfig::default())
        .dispatch(TransportRequest::new(Method::GET, "/pets/7"))
        .await
        .unwrap();
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.headers.get("X-Reason"), Some("gone"));
    assert!(!res.headers.contains("Content-Type"));
    assert!(!res.has_body());
}

#[tokio::test]
async fn test_internal_error_propagates_and_releases_body() {
    let failing = |_req: Request, _ctx: RequestContext| async {
        Err::<Response, _>(HandlerError::internal(std::io::Error::other("database down")))
    };
    let registry = EndpointRegistry::new().with_endpoint(
        Endpoint::builder(Method::POST, "/upload")
            .name("upload")
            .handler(failing)
            .unwrap(),
    );
    let dispatcher = dispatcher_for(registry, RuntimeConfig::default());

    let closes = Arc::new(AtomicUsize::new(0));
    let body = Body::from_reader(
        TrackedReader::new(b"payload".to_vec(), Arc::clone(&closes)),
        None,
        4,
    );
    let request_id = RequestId::new();
    let req = TransportRequest::new(Method::POST, "/upload")
        .header("X-Request-Id", request_id.to_string())
        .body(body);

    match dispatcher.dispatch(req).await {
        Err(err @ DispatchError::Handler { .. }) => {
            assert_eq!(err.status_hint(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.request_id(), request_id);
            assert!(err.to_string().contains("upload"));
            assert!(err.to_string().contains("database down"));
        }
        other => panic!("expected handler error, got {other:?}"),
    }
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let read_all = |req: Request, _ctx: RequestContext| async move {
        let body = req.body.bytes().await?;
        Ok::<_, HandlerError>(Response::ok(body))
    };
    let registry = EndpointRegistry::new().with_endpoint(
        Endpoint::builder(Method::POST, "/upload")
            .handler(read_all)
            .unwrap(),
    );
    let config = RuntimeConfig {
        max_body_bytes: Some(4),
        ..RuntimeConfig::default()
    };
    let dispatcher = dispatcher_for(registry, config);

    let req = TransportRequest::new(Method::POST, "/upload").body("too large");
    let res = dispatcher.dispatch(req).await.unwrap();
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!res.has_body());

    let req = TransportRequest::new(Method::POST, "/upload").body("tiny");
    let res = dispatcher.dispatch(req).await.unwrap();
    assert_eq!(body_text(res).await, "tiny");
}

#[tokio::test(start_paused = true)]
async fn test_handler_timeout_cancels_context() {
    let observed = Arc::new(Mutex::new(None::<RequestContext>));
    let slow = {
        let observed = Arc::clone(&observed);
        move |_req: Request, ctx: RequestContext| {
            *observed.lock().unwrap() = Some(ctx);
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, HandlerError>(Response::ok("late"))
            }
        }
    };
    let registry = EndpointRegistry::new().with_endpoint(
        Endpoint::builder(Method::GET, "/slow").handler(slow).unwrap(),
    );
    let config = RuntimeConfig {
        handler_timeout_ms: Some(50),
        ..RuntimeConfig::default()
    };
    let dispatcher = dispatcher_for(registry, config);

    let err = dispatcher
        .dispatch(TransportRequest::new(Method::GET, "/slow"))
        .await
        .unwrap_err();
    match &err {
        DispatchError::Timeout { timeout, .. } => {
            assert_eq!(*timeout, Duration::from_millis(50));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(err.status_hint(), StatusCode::SERVICE_UNAVAILABLE);

    let ctx = observed.lock().unwrap().take().unwrap();
    assert!(ctx.is_cancelled());
    assert_eq!(ctx.request_id(), err.request_id());
}

#[tokio::test]
async fn test_cancellation_drops_handler_and_body() {
    let closes = Arc::new(AtomicUsize::new(0));
    let stuck = |req: Request, _ctx: RequestContext| async move {
        let _hold = req;
        std::future::pending::<()>().await;
        Ok::<_, HandlerError>(Response::ok("unreachable"))
    };
    let registry = EndpointRegistry::new().with_endpoint(
        Endpoint::builder(Method::POST, "/stuck").handler(stuck).unwrap(),
    );
    let dispatcher = dispatcher_for(registry, RuntimeConfig::default());

    let body = Body::from_reader(
        TrackedReader::new(b"held".to_vec(), Arc::clone(&closes)),
        None,
        4,
    );
    let ctx = RequestContext::new(RequestId::new());
    let canceller = {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            ctx.cancel();
        })
    };

    let result = dispatcher
        .dispatch_with_context(TransportRequest::new(Method::POST, "/stuck").body(body), ctx)
        .await;
    canceller.await.unwrap();
    assert!(matches!(result, Err(DispatchError::Cancelled { .. })));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handler_content_type_is_kept() {
    let custom = |_req: Request, _ctx: RequestContext| async {
        Ok::<_, HandlerError>(
            Response::ok("{}").with_header("Content-Type", "application/problem+json"),
        )
    };
    let streamed = |_req: Request, _ctx: RequestContext| async {
        Ok::<_, HandlerError>(Response::new(StatusCode::OK).with_stream(Body::from_bytes("chunk")))
    };
    let registry = EndpointRegistry::new()
        .with_endpoint(
            Endpoint::builder(Method::GET, "/custom")
                .produces("application/json")
                .handler(custom)
                .unwrap(),
        )
        .with_endpoint(
            Endpoint::builder(Method::GET, "/streamed")
                .produces("text/plain")
                .handler(streamed)
                .unwrap(),
        );
    let dispatcher = dispatcher_for(registry, RuntimeConfig::default());

    let res = dispatcher
        .dispatch(TransportRequest::new(Method::GET, "/custom"))
        .await
        .unwrap();
    assert_eq!(
        res.headers.get("content-type"),
        Some("application/problem+json")
    );

    let res = dispatcher
        .dispatch(TransportRequest::new(Method::GET, "/streamed"))
        .await
        .unwrap();
    assert_eq!(
        res.headers.get("content-type"),
        Some("text/plain;charset=utf-8")
    );
    assert_eq!(res.content_length(), Some(5));
    assert_eq!(body_text(res).await, "chunk");
}

#[tokio::test]
async fn test_wildcard_produces_is_not_injected() {
    let registry = EndpointRegistry::new()
        .with_endpoint(endpoint(Method::GET, "/any", &[], &["*/*"], "any"))
        .with_endpoint(endpoint(Method::GET, "/text", &[], &["text/*"], "text"));
    let dispatcher = dispatcher_for(registry, RuntimeConfig::default());

    for path in ["/any", "/text"] {
        let res = dispatcher
            .dispatch(TransportRequest::new(Method::GET, path))
            .await
            .unwrap();
        assert_eq!(res.status, StatusCode::OK, "{path}");
        assert!(!res.headers.contains("Content-Type"), "{path}");
        assert!(res.has_body(), "{path}");
    }
}

#[derive(Default)]
struct Recorder {
    block_path: Option<&'static str>,
    befores: AtomicUsize,
    afters: Mutex<Vec<(u16, Option<String>)>>,
}

impl Middleware for Recorder {
    fn before(&self, head: &RequestHead, _req: &Request) -> Option<Response> {
        self.befores.fetch_add(1, Ordering::SeqCst);
        match self.block_path {
            Some(path) if head.path == path => Some(Response::new(StatusCode::FORBIDDEN)),
            _ => None,
        }
    }

    fn after(&self, head: &RequestHead, res: &mut Response, _latency: Duration) {
        res.headers.insert("X-Seen", "1");
        self.afters
            .lock()
            .unwrap()
            .push((res.status.as_u16(), head.endpoint.as_deref().map(str::to_string)));
    }
}

#[tokio::test]
async fn test_middleware_hooks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = EndpointRegistry::new()
        .with_endpoint(
            Endpoint::builder(Method::GET, "/open")
                .name("open")
                .handler(counted("open", Arc::clone(&calls)))
                .unwrap(),
        )
        .with_endpoint(
            Endpoint::builder(Method::GET, "/admin")
                .name("admin")
                .handler(counted("admin", Arc::clone(&calls)))
                .unwrap(),
        );
    let mut dispatcher = dispatcher_for(registry, RuntimeConfig::default());
    let recorder = Arc::new(Recorder {
        block_path: Some("/admin"),
        ..Recorder::default()
    });
    dispatcher.add_middleware(Arc::new(TracingMiddleware));
    dispatcher.add_middleware(Arc::clone(&recorder) as Arc<dyn Middleware>);

    for path in ["/open", "/admin", "/missing"] {
        let res = dispatcher
            .dispatch(TransportRequest::new(Method::GET, path))
            .await
            .unwrap();
        assert_eq!(res.headers.get("X-Seen"), Some("1"));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.befores.load(Ordering::SeqCst), 2);
    assert_eq!(
        *recorder.afters.lock().unwrap(),
        vec![
            (200, Some("open".to_string())),
            (403, Some("admin".to_string())),
            (404, None),
        ]
    );
}

#[tokio::test]
async fn test_request_id_reaches_handler() {
    let echo_id = |_req: Request, ctx: RequestContext| async move {
        Ok::<_, HandlerError>(Response::ok(ctx.request_id().to_string()))
    };
    let registry = EndpointRegistry::new()
        .with_endpoint(Endpoint::builder(Method::GET, "/id").handler(echo_id).unwrap());
    let dispatcher = dispatcher_for(registry, RuntimeConfig::default());

    let id = RequestId::new();
    let req = TransportRequest::new(Method::GET, "/id").header("x-request-id", id.to_string());
    let res = dispatcher.dispatch(req).await.unwrap();
    assert_eq!(body_text(res).await, id.to_string());

    let req = TransportRequest::new(Method::GET, "/id").header("X-Request-Id", "not-a-ulid");
    let res = dispatcher.dispatch(req).await.unwrap();
    let generated = body_text(res).await;
    assert!(generated.parse::<RequestId>().is_ok());
}

#[tokio::test]
async fn test_reload_swaps_table() {
    let dispatcher = pets();
    let res = dispatcher
        .dispatch(TransportRequest::new(Method::GET, "/owners"))
        .await
        .unwrap();
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let table = EndpointRegistry::new()
        .with_endpoint(endpoint(Method::GET, "/owners", &[], &[], "owners"))
        .build()
        .unwrap();
    dispatcher.reload(table);
    assert_eq!(dispatcher.table().endpoint_count(), 1);

    let res = dispatcher
        .dispatch(TransportRequest::new(Method::GET, "/owners"))
        .await
        .unwrap();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(body_text(res).await, "owners");

    let res = dispatcher
        .dispatch(TransportRequest::new(Method::GET, "/pets"))
        .await
        .unwrap();
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
