//! End-to-end tests of the transform stack.
//!
//! These tests compose outer and inner caller middleware with the fixed
//! stages and check that:
//!
//! 1. Caller middleware sits at the two boundaries only
//! 2. The fixed stages see the request in their documented order
//! 3. Failures short-circuit everything downstream

use async_trait::async_trait;
use http::{Method, StatusCode};
use relay_core::{
    BoxError, ClientError, ClientResult, Credentials, ErrorKind, HttpRequestBuilder, HttpResponse,
    InvocationContext, Region, StaticCredentialsProvider,
};
use relay_middleware::{
    BoxFuture, ErrorDecoder, FnTransform, HttpMiddleware, HttpTransport, Invocation, Middleware,
    Next, NoOpMiddleware, StackConfig, Transform, TransformStack,
};
use std::sync::{Arc, Mutex};

type Events = Arc<Mutex<Vec<String>>>;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TextError(String);

struct TextDecoder;

impl ErrorDecoder for TextDecoder {
    fn decode(&self, response: &HttpResponse) -> Result<BoxError, BoxError> {
        let text = std::str::from_utf8(response.body())?;
        Ok(Box::new(TextError(text.to_string())))
    }
}

struct ScriptedTransport {
    events: Events,
    status: StatusCode,
    seen: Mutex<Vec<HttpRequestBuilder>>,
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(
        &self,
        request: HttpRequestBuilder,
        _ctx: &InvocationContext,
    ) -> ClientResult<HttpResponse> {
        self.events.lock().unwrap().push("transport".to_string());
        self.seen.lock().unwrap().push(request);
        Ok(HttpResponse::new(self.status, "reply"))
    }
}

/// Records entry and exit at whichever level it is installed.
struct Recorder {
    label: &'static str,
    events: Events,
}

impl<In: Send + 'static, Out: Send + 'static> Middleware<In, Out> for Recorder {
    fn name(&self) -> &'static str {
        self.label
    }

    fn handle<'a>(
        &'a self,
        input: In,
        ctx: &'a InvocationContext,
        next: Next<'a, In, Out>,
    ) -> BoxFuture<'a, ClientResult<Out>> {
        Box::pin(async move {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:enter", self.label));
            let result = next.run(input, ctx).await;
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:exit", self.label));
            result
        })
    }
}

struct Harness {
    stack: TransformStack,
    events: Events,
    transport: ScriptedTransport,
}

impl Harness {
    fn new(status: StatusCode) -> Self {
        let events = Events::default();
        let provider = Arc::new(StaticCredentialsProvider::new(Credentials::new(
            "AKID", "secret",
        )));
        let config = StackConfig::new(provider, Region::US_EAST_1, "ExampleSvc", "api.example.com");
        Self {
            stack: TransformStack::new(config, Arc::new(TextDecoder)),
            transport: ScriptedTransport {
                events: events.clone(),
                status,
                seen: Mutex::new(Vec::new()),
            },
            events,
        }
    }

    fn request_transform(&self, fail: bool) -> impl Transform<String, HttpRequestBuilder> {
        let events = self.events.clone();
        FnTransform::new(
            "request",
            move |input: String, _ctx: &InvocationContext| -> ClientResult<HttpRequestBuilder> {
                events.lock().unwrap().push("request_transform".to_string());
                if fail {
                    return Err(ClientError::encoding("input rejected"));
                }
                let mut request = HttpRequestBuilder::new("/things");
                request.set_body(input);
                Ok(request)
            },
        )
    }

    fn response_transform(&self) -> impl Transform<HttpResponse, String> {
        let events = self.events.clone();
        FnTransform::new(
            "response",
            move |response: HttpResponse, _ctx: &InvocationContext| -> ClientResult<String> {
                events.lock().unwrap().push("response_transform".to_string());
                Ok(String::from_utf8_lossy(response.body()).into_owned())
            },
        )
    }

    async fn run(
        &self,
        outer: &dyn Middleware<String, String>,
        inner: &HttpMiddleware,
        fail_encoding: bool,
    ) -> ClientResult<String> {
        let request_transform = self.request_transform(fail_encoding);
        let response_transform = self.response_transform();
        let ctx = InvocationContext::new();

        self.stack
            .execute::<String, String>(
                "payload".to_string(),
                &ctx,
                Invocation {
                    method: Method::POST,
                    endpoint_override: None,
                    request_transform: &request_transform,
                    response_transform: &response_transform,
                    outer,
                    inner,
                    transport: &self.transport,
                },
            )
            .await
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn test_caller_middleware_sits_at_boundaries() {
    let harness = Harness::new(StatusCode::OK);
    let outer = Recorder {
        label: "outer",
        events: harness.events.clone(),
    };
    let inner = Recorder {
        label: "inner",
        events: harness.events.clone(),
    };

    let output = harness.run(&outer, &inner, false).await.unwrap();

    assert_eq!(output, "reply");
    assert_eq!(
        harness.events(),
        vec![
            "outer:enter",
            "request_transform",
            "inner:enter",
            "transport",
            "inner:exit",
            "response_transform",
            "outer:exit",
        ]
    );
}

#[tokio::test]
async fn test_fixed_stages_identical_across_combinations() {
    let mut sent = Vec::new();

    for (with_outer, with_inner) in [(false, false), (true, false), (false, true), (true, true)] {
        let harness = Harness::new(StatusCode::OK);
        let recorder = Recorder {
            label: "caller",
            events: harness.events.clone(),
        };
        let outer: &dyn Middleware<String, String> = if with_outer { &recorder } else { &NoOpMiddleware };
        let inner: &HttpMiddleware = if with_inner { &recorder } else { &NoOpMiddleware };

        harness.run(outer, inner, false).await.unwrap();

        let request = harness.transport.seen.lock().unwrap().remove(0);
        sent.push((
            request.url(),
            request.method().clone(),
            request.header("content-type").map(str::to_string),
            request.header("user-agent").map(str::to_string),
            request.header("authorization").is_some(),
        ));
    }

    assert!(sent.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(sent[0].0, "https://api.example.com:443/things");
}

#[tokio::test]
async fn test_encoding_failure_skips_transport() {
    let harness = Harness::new(StatusCode::OK);
    let inner = Recorder {
        label: "inner",
        events: harness.events.clone(),
    };

    let err = harness
        .run(&NoOpMiddleware, &inner, true)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Encoding);
    assert_eq!(harness.events(), vec!["request_transform"]);
    assert!(harness.transport.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_error_response_never_reaches_response_transform() {
    let harness = Harness::new(StatusCode::NOT_FOUND);
    let outer = Recorder {
        label: "outer",
        events: harness.events.clone(),
    };

    let err = harness
        .run(&outer, &NoOpMiddleware, false)
        .await
        .unwrap_err();

    let service = err.service_error().expect("service error");
    assert_eq!(service.status(), StatusCode::NOT_FOUND);
    assert_eq!(service.payload::<TextError>().map(|e| e.0.as_str()), Some("reply"));
    assert_eq!(
        harness.events(),
        vec!["outer:enter", "request_transform", "transport", "outer:exit"]
    );
}
