use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use waypoint::handlers::handler_fn;
use waypoint::middleware::{
    from_fn, AuthMiddleware, CorsMiddleware, MetricsMiddleware, TracingMiddleware,
    AUTHENTICATED_ATTRIBUTE,
};
use waypoint::{Middleware, Next, Params, Request, Response, Router, RouterError};

mod common;
use common::handlers::reply;
use common::tracing_util::TestTracing;

/// Appends `tag.before` to the body on the way in (through a request
/// attribute) and `tag.after` to the response on the way out.
struct Layer {
    tag: &'static str,
}

impl Middleware for Layer {
    fn handle(&self, req: &mut Request, next: Next<'_>) -> anyhow::Result<Response> {
        let mut trail = req
            .attribute("trail")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        trail.push_str(&format!("{}.before ", self.tag));
        req.set_attribute("trail", trail);
        let mut res = next.run(req)?;
        res.write(format!(" {}.after", self.tag));
        Ok(res)
    }
}

fn terminal_echoing_trail(
) -> impl Fn(&mut Request, &Params) -> anyhow::Result<Response> + Send + Sync + 'static {
    |req, _params| {
        let trail = req
            .attribute("trail")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(Response::text(200, format!("{trail}T")))
    }
}

#[test]
fn test_onion_ordering() {
    let mut router = Router::new();
    router.get("/", terminal_echoing_trail()).unwrap();
    router.use_middleware(Layer { tag: "A" });
    router.use_middleware(Layer { tag: "B" });
    let app = router.build();

    let res = app.dispatch(Request::new("GET", "/")).unwrap();
    assert_eq!(res.body_string(), "A.before B.before T B.after A.after");
}

#[test]
fn test_onion_wraps_fallback_terminal_too() {
    let mut router = Router::new();
    router.use_middleware(from_fn(|req, next| {
        let mut res = next.run(req)?;
        res.set_header("x-wrapped", "yes");
        Ok(res)
    }));
    let res = router.build().dispatch(Request::new("GET", "/missing")).unwrap();
    assert_eq!(res.status, 404);
    assert_eq!(res.header("x-wrapped"), Some("yes"));
}

#[test]
fn test_short_circuit_skips_later_stages_and_handler() {
    let reached = Arc::new(AtomicUsize::new(0));
    let handler_hits = Arc::clone(&reached);
    let stage_hits = Arc::clone(&reached);

    let mut router = Router::new();
    router
        .get(
            "/",
            handler_fn(move |_req, _params| {
                handler_hits.fetch_add(1, Ordering::SeqCst);
                Ok(Response::ok())
            }),
        )
        .unwrap();
    router.use_middleware(from_fn(|_req, _next| Ok(Response::text(403, "stop"))));
    router.use_middleware(from_fn(move |req, next| {
        stage_hits.fetch_add(1, Ordering::SeqCst);
        next.run(req)
    }));
    let res = router.build().dispatch(Request::new("GET", "/")).unwrap();

    assert_eq!(res.status, 403);
    assert_eq!(reached.load(Ordering::SeqCst), 0);
}

#[test]
fn test_middleware_error_aborts_pipeline() {
    let mut router = Router::new();
    router.get("/", reply("never")).unwrap();
    router.use_middleware(from_fn(|_req, _next| anyhow::bail!("middleware failed")));
    let err = router.build().dispatch(Request::new("GET", "/")).unwrap_err();
    assert_eq!(err.to_string(), "middleware failed");
}

#[test]
fn test_terminal_ignores_its_continuation() {
    let remaining = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&remaining);
    let mut router = Router::new();
    router.get("/", reply("ok")).unwrap();
    router.use_middleware(from_fn(move |req, next| {
        seen.lock().unwrap().push(next.remaining());
        next.run(req)
    }));
    let res = router.build().dispatch(Request::new("GET", "/")).unwrap();
    assert_eq!(res.body_string(), "ok");
    assert_eq!(*remaining.lock().unwrap(), vec![1]);
}

#[test]
fn test_auth_middleware_gates_and_marks_request() {
    let mut router = Router::new();
    router
        .get(
            "/secret",
            handler_fn(|req, _params| {
                let authed = req
                    .attribute(AUTHENTICATED_ATTRIBUTE)
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                Ok(Response::text(200, format!("authenticated={authed}")))
            }),
        )
        .unwrap();
    router.use_middleware(AuthMiddleware::new("Bearer secret"));
    let app = router.build();

    let denied = app.dispatch(Request::new("GET", "/secret")).unwrap();
    assert_eq!(denied.status, 401);

    let allowed = app
        .dispatch(Request::new("GET", "/secret").with_header("Authorization", "Bearer secret"))
        .unwrap();
    assert_eq!(allowed.body_string(), "authenticated=true");
}

#[test]
fn test_cors_preflight_and_simple_request() {
    let mut router = Router::new();
    router.get("/data", reply("data")).unwrap();
    router.use_middleware(CorsMiddleware::default());
    let app = router.build();

    let preflight = app
        .dispatch(
            Request::new("OPTIONS", "/data")
                .with_header("Origin", "https://example.com")
                .with_header("Access-Control-Request-Method", "GET"),
        )
        .unwrap();
    assert_eq!(preflight.status, 204);
    assert!(preflight.header("access-control-allow-methods").is_some());

    let simple = app
        .dispatch(Request::new("GET", "/data").with_header("Origin", "https://example.com"))
        .unwrap();
    assert_eq!(simple.header("access-control-allow-origin"), Some("*"));
    assert_eq!(simple.body_string(), "data");
}

#[test]
fn test_metrics_and_tracing_observe_every_request() {
    let _tracing = TestTracing::init();

    struct Shared(Arc<MetricsMiddleware>);
    impl Middleware for Shared {
        fn handle(&self, req: &mut Request, next: Next<'_>) -> anyhow::Result<Response> {
            self.0.handle(req, next)
        }
    }

    let metrics = Arc::new(MetricsMiddleware::new());
    let mut router = Router::new();
    router.get("/ok", reply("ok")).unwrap();
    router.use_middleware(TracingMiddleware);
    router.use_middleware(Shared(Arc::clone(&metrics)));
    let app = router.build();

    app.dispatch(Request::new("GET", "/ok")).unwrap();
    app.dispatch(Request::new("GET", "/ok")).unwrap();
    app.dispatch(Request::new("GET", "/missing")).unwrap();

    assert_eq!(metrics.request_count(), 3);
    assert_eq!(metrics.status_class_count(2), 2);
    assert_eq!(metrics.status_class_count(4), 1);
}

#[test]
fn test_pipeline_exhausted_when_stage_runs_past_the_end() {
    use waypoint::Pipeline;

    let mut pipeline = Pipeline::new();
    pipeline.push(Arc::new(from_fn(|req, next| next.run(req))));
    let err = pipeline
        .execute(&mut Request::new("GET", "/"))
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<RouterError>(),
        Some(&RouterError::PipelineExhausted)
    );
}

#[test]
fn test_app_shared_across_threads() {
    let counter = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&counter);

    let mut router = Router::new();
    router
        .get(
            "/n/{n:\\d+}",
            handler_fn(move |_req, params| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(Response::text(200, params.get("n").unwrap_or_default()))
            }),
        )
        .unwrap();
    router.use_middleware(Layer { tag: "A" });
    let app = Arc::new(router.build());

    let workers: Vec<_> = (0..8)
        .map(|t| {
            let app = Arc::clone(&app);
            thread::spawn(move || {
                for i in 0..50 {
                    let n = t * 100 + i;
                    let res = app.dispatch(Request::new("GET", &format!("/n/{n}"))).unwrap();
                    assert_eq!(res.body_string(), format!("{n} A.after"));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 400);
}
