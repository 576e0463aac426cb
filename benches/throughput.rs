use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use waypoint::handlers::handler_fn;
use waypoint::middleware::{from_fn, MetricsMiddleware};
use waypoint::{Request, Response, Router};

fn zoo_router() -> Router {
    let ok = || handler_fn(|_req, _params| Ok(Response::ok()));
    let mut router = Router::new();
    router.get("/", ok()).unwrap();
    router
        .group("/zoo", |zoo| {
            zoo.map(["GET", "POST"], "/animals", ok())?;
            zoo.map(["GET", "PUT", "PATCH", "DELETE"], "/animals/{id:\\d+}", ok())?;
            zoo.get("/animals/{id:\\d+}/toys/{toy_id}", ok())?;
            zoo.get(
                "/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}",
                ok(),
            )?;
            zoo.map(["HEAD", "OPTIONS"], "/health", ok())?;
            Ok(())
        })
        .unwrap();
    router
        .post("/inventory/{warehouse}/feeds/{feed}/items/{item}/batches/{batch}", ok())
        .unwrap();
    router
        .get("/archive[/{year:\\d{4}}[/{month:\\d{2}}]]", ok())
        .unwrap();
    router.get("/files/{name}.{ext:json|xml}", ok()).unwrap();
    router
}

const PATHS: [(&str, &str); 6] = [
    ("GET", "/zoo/animals/123"),
    ("GET", "/zoo/animals/123/toys/456"),
    ("GET", "/zoo/cats/animals/123/habitats/88/sections/5"),
    ("POST", "/inventory/1/feeds/2/items/3/batches/4"),
    ("GET", "/archive/2024/07"),
    ("DELETE", "/zoo/health"),
];

fn bench_resolve(c: &mut Criterion) {
    let app = zoo_router().build();
    c.bench_function("resolve", |b| {
        b.iter(|| {
            for (method, path) in PATHS {
                black_box(app.resolve(method, path));
            }
        })
    });
}

fn bench_dispatch_with_middleware(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_middleware_depth");
    for depth in [0usize, 1, 4, 16] {
        let mut router = zoo_router();
        router.use_middleware(MetricsMiddleware::new());
        for _ in 0..depth {
            router.use_middleware(from_fn(|req, next| next.run(req)));
        }
        let app = router.build();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                for (method, path) in PATHS {
                    black_box(app.dispatch(Request::new(method, path)).ok());
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve, bench_dispatch_with_middleware);
criterion_main!(benches);
