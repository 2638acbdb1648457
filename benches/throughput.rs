use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::Value;
use std::hint::black_box;
use trailhead::config::{parse_config, ConfigFormat};
use trailhead::dispatcher::Dispatcher;
use trailhead::handler::{handler_fn, Signature};
use trailhead::http::{Request, Response};
use trailhead::router::Router;

fn example_table() -> &'static str {
    r#"
default_methods: [GET]
match_types:
  SLUG: "[a-z0-9-]+"
routes:
  - name: root
    path: /
    handler: Zoo@root
  - name: animals.index
    methods: [GET, POST]
    path: /zoo/animals
    handler: Animals@index
  - name: animals.show
    methods: [GET, PUT, PATCH, DELETE]
    path: /zoo/animals/{id:INT}
    handler: Animals@show
  - name: animals.toy
    path: /zoo/animals/{id:INT}/toys/{toy_id:INT}
    handler: Toys@show
  - name: habitat.section
    path: /zoo/{category:SLUG}/animals/{id:INT}/habitats/{habitat_id}/sections/{section_id}
    handler: Habitats@section
  - name: batch.create
    methods: [POST]
    path: /inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id}
    handler: Batches@create
  - name: complex
    path: /complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}
    handler: Complex@show
  - name: files
    path: /files/{name:STR}.{ext?}
    handler: Files@show
  - name: health
    methods: [HEAD, OPTIONS]
    path: /zoo/health
    handler: Health@check
"#
}

fn build_router() -> Router {
    let table = parse_config(example_table(), ConfigFormat::Yaml).expect("failed to parse route table");
    let router = table.build_router().expect("failed to build router");
    assert!(router.compile_all().is_empty());
    router
}

fn test_requests() -> Vec<Request> {
    vec![
        Request::get("/zoo/animals/123"),
        Request::get("/zoo/animals/123/toys/456"),
        Request::get("/zoo/cats/animals/123/habitats/88/sections/5"),
        Request::post("/inventory/1/feeds/2/items/3/batches/4"),
        Request::get("/complex/1/2/3/4/5/6/7/8/9"),
        Request::get("/files/report.pdf"),
        Request::get("/does/not/exist"),
    ]
}

fn bench_route_throughput(c: &mut Criterion) {
    let router = build_router();
    let requests = test_requests();
    c.bench_function("route_match", |b| {
        b.iter(|| {
            for req in &requests {
                black_box(router.find(req).map(|m| m.index));
            }
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let router = build_router();
    let mut dispatcher = Dispatcher::new();
    let echo = handler_fn("echo", Signature::new(), |_, args| {
        Ok(Response::ok(Value::Array(args)))
    });
    for (controller, action) in [
        ("Zoo", "root"),
        ("Animals", "index"),
        ("Animals", "show"),
        ("Toys", "show"),
        ("Habitats", "section"),
        ("Batches", "create"),
        ("Complex", "show"),
        ("Files", "show"),
        ("Health", "check"),
    ] {
        dispatcher.register_handler(controller, action, echo.clone());
    }
    let requests = test_requests();
    c.bench_function("dispatch", |b| {
        b.iter(|| {
            for req in &requests {
                black_box(dispatcher.dispatch(&router, req.clone()).is_ok());
            }
        })
    });
}

fn bench_build_uri(c: &mut Criterion) {
    let router = build_router();
    let params = [("category", "cats"), ("id", "123"), ("habitat_id", "88"), ("section_id", "5")];
    c.bench_function("build_uri", |b| {
        b.iter(|| {
            black_box(
                router
                    .build_uri("habitat.section", &params[..], "/api", &[("view", "full")])
                    .is_ok(),
            )
        })
    });
}

criterion_group!(benches, bench_route_throughput, bench_dispatch, bench_build_uri);
criterion_main!(benches);
