use super::{RouteOptions, Router, RouterOptions};
use crate::error::ErrorKind;
use crate::handler::HandlerRef;
use crate::http::Request;
use crate::pattern::MatchTypes;
use http::Method;
use std::sync::Arc;

const NO_QUERY: &[(&str, &str)] = &[];

fn router() -> Router {
    Router::with_match_types(Arc::new(MatchTypes::with_builtins()))
}

fn target(action: &str) -> HandlerRef {
    HandlerRef::new("Test", action)
}

#[test]
fn test_first_registered_route_wins() {
    let mut router = router();
    router.get("/items/{id:INT}", target("by_id"));
    router.get("/items/{slug}", target("by_slug"));

    let m = router.find(&Request::get("/items/12")).unwrap();
    assert_eq!(m.index, 0);
    let m = router.find(&Request::get("/items/hat")).unwrap();
    assert_eq!(m.index, 1);
}

#[test]
fn test_method_mismatch_is_not_found() {
    let mut router = router();
    router.get("/items", target("list"));
    assert!(router.find(&Request::post("/items")).is_none());
}

#[test]
fn test_method_comparison_ignores_case() {
    let mut router = router();
    router.register_route(
        &[Method::from_bytes(b"get").unwrap()],
        "/x",
        target("x"),
        RouteOptions::default(),
    );
    assert!(router.find(&Request::get("/x")).is_some());
}

#[test]
fn test_empty_method_list_uses_defaults() {
    let mut router = router();
    let route = router.register_route(&[], "/form", target("form"), RouteOptions::default());
    assert_eq!(route.methods(), &[Method::GET, Method::POST]);

    let mut custom = Router::with_match_types(Arc::new(MatchTypes::with_builtins())).with_options(
        RouterOptions {
            default_methods: vec![Method::PUT],
            ..RouterOptions::default()
        },
    );
    let route = custom.register_route(&[], "/form", target("form"), RouteOptions::default());
    assert_eq!(route.methods(), &[Method::PUT]);
}

#[test]
fn test_method_override_header() {
    let mut router = router();
    router.delete("/items/{id}", target("destroy"));

    let req = Request::post("/items/3").with_header("X-HTTP-Method-Override", "DELETE");
    assert!(router.find(&req).is_some());

    let mut plain = Router::with_match_types(Arc::new(MatchTypes::with_builtins())).with_options(
        RouterOptions {
            method_override_header: None,
            ..RouterOptions::default()
        },
    );
    plain.delete("/items/{id}", target("destroy"));
    assert!(plain.find(&req).is_none());
}

#[test]
fn test_filter_change_recompiles() {
    let mut router = router();
    router.get("/u/{id}", target("show"));
    assert!(router.find(&Request::get("/u/abc")).is_some());

    router.route_mut(0).unwrap().filter("id", "[0-9]+");
    assert!(router.find(&Request::get("/u/abc")).is_none());
    assert!(router.find(&Request::get("/u/12")).is_some());
}

#[test]
fn test_registered_match_type_is_used() {
    let router_types = Arc::new(MatchTypes::with_builtins());
    let mut router = Router::with_match_types(router_types);
    router.register_match_type("date", "[0-9]{4}-[0-9]{2}-[0-9]{2}").unwrap();
    router.get("/log/{day:DATE}", target("day"));
    assert!(router.find(&Request::get("/log/2024-01-31")).is_some());
    assert!(router.find(&Request::get("/log/yesterday")).is_none());
    assert_eq!(
        router.register_match_type("bad", "(").unwrap_err().kind(),
        ErrorKind::CompileError
    );
}

#[test]
fn test_broken_route_is_skipped_by_find() {
    let mut router = router();
    router.get("/a/{oops", target("broken"));
    router.get("/a/{ok}", target("fine"));
    let m = router.find(&Request::get("/a/1")).unwrap();
    assert_eq!(m.index, 1);

    let failures = router.compile_all();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 0);
}

#[test]
fn test_route_options_are_applied() {
    let mut router = router();
    let route = router.register_route(
        &[Method::GET],
        "/admin/users",
        target("index"),
        RouteOptions::named("admin.users")
            .namespace("admin")
            .middleware("tracing")
            .middleware("tracing"),
    );
    assert_eq!(route.display_name(), Some("admin.users"));
    assert_eq!(route.namespace_prefix(), Some("admin"));
    assert_eq!(route.middleware_entries().len(), 1);
}

#[test]
fn test_build_uri_by_name() {
    let mut router = router();
    router
        .get("/users/{id:INT}/{tab?}", target("show"))
        .name("users.show");

    let url = router
        .build_uri("users.show", &[("id", "5")][..], "/app", NO_QUERY)
        .unwrap();
    assert_eq!(url, "/app/users/5");

    let url = router
        .build_uri("users.show", &[("id", "5"), ("tab", "posts")][..], "", &[("sort", "new")])
        .unwrap();
    assert_eq!(url, "/users/5/posts?sort=new");
}

#[test]
fn test_build_uri_unknown_name() {
    let router = router();
    let err = router
        .build_uri("nope", NO_QUERY, "", NO_QUERY)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownRoute);
}

#[test]
fn test_any_accepts_every_standard_method() {
    let mut router = router();
    router.any("/ping", target("ping"));
    for method in [Method::GET, Method::PATCH, Method::OPTIONS, Method::HEAD] {
        assert!(router.find(&Request::new(method, "/ping")).is_some());
    }
}

#[test]
fn test_router_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Router>();
}
