use arc_swap::ArcSwap;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use trailhead::handler::HandlerRef;
use trailhead::http::Request;
use trailhead::pattern::{compile, CaptureKey, MatchTypes};
use trailhead::router::{RouteOptions, Router};
use trailhead::url::build_uri;

const NO_QUERY: &[(&str, &str)] = &[];

fn router() -> Router {
    Router::with_match_types(Arc::new(MatchTypes::with_builtins()))
}

fn target(action: &str) -> HandlerRef {
    HandlerRef::new("Pages", action)
}

#[test]
fn test_compile_is_deterministic() {
    let types = MatchTypes::with_builtins();
    let a = compile("/users/{id:INT}/{tab?}", &types.snapshot(), &[]).unwrap();
    let b = compile("/users/{id:INT}/{tab?}", &types.snapshot(), &[]).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.regex().as_str(), b.regex().as_str());
}

#[test]
fn test_int_capture_accepts_digits_only() {
    let mut router = router();
    router.get("/users/{id:INT}", target("show"));

    let m = router.find(&Request::get("/users/42")).unwrap();
    assert_eq!(m.captures.get("id"), Some("42"));
    assert!(router.find(&Request::get("/users/4a")).is_none());
}

#[test]
fn test_optional_segment() {
    let mut router = router();
    router.get("/a/{n:INT?}", target("a"));

    let bare = router.find(&Request::get("/a")).unwrap();
    assert!(bare.captures.is_empty());
    let with = router.find(&Request::get("/a/5")).unwrap();
    assert_eq!(with.captures.get("n"), Some("5"));
    assert!(router.find(&Request::get("/a/")).is_none());
}

#[test]
fn test_lazy_and_greedy_wildcards() {
    let mut router = router();
    router.get("/lazy/{head:*}/{tail:**}", target("lazy"));
    router.get("/greedy/{head:**}/{tail:*}", target("greedy"));

    let lazy = router.find(&Request::get("/lazy/a/b/c")).unwrap();
    assert_eq!(lazy.captures.get("head"), Some("a"));
    assert_eq!(lazy.captures.get("tail"), Some("b/c"));

    let greedy = router.find(&Request::get("/greedy/a/b/c")).unwrap();
    assert_eq!(greedy.captures.get("head"), Some("a/b"));
    assert_eq!(greedy.captures.get("tail"), Some("c"));
}

#[test]
fn test_anonymous_captures_are_positional() {
    let mut router = router();
    router.get("/range/{:INT}/{name}/{:INT}", target("range"));

    let m = router.find(&Request::get("/range/1/x/9")).unwrap();
    let keys: Vec<String> = m.captures.iter().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, vec!["#0", "name", "#2"]);
    assert_eq!(m.captures.get_position(2), Some("9"));
    assert!(matches!(m.captures.iter().next(), Some((CaptureKey::Position(0), "1"))));
}

#[test]
fn test_match_build_match_is_stable() {
    let mut router = router();
    router.get("/files/{dir:**}/{name:STR}.{ext?}", target("file"));

    for path in ["/files/a/b/report.pdf", "/files/x/readme"] {
        let first = router.find(&Request::get(path)).unwrap();
        let rebuilt = build_uri(&first.pattern, &first.captures, "", NO_QUERY);
        assert_eq!(rebuilt, path);

        let second = router.find(&Request::get(&rebuilt)).unwrap();
        assert_eq!(second.index, first.index);
        assert_eq!(second.captures, first.captures);
    }
}

#[test]
fn test_build_uri_keeps_missing_required_tokens() {
    let mut router = router();
    router
        .get("/users/{id:INT}/posts/{post}", target("post"))
        .name("users.post");

    let mut params = HashMap::new();
    params.insert("id".to_string(), "3".to_string());
    let url = router.build_uri("users.post", &params, "", NO_QUERY).unwrap();
    assert_eq!(url, "/users/3/posts/{post}");

    let url = router
        .build_uri("users.post", &params, "/root/", &[("q", "a b&c")])
        .unwrap();
    assert_eq!(url, "/root/users/3/posts/{post}?q=a%20b%26c");
}

#[test]
fn test_override_header_selects_route() {
    let mut router = router();
    router.post("/items/{id}", target("update"));
    router.delete("/items/{id}", target("destroy"));

    let req = Request::post("/items/1").with_header("X-HTTP-Method-Override", "delete");
    assert_eq!(router.effective_method(&req), Method::DELETE);
    assert_eq!(router.find(&req).unwrap().index, 1);
}

#[test]
fn test_named_lookup_finds_first_registration() {
    let mut router = router();
    router.register_route(&[], "/one", target("one"), RouteOptions::named("dup"));
    router.register_route(&[], "/two", target("two"), RouteOptions::named("dup"));
    assert_eq!(router.route_by_name("dup").unwrap().template(), "/one");
}

#[test]
fn test_router_swap_is_visible_to_readers() {
    let mut first = router();
    first.get("/v1", target("v1"));
    let shared = Arc::new(ArcSwap::from_pointee(first));

    let held = shared.load_full();
    let mut second = router();
    second.get("/v2", target("v2"));
    shared.store(Arc::new(second));

    assert!(held.find(&Request::get("/v1")).is_some());
    let current = shared.load();
    assert!(current.find(&Request::get("/v1")).is_none());
    assert!(current.find(&Request::get("/v2")).is_some());
}

#[test]
fn test_concurrent_matching() {
    let mut router = router();
    router.get("/users/{id:INT}", target("show"));
    let router = Arc::new(router);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let router = Arc::clone(&router);
            std::thread::spawn(move || {
                let path = format!("/users/{i}");
                router
                    .find(&Request::get(&path))
                    .and_then(|m| m.captures.get("id").map(str::to_string))
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(i.to_string()));
    }
}
