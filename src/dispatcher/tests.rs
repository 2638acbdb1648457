use super::{DispatchOutcome, Dispatcher, DispatcherOptions};
use crate::binder::BindingPolicy;
use crate::error::{ErrorKind, HookStage, RouteError};
use crate::handler::{handler_fn, HandlerRef, Signature};
use crate::http::{Request, Response};
use crate::middleware::middleware_fn;
use crate::pattern::MatchTypes;
use crate::router::{RouteOptions, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn router() -> Router {
    Router::with_match_types(Arc::new(MatchTypes::with_builtins()))
}

fn echo_args() -> Arc<dyn crate::handler::Handler> {
    handler_fn("echo", Signature::new().param("id"), |_, args| {
        Ok(Response::ok(Value::Array(args)))
    })
}

fn failing() -> Arc<dyn crate::handler::Handler> {
    handler_fn("failing", Signature::new(), |_, _| anyhow::bail!("database unavailable"))
}

#[test]
fn test_lifecycle_runs_in_order() {
    let log = Arc::new(Mutex::new(Vec::<String>::new()));
    let mut router = router();

    let (l1, l2, l3, l4) = (log.clone(), log.clone(), log.clone(), log.clone());
    let handler = handler_fn("show", Signature::new(), move |_, _| {
        l3.lock().unwrap().push("handler".into());
        Ok(Response::ok(json!("ok")))
    });
    router
        .get("/users/{id:INT}", handler)
        .before(move |_, _| {
            l1.lock().unwrap().push("before".into());
            Ok(())
        })
        .middleware(middleware_fn("mw", move |ctx, next| {
            l2.lock().unwrap().push("middleware".into());
            next.run(ctx)
        }))
        .after(move |_, ctx| {
            l4.lock().unwrap().push(format!("after:{}", ctx.response.status));
            Ok(())
        });

    let outcome = Dispatcher::new()
        .dispatch(&router, Request::get("/users/9"))
        .unwrap();
    assert!(outcome.is_matched());
    assert_eq!(
        *log.lock().unwrap(),
        vec!["before", "middleware", "handler", "after:200"]
    );
}

#[test]
fn test_captures_bind_to_handler_parameters() {
    let mut router = router();
    router.get("/users/{id:INT}", echo_args());
    let outcome = Dispatcher::new()
        .dispatch(&router, Request::get("/users/42"))
        .unwrap();
    assert_eq!(outcome.into_response().body, json!(["42"]));
}

#[test]
fn test_extra_args_follow_captures() {
    let mut router = router();
    let handler = handler_fn("pair", Signature::new().param("id").param("user"), |_, args| {
        Ok(Response::ok(Value::Array(args)))
    });
    router.get("/users/{id}", handler);
    let outcome = Dispatcher::new()
        .dispatch_with_args(&router, Request::get("/users/7"), vec![json!({"name": "ann"})])
        .unwrap();
    assert_eq!(outcome.into_response().body, json!(["7", {"name": "ann"}]));
}

#[test]
fn test_method_mismatch_is_not_found() {
    let mut router = router();
    router.get("/users", echo_args());
    let outcome = Dispatcher::new()
        .dispatch(&router, Request::post("/users"))
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::NotFound);
    assert_eq!(outcome.into_response().status, 404);
}

#[test]
fn test_error_hooks_run_newest_first() {
    let order = Arc::new(Mutex::new(Vec::<&str>::new()));
    let (o1, o2) = (order.clone(), order.clone());
    let mut router = router();
    router
        .get("/boom", failing())
        .on_error(move |_, _, _| {
            o1.lock().unwrap().push("h1");
            Ok(Some(Response::error(502, "from h1")))
        })
        .on_error(move |_, _, err| {
            o2.lock().unwrap().push("h2");
            assert_eq!(err.kind(), ErrorKind::HandlerFailure);
            Ok(Some(Response::error(503, "from h2")))
        });

    let response = Dispatcher::new()
        .dispatch(&router, Request::get("/boom"))
        .unwrap()
        .into_response();
    assert_eq!(*order.lock().unwrap(), vec!["h2", "h1"]);
    assert_eq!(response.status, 503);
}

#[test]
fn test_error_hooks_without_response_yield_500() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let mut router = router();
    router
        .get("/boom", failing())
        .on_error(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        })
        .on_error(|_, _, _| anyhow::bail!("hook itself failed"));

    let response = Dispatcher::new()
        .dispatch(&router, Request::get("/boom"))
        .unwrap()
        .into_response();
    assert_eq!(response.status, 500);
    assert_eq!(response.body["kind"], json!("handler_failure"));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failure_without_error_hooks_is_returned() {
    let mut router = router();
    router.get("/boom", failing());
    let err = Dispatcher::new()
        .dispatch(&router, Request::get("/boom"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HandlerFailure);
    assert!(err.to_string().contains("database unavailable"));
}

#[test]
fn test_before_hook_failure_skips_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut router = router();
    router
        .get(
            "/guarded",
            handler_fn("guarded", Signature::new(), move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Response::default())
            }),
        )
        .before(|_, _| anyhow::bail!("not allowed"));

    let err = Dispatcher::new()
        .dispatch(&router, Request::get("/guarded"))
        .unwrap_err();
    assert!(matches!(err, RouteError::Hook { stage: HookStage::Before, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_after_hook_can_replace_response() {
    let mut router = router();
    router
        .get("/users/{id}", echo_args())
        .after(|_, ctx| {
            ctx.response.set_header("x-seen", "yes");
            ctx.response.status = 201;
            Ok(())
        });
    let response = Dispatcher::new()
        .dispatch(&router, Request::get("/users/1"))
        .unwrap()
        .into_response();
    assert_eq!(response.status, 201);
    assert_eq!(response.header("x-seen"), Some("yes"));
}

#[test]
fn test_named_target_resolves_through_namespace() {
    let mut router = router();
    router.register_route(
        &[],
        "/admin/users/{id:INT}",
        HandlerRef::new("Users", "show"),
        RouteOptions::named("admin.users.show").namespace("admin"),
    );
    let mut dispatcher = Dispatcher::new();
    dispatcher.register_handler("admin::Users", "show", echo_args());

    let outcome = dispatcher
        .dispatch(&router, Request::get("/admin/users/3"))
        .unwrap();
    match outcome {
        DispatchOutcome::Matched { route, response } => {
            assert_eq!(route.as_deref(), Some("admin.users.show"));
            assert_eq!(response.body, json!(["3"]));
        }
        DispatchOutcome::NotFound => panic!("expected a match"),
    }
}

#[test]
fn test_unresolved_target_falls_through_to_next_route() {
    let mut router = router();
    router.get("/x/{id}", HandlerRef::new("Missing", "show"));
    router.get("/x/{id}", echo_args());
    let outcome = Dispatcher::new()
        .dispatch(&router, Request::get("/x/5"))
        .unwrap();
    assert_eq!(outcome.into_response().body, json!(["5"]));
}

#[test]
fn test_unresolved_target_alone_is_an_error() {
    let mut router = router();
    router.get("/x/{id}", HandlerRef::new("Missing", "show"));
    let err = Dispatcher::new()
        .dispatch(&router, Request::get("/x/5"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedTarget);
    assert_eq!(err.to_string(), "handler target 'Missing@show' is not registered");
}

#[test]
fn test_unresolved_target_goes_to_error_hooks() {
    let mut router = router();
    router
        .get("/x/{id}", HandlerRef::new("Missing", "show"))
        .on_error(|_, _, err| Ok(Some(Response::error(501, err.kind().as_str()))));
    let response = Dispatcher::new()
        .dispatch(&router, Request::get("/x/5"))
        .unwrap()
        .into_response();
    assert_eq!(response.status, 501);
    assert_eq!(response.body, json!({"error": "unresolved_target"}));
}

#[test]
fn test_broken_template_is_deferred() {
    let mut router = router();
    router.get("/bad/{", echo_args());
    let err = Dispatcher::new()
        .dispatch(&router, Request::get("/bad/1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CompileError);

    router.get("/bad/{id}", echo_args());
    let outcome = Dispatcher::new()
        .dispatch(&router, Request::get("/bad/1"))
        .unwrap();
    assert!(outcome.is_matched());
}

#[test]
fn test_broken_template_leaves_unrelated_paths_not_found() {
    let mut router = router();
    router.get("/admin/{oops", echo_args());
    router.get("/home", handler_fn("home", Signature::new(), |_, _| Ok(Response::ok(json!("home")))));

    let outcome = Dispatcher::new()
        .dispatch(&router, Request::get("/nothing/here"))
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::NotFound);

    let response = Dispatcher::new()
        .dispatch(&router, Request::get("/home"))
        .unwrap()
        .into_response();
    assert_eq!(response.body, json!("home"));

    let err = Dispatcher::new()
        .dispatch(&router, Request::get("/admin/x"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CompileError);
}

#[test]
fn test_broken_route_with_error_hooks_does_not_preempt_later_route() {
    let mut router = router();
    router
        .get("/{oops", echo_args())
        .on_error(|_, _, err| Ok(Some(Response::error(500, err.kind().as_str()))));
    router.get("/home", handler_fn("home", Signature::new(), |_, _| Ok(Response::ok(json!("home")))));

    assert_eq!(router.find(&Request::get("/home")).unwrap().index, 1);
    let response = Dispatcher::new()
        .dispatch(&router, Request::get("/home"))
        .unwrap()
        .into_response();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!("home"));

    // nothing else serves the path, so the broken route's hooks answer
    let response = Dispatcher::new()
        .dispatch(&router, Request::get("/elsewhere"))
        .unwrap()
        .into_response();
    assert_eq!(response.status, 500);
    assert_eq!(response.body, json!({"error": "compile_error"}));
}

#[test]
fn test_anonymous_capture_binds_by_ordinal_name() {
    let mut router = router();
    let handler = handler_fn("second", Signature::new().param("1"), |_, args| {
        Ok(Response::ok(Value::Array(args)))
    });
    router.get("/{name}/{:INT}", handler);
    let response = Dispatcher::new()
        .dispatch(&router, Request::get("/joe/7"))
        .unwrap()
        .into_response();
    assert_eq!(response.body, json!(["7"]));
}

#[test]
fn test_strict_binding_failure_reaches_caller() {
    let mut router = router();
    let handler = handler_fn("needs_two", Signature::new().param("a").param("b"), |_, _| {
        Ok(Response::default())
    });
    router.get("/one/{a}", handler);
    let err = Dispatcher::new()
        .dispatch(&router, Request::get("/one/1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BindingFallback);
}

#[test]
fn test_pass_through_binding_forwards_bag() {
    let mut router = router();
    let handler = handler_fn("needs_two", Signature::new().param("a").param("b"), |_, args| {
        Ok(Response::ok(Value::Array(args)))
    });
    router.get("/one/{x}", handler);
    let dispatcher = Dispatcher::new().with_options(DispatcherOptions {
        binding: BindingPolicy::PassThrough,
        middleware: vec![],
    });
    let response = dispatcher
        .dispatch(&router, Request::get("/one/1"))
        .unwrap()
        .into_response();
    assert_eq!(response.body, json!(["1"]));
}

#[test]
fn test_router_middleware_runs_before_route_middleware() {
    let log = Arc::new(Mutex::new(Vec::<&str>::new()));
    let (l1, l2) = (log.clone(), log.clone());
    let mut router = router();
    router.get("/m", echo_args_free()).middleware(middleware_fn("route", move |ctx, next| {
        l2.lock().unwrap().push("route");
        next.run(ctx)
    }));

    let mut dispatcher = Dispatcher::new();
    dispatcher.use_middleware(middleware_fn("global", move |ctx, next| {
        l1.lock().unwrap().push("global");
        next.run(ctx)
    }));
    dispatcher.dispatch(&router, Request::get("/m")).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["global", "route"]);
}

#[test]
fn test_middleware_short_circuit_skips_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut router = router();
    router
        .get(
            "/s",
            handler_fn("s", Signature::new(), move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Response::default())
            }),
        )
        .middleware(middleware_fn("deny", |_, _| Ok(Response::error(403, "denied"))));

    let response = Dispatcher::new()
        .dispatch(&router, Request::get("/s"))
        .unwrap()
        .into_response();
    assert_eq!(response.status, 403);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_named_middleware_resolves_through_factory() {
    let mut router = router();
    router.get("/m", echo_args_free()).middleware("stamp");

    let factory = |name: &str| -> Option<Arc<dyn crate::middleware::Middleware>> {
        (name == "stamp").then(|| {
            middleware_fn("stamp", |ctx, next| {
                let mut res = next.run(ctx)?;
                res.set_header("x-stamp", "1");
                Ok(res)
            })
        })
    };
    let dispatcher = Dispatcher::new().with_middleware_factory(Arc::new(factory));
    let response = dispatcher
        .dispatch(&router, Request::get("/m"))
        .unwrap()
        .into_response();
    assert_eq!(response.header("x-stamp"), Some("1"));
}

#[test]
fn test_dispatcher_is_shareable_across_threads() {
    let mut router = router();
    router.get("/users/{id:INT}", echo_args());
    let router = Arc::new(router);
    let dispatcher = Arc::new(Dispatcher::new());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let (router, dispatcher) = (router.clone(), dispatcher.clone());
            std::thread::spawn(move || {
                dispatcher
                    .dispatch(&router, Request::get(&format!("/users/{i}")))
                    .unwrap()
                    .into_response()
                    .body
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), json!([i.to_string()]));
    }
}

fn echo_args_free() -> Arc<dyn crate::handler::Handler> {
    handler_fn("free", Signature::new(), |_, args| Ok(Response::ok(Value::Array(args))))
}
