use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use trailhead::config::load_config;
use trailhead::hot_reload::{reload_routes, watch_routes};
use trailhead::http::Request;

const TABLE_V1: &str = r#"
routes:
  - name: foo
    methods: [GET]
    path: /foo
    handler: Foo@one
"#;

const TABLE_V2: &str = r#"
routes:
  - name: foo
    methods: [GET]
    path: /foo/{id:INT}
    handler: Foo@two
"#;

const TABLE_BROKEN: &str = r#"
routes:
  - name: foo
    path: /foo/{id
    handler: Foo@two
"#;

fn write_table(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("routes.yaml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_reload_swaps_router() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_table(&dir, TABLE_V1);
    let router = ArcSwap::from_pointee(load_config(&path).unwrap().build_router().unwrap());
    assert!(router.load().find(&Request::get("/foo")).is_some());

    std::fs::write(&path, TABLE_V2).unwrap();
    let table = reload_routes(&path, &router).unwrap();
    assert_eq!(table.routes[0].handler, "Foo@two");
    assert!(router.load().find(&Request::get("/foo")).is_none());
    assert!(router.load().find(&Request::get("/foo/3")).is_some());
}

#[test]
fn test_invalid_table_keeps_previous_router() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_table(&dir, TABLE_V1);
    let router = ArcSwap::from_pointee(load_config(&path).unwrap().build_router().unwrap());
    let before = router.load_full();

    std::fs::write(&path, TABLE_BROKEN).unwrap();
    assert!(reload_routes(&path, &router).is_err());
    assert!(Arc::ptr_eq(&before, &router.load_full()));
    assert!(router.load().find(&Request::get("/foo")).is_some());
}

#[test]
fn test_watch_routes_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_table(&dir, TABLE_V1);
    let router = Arc::new(ArcSwap::from_pointee(
        load_config(&path).unwrap().build_router().unwrap(),
    ));

    let updates: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let updates_clone = Arc::clone(&updates);
    let watcher = watch_routes(&path, Arc::clone(&router), move |table| {
        let handlers = table.routes.iter().map(|r| r.handler.clone());
        updates_clone.lock().unwrap().extend(handlers);
    })
    .expect("watch_routes");

    // allow watcher thread to start
    std::thread::sleep(Duration::from_millis(100));

    std::fs::write(&path, TABLE_V2).unwrap();

    for _ in 0..40 {
        if updates.lock().unwrap().iter().any(|h| h == "Foo@two") {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    assert!(updates.lock().unwrap().iter().any(|h| h == "Foo@two"));
    assert!(router.load().find(&Request::get("/foo/9")).is_some());
    drop(watcher);
}
