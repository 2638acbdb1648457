//! # Hot Reload Module
//!
//! Live reloading of a route-table file without restarting the process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arc_swap::ArcSwap;
//! use std::sync::Arc;
//! use trailhead::{config, hot_reload::watch_routes};
//!
//! let table = config::load_config("routes.yaml")?;
//! let router = Arc::new(ArcSwap::from_pointee(table.build_router()?));
//!
//! let _watcher = watch_routes("routes.yaml", router.clone(), |table| {
//!     println!("Reloaded {} routes", table.routes.len());
//! })?;
//!
//! // Request threads call `router.load()` for the current table.
//! ```
//!
//! ## Reload Process
//!
//! 1. **Detection** - the watcher sees the file modified or (re)created
//! 2. **Load** - the file is parsed and fully validated
//! 3. **Swap** - a new router is built and stored atomically
//! 4. **Callback** - `on_reload` receives the new table
//!
//! Requests already holding the previous router finish against it.
//!
//! ## Error Handling
//!
//! A file that fails to parse or validate is logged and ignored: the previous
//! router stays active and `on_reload` is not called.

use arc_swap::ArcSwap;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{self, RoutesConfig};
use crate::router::Router;

/// Load `path`, build a router from it and swap it into `router`.
///
/// # Errors
///
/// Any load, validation or build failure; `router` is left untouched.
pub fn reload_routes(path: &Path, router: &ArcSwap<Router>) -> anyhow::Result<RoutesConfig> {
    let table = config::load_config(path)?;
    let next = table.build_router()?;
    let count = next.len();
    router.store(Arc::new(next));
    info!(path = %path.display(), routes = count, "hot-reload: route table applied");
    Ok(table)
}

/// Watch a route-table file and rebuild the [`Router`] when it changes.
///
/// The parent directory is watched so that editors replacing the file
/// (write to temp, rename over) are still noticed. Keep the returned
/// watcher alive for as long as reloading should happen.
///
/// # Errors
///
/// Fails when the watcher cannot be created or the directory watched.
pub fn watch_routes<P, F>(
    path: P,
    router: Arc<ArcSwap<Router>>,
    mut on_reload: F,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
    F: FnMut(&RoutesConfig) + Send + 'static,
{
    let path: PathBuf = path.as_ref().to_path_buf();
    let file_name: Option<OsString> = path.file_name().map(ToOwned::to_owned);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                let ours = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == file_name.as_deref());
                if !ours {
                    return;
                }
                match reload_routes(&watch_path, &router) {
                    Ok(table) => on_reload(&table),
                    Err(e) => warn!(
                        path = %watch_path.display(),
                        error = %format!("{e:#}"),
                        "hot-reload: keeping previous route table"
                    ),
                }
            }
            Err(e) => error!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    info!(path = %path.display(), "hot-reload: watching route table");
    Ok(watcher)
}
