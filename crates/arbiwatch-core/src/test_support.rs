//! In-memory transport for driving fetchers, the aggregator and the
//! scheduler without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::sources::{FetchError, HttpTransport};

type Scripted = Result<Value, FetchError>;

#[derive(Default)]
struct Route {
    queued: VecDeque<Scripted>,
    standing: Option<Scripted>,
    delay: Option<Duration>,
    bearers: Vec<Option<String>>,
    active: usize,
    max_active: usize,
}

/// Scripted transport. Unscripted paths answer with HTTP 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, Route>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_route<R>(&self, path: &str, f: impl FnOnce(&mut Route) -> R) -> R {
        let mut routes = self.routes.lock().unwrap();
        f(routes.entry(path.to_string()).or_default())
    }

    /// Answer every request to `path` with `response`.
    pub fn respond(&self, path: &str, response: Scripted) {
        self.with_route(path, |route| route.standing = Some(response));
    }

    /// Answer the next request to `path` with `response`, before the standing one.
    pub fn respond_once(&self, path: &str, response: Scripted) {
        self.with_route(path, |route| route.queued.push_back(response));
    }

    /// Hold every response to `path` for `delay` (tokio time).
    pub fn set_delay(&self, path: &str, delay: Duration) {
        self.with_route(path, |route| route.delay = Some(delay));
    }

    pub fn calls(&self, path: &str) -> usize {
        self.with_route(path, |route| route.bearers.len())
    }

    pub fn bearers(&self, path: &str) -> Vec<Option<String>> {
        self.with_route(path, |route| route.bearers.clone())
    }

    /// Highest number of simultaneously outstanding requests seen for `path`.
    pub fn max_concurrent(&self, path: &str) -> usize {
        self.with_route(path, |route| route.max_active)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get_json(&self, path: &str, bearer: Option<&str>) -> Result<Value, FetchError> {
        let delay = self.with_route(path, |route| {
            route.bearers.push(bearer.map(str::to_string));
            route.active += 1;
            route.max_active = route.max_active.max(route.active);
            route.delay
        });

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.with_route(path, |route| {
            route.active -= 1;
            route
                .queued
                .pop_front()
                .or_else(|| route.standing.clone())
                .unwrap_or(Err(FetchError::HttpStatus { status: 404 }))
        })
    }
}
