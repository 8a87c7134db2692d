//! Navigation targets for the guard.

use std::sync::RwLock;

use tokio::sync::watch;
use tracing::debug;

use super::Route;

/// Something that can move the user to another route.
pub trait Navigator: Send + Sync {
    /// Navigate to `route`, replacing the current history entry.
    fn replace(&self, route: &Route);
}

/// In-memory router with a history stack.
///
/// The current route is published on a watch channel so a guard can
/// re-evaluate whenever it changes.
#[derive(Debug)]
pub struct Router {
    history: RwLock<Vec<Route>>,
    tx: watch::Sender<Route>,
}

impl Router {
    /// Create a router that has not mounted yet.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Route::unmounted());
        Self {
            history: RwLock::new(Vec::new()),
            tx,
        }
    }

    /// Create a router mounted at `route`.
    pub fn mounted_at(route: Route) -> Self {
        let router = Self::new();
        router.push(route);
        router
    }

    /// Receive every route change.
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.tx.subscribe()
    }

    /// Current route.
    pub fn current(&self) -> Route {
        self.tx.borrow().clone()
    }

    /// Copy of the history stack, oldest first.
    pub fn history(&self) -> Vec<Route> {
        self.history.read().map(|h| h.clone()).unwrap_or_default()
    }

    /// Navigate forward, keeping the current entry.
    pub fn push(&self, route: Route) {
        debug!(%route, "push");
        if let Ok(mut history) = self.history.write() {
            history.push(route.clone());
        }
        self.tx.send_replace(route);
    }

    /// Go back one entry. Returns false when there is nothing to go back to.
    pub fn back(&self) -> bool {
        let previous = match self.history.write() {
            Ok(mut history) if history.len() > 1 => {
                history.pop();
                history.last().cloned()
            }
            _ => None,
        };

        match previous {
            Some(route) => {
                debug!(%route, "back");
                self.tx.send_replace(route);
                true
            }
            None => false,
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for Router {
    fn replace(&self, route: &Route) {
        debug!(%route, "replace");
        if let Ok(mut history) = self.history.write() {
            match history.last_mut() {
                Some(last) => *last = route.clone(),
                None => history.push(route.clone()),
            }
        }
        self.tx.send_replace(route.clone());
    }
}
