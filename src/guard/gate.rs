//! Session-aware navigation gate.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{Navigator, Route};
use crate::session::{SessionSnapshot, SessionStatus};

/// What the gated area should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardView {
    /// Neutral loading indicator; no decision has been made.
    #[default]
    Loading,
    /// Nothing, while a redirect to the login route is in flight.
    Blank,
    /// The protected children.
    Content,
}

/// Redirects signed-out users to the login route.
///
/// The guard never navigates while the session is still loading or the
/// router has not mounted, and issues at most one redirect until either
/// the status changes or the login route is reached.
pub struct NavigationGuard {
    navigator: Arc<dyn Navigator>,
    login: Route,
    last_status: SessionStatus,
    redirect_pending: bool,
}

impl NavigationGuard {
    /// Create a guard redirecting to `login`.
    pub fn new(navigator: Arc<dyn Navigator>, login: Route) -> Self {
        Self {
            navigator,
            login,
            last_status: SessionStatus::Uninitialized,
            redirect_pending: false,
        }
    }

    /// The login entry point.
    pub fn login_route(&self) -> &Route {
        &self.login
    }

    /// Whether a redirect has been issued and not yet observed.
    pub fn redirect_pending(&self) -> bool {
        self.redirect_pending
    }

    /// Decide what to render for the given status and route, redirecting
    /// if needed. Safe to call any number of times.
    pub fn evaluate(&mut self, status: SessionStatus, route: &Route) -> GuardView {
        if status != self.last_status {
            debug!(from = %self.last_status, to = %status, "guard saw status change");
            self.last_status = status;
            self.redirect_pending = false;
        }

        if status.is_pending() {
            return GuardView::Loading;
        }

        if status == SessionStatus::Authenticated || route.same_root(&self.login) {
            self.redirect_pending = false;
            return GuardView::Content;
        }

        if route.is_mounted() && !self.redirect_pending {
            info!(from = %route, to = %self.login, "redirecting to login");
            self.redirect_pending = true;
            self.navigator.replace(&self.login);
        }

        GuardView::Blank
    }

    /// Re-evaluate on every session or route change until either channel
    /// closes, publishing each view on `view`.
    pub async fn run(
        mut self,
        mut session: watch::Receiver<SessionSnapshot>,
        mut routes: watch::Receiver<Route>,
        view: watch::Sender<GuardView>,
    ) {
        loop {
            let status = session.borrow_and_update().status;
            let route = routes.borrow_and_update().clone();

            let next = self.evaluate(status, &route);
            view.send_if_modified(|current| {
                if *current == next {
                    false
                } else {
                    *current = next;
                    true
                }
            });

            tokio::select! {
                changed = session.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = routes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("guard stopped");
    }

    /// Run the guard on a background task.
    ///
    /// Returns a receiver of rendered views and the task handle.
    pub fn spawn(
        self,
        session: watch::Receiver<SessionSnapshot>,
        routes: watch::Receiver<Route>,
    ) -> (watch::Receiver<GuardView>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(GuardView::Loading);
        let handle = tokio::spawn(self.run(session, routes, tx));
        (rx, handle)
    }
}

impl fmt::Debug for NavigationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationGuard")
            .field("login", &self.login)
            .field("last_status", &self.last_status)
            .field("redirect_pending", &self.redirect_pending)
            .finish_non_exhaustive()
    }
}
