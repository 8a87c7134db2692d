//! Navigation guard.
//!
//! [`NavigationGuard`] watches the session snapshot and the current
//! [`Route`] and decides whether protected content may render, sending
//! signed-out users to the login route through a [`Navigator`].

mod gate;
mod navigator;
mod route;

pub use gate::{GuardView, NavigationGuard};
pub use navigator::{Navigator, Router};
pub use route::Route;
