//! session-gate binary entry point.
//!
//! Each run is one "app launch": restore the persisted session, run one
//! command against it, let the navigation guard settle, and print where
//! the user ends up.

use std::process::ExitCode;
use std::sync::Arc;

use session_gate::cli::{self, Command};
use session_gate::config::Config;
use session_gate::{
    logging, GuardView, MockBackend, NavigationGuard, Navigator, Router, SessionManager,
    SessionStore,
};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("run 'session-gate --help' for usage");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    let _ = logging::try_init_with(config.log_filter());
    info!("session-gate v{}", env!("CARGO_PKG_VERSION"));

    match run(&args.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: &Command, config: &Config) -> session_gate::Result<()> {
    let store = SessionStore::file(&config.storage.path);
    let backend = Arc::new(MockBackend::new(config.to_mock_config()));
    let manager = SessionManager::new(store, backend);

    let router = Arc::new(Router::mounted_at(config.home_route()));
    let mut guard = NavigationGuard::new(router.clone(), config.login_route());

    // The guard must not decide anything before startup settles.
    settle(&mut guard, &manager, &router);

    let status = manager.initialize().await;
    info!(%status, store = %config.storage.path.display(), "session initialized");
    settle(&mut guard, &manager, &router);

    let outcome = match command {
        Command::Status => Ok(()),
        Command::SignIn { email, password } => manager.sign_in(email, password).await,
        Command::Register { email, password } => manager.register(email, password).await,
        Command::SignOut => manager.sign_out().await,
        Command::Refresh => {
            manager.refresh_user().await;
            Ok(())
        }
        Command::Expire => manager.token_expired().await,
    };

    if outcome.is_ok() && matches!(command, Command::SignIn { .. } | Command::Register { .. }) {
        router.replace(&config.home_route());
    }

    let view = settle(&mut guard, &manager, &router);
    report(&manager, &router, view);
    outcome
}

/// Evaluate the guard until the route stops changing.
fn settle(guard: &mut NavigationGuard, manager: &SessionManager, router: &Router) -> GuardView {
    let mut route = router.current();
    loop {
        let view = guard.evaluate(manager.status(), &route);
        let next = router.current();
        if next == route {
            debug!(?view, %route, "guard settled");
            return view;
        }
        route = next;
    }
}

fn report(manager: &SessionManager, router: &Router, view: GuardView) {
    let snapshot = manager.snapshot();
    println!("status: {}", snapshot.status);
    match &snapshot.user {
        Some(user) => println!("user:   {}", user.email),
        None => println!("user:   -"),
    }
    println!("route:  {}", router.current());
    println!(
        "view:   {}",
        match view {
            GuardView::Loading => "loading",
            GuardView::Blank => "blank",
            GuardView::Content => "content",
        }
    );
}
