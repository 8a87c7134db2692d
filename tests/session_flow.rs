//! Session lifecycle integration tests.
//!
//! Each "launch" builds a fresh manager over the same storage file, the
//! way an app process would after a restart.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::watch;
use tokio_test::{assert_err, assert_ok};

use session_gate::auth::{MOCK_TOKEN, TEST_EMAIL, TEST_PASSWORD};
use session_gate::{
    AuthBackend, AuthResponse, GuardView, MockBackend, MockConfig, NavigationGuard, Navigator,
    Route, Router, SessionError, SessionManager, SessionStatus, SessionStore, StorageSlot, Token,
};

/// Mock backend that counts how often it is called.
struct CountingBackend {
    inner: MockBackend,
    calls: AtomicUsize,
}

impl CountingBackend {
    fn new() -> Self {
        Self {
            inner: MockBackend::new(MockConfig::instant()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthBackend for CountingBackend {
    async fn authenticate(&self, email: &str, password: &str) -> session_gate::Result<AuthResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.authenticate(email, password).await
    }

    async fn register(&self, email: &str, password: &str) -> session_gate::Result<AuthResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.register(email, password).await
    }
}

struct Launch {
    manager: SessionManager,
    backend: Arc<CountingBackend>,
    store: SessionStore,
}

async fn launch(path: &Path) -> Launch {
    let backend = Arc::new(CountingBackend::new());
    let store = SessionStore::file(path);
    let manager = SessionManager::new(store.clone(), backend.clone());
    manager.initialize().await;
    Launch {
        manager,
        backend,
        store,
    }
}

fn store_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("session.json")
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_sign_in_with_test_account() {
    let dir = TempDir::new().unwrap();
    let app = launch(&store_path(&dir)).await;
    assert_eq!(app.manager.status(), SessionStatus::Unauthenticated);

    assert_ok!(app.manager.sign_in(TEST_EMAIL, TEST_PASSWORD).await);

    assert_eq!(app.manager.status(), SessionStatus::Authenticated);
    assert_eq!(app.manager.snapshot().token, Some(Token::new(MOCK_TOKEN)));
    assert_eq!(app.store.get_token().await, Some(Token::new(MOCK_TOKEN)));
    assert_eq!(app.store.get_user().await.unwrap().email, TEST_EMAIL);
}

#[tokio::test]
async fn test_sign_in_with_wrong_password() {
    let dir = TempDir::new().unwrap();
    let app = launch(&store_path(&dir)).await;

    let err = assert_err!(app.manager.sign_in(TEST_EMAIL, "wrong").await);
    assert!(matches!(err, SessionError::InvalidCredentials));
    assert!(err.is_user_correctable());

    assert_eq!(app.manager.status(), SessionStatus::Unauthenticated);
    assert!(app.store.get(StorageSlot::AccessToken).await.is_none());
    assert!(app.store.get(StorageSlot::AuthUser).await.is_none());
}

#[tokio::test]
async fn test_restart_restores_session_without_backend() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let first = launch(&path).await;
    assert_ok!(first.manager.sign_in(TEST_EMAIL, TEST_PASSWORD).await);
    let before = first.manager.snapshot();
    drop(first);

    let second = launch(&path).await;
    assert_eq!(second.manager.status(), SessionStatus::Authenticated);
    assert_eq!(second.manager.snapshot(), before);
    assert_eq!(second.backend.calls(), 0);
}

#[tokio::test]
async fn test_sign_out_after_sign_in() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let app = launch(&path).await;
    assert_ok!(app.manager.sign_in(TEST_EMAIL, TEST_PASSWORD).await);

    assert_ok!(app.manager.sign_out().await);
    assert_eq!(app.manager.status(), SessionStatus::Unauthenticated);
    assert!(app.store.get(StorageSlot::AccessToken).await.is_none());
    assert!(app.store.get(StorageSlot::AuthUser).await.is_none());

    assert_ok!(app.manager.sign_out().await);
    assert_eq!(app.manager.status(), SessionStatus::Unauthenticated);

    drop(app);
    let next = launch(&path).await;
    assert_eq!(next.manager.status(), SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn test_register_persists_across_restart() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let first = launch(&path).await;
    assert_ok!(first.manager.register("new@example.com", "Secret99").await);
    drop(first);

    let second = launch(&path).await;
    assert_eq!(second.manager.user().unwrap().email, "new@example.com");
}

// ============================================================================
// Self-healing startup
// ============================================================================

#[tokio::test]
async fn test_corrupt_storage_file_heals() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    std::fs::write(&path, "\u{0}\u{1}garbage").unwrap();

    let app = launch(&path).await;
    assert_eq!(app.manager.status(), SessionStatus::Unauthenticated);

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(stored, serde_json::json!({}));
}

#[tokio::test]
async fn test_corrupt_user_record_heals() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    std::fs::write(
        &path,
        r#"{"accessToken":"mock-token-123","authUser":"{\"mail\":1}"}"#,
    )
    .unwrap();

    let app = launch(&path).await;
    assert_eq!(app.manager.status(), SessionStatus::Unauthenticated);
    assert!(app.store.get(StorageSlot::AccessToken).await.is_none());
    assert!(app.store.get(StorageSlot::AuthUser).await.is_none());
}

// ============================================================================
// Guard wiring
// ============================================================================

async fn wait_for(rx: &mut watch::Receiver<GuardView>, want: GuardView) {
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|v| *v == want))
        .await
        .expect("guard view timed out")
        .expect("guard stopped");
}

#[tokio::test]
async fn test_guard_follows_manager() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(CountingBackend::new());
    let manager = Arc::new(SessionManager::new(
        SessionStore::file(store_path(&dir)),
        backend,
    ));

    let home = Route::new("/(tabs)");
    let login = Route::new("/login");
    let router = Arc::new(Router::mounted_at(home.clone()));
    let guard = NavigationGuard::new(router.clone(), login.clone());
    let (mut view, _task) = guard.spawn(manager.subscribe(), router.subscribe());

    // Nothing happens before startup settles.
    tokio::task::yield_now().await;
    assert_eq!(*view.borrow(), GuardView::Loading);
    assert_eq!(router.current(), home);

    manager.initialize().await;
    wait_for(&mut view, GuardView::Content).await;
    assert_eq!(router.current(), login);

    assert_ok!(manager.sign_in(TEST_EMAIL, TEST_PASSWORD).await);
    router.replace(&home);
    tokio::time::timeout(Duration::from_secs(2), async {
        while router.current() != home || *view.borrow() != GuardView::Content {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("guard did not settle on home");

    assert_ok!(manager.sign_out().await);
    tokio::time::timeout(Duration::from_secs(2), async {
        while router.current() != login {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("guard did not redirect after sign-out");

    // Redirects replace history entries instead of stacking them.
    assert_eq!(router.history(), vec![login]);
}

#[tokio::test]
async fn test_sign_in_queued_behind_initialize() {
    let dir = TempDir::new().unwrap();
    let manager = Arc::new(SessionManager::new(
        SessionStore::file(store_path(&dir)),
        Arc::new(CountingBackend::new()),
    ));

    let init = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.initialize().await })
    };
    // Let startup take the lock before signing in.
    tokio::task::yield_now().await;

    assert_ok!(manager.sign_in(TEST_EMAIL, TEST_PASSWORD).await);
    assert_eq!(init.await.unwrap(), SessionStatus::Unauthenticated);
    assert!(manager.is_authenticated());
}
