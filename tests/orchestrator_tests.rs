use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use workboard::auth::Identity;
use workboard::error::ApiError;
use workboard::models::{
    AdminUpdateTodoRequest, CreateArticleRequest, CreateTodoRequest, RegisterUserRequest,
    ReplaceTodoRequest, UpdateArticleRequest, UpdateTodoRequest,
};
use workboard::policy::ListingPolicy;
use workboard::store::{SqliteStore, Store, StoreState, init_schema};
use workboard::{Orchestrator, seed};

// Orchestrator tests run against a real store on an in-memory SQLite
// database: one connection, no external services.

const ADMIN: Identity = Identity {
    user_id: 1,
    is_admin: true,
};
const OWNER: Identity = Identity {
    user_id: 2,
    is_admin: false,
};
const STRANGER: Identity = Identity {
    user_id: 3,
    is_admin: false,
};

async fn fresh_store() -> StoreState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory sqlite");
    init_schema(&pool).await.expect("schema bootstrap failed");
    Arc::new(SqliteStore::new(pool)) as StoreState
}

async fn orchestrator() -> Orchestrator {
    Orchestrator::new(fresh_store().await, ListingPolicy::default())
}

#[tokio::test]
async fn create_fixes_ownership_and_starts_at_version_one() {
    let core = orchestrator().await;
    let todo = core
        .create_todo(
            &OWNER,
            CreateTodoRequest {
                title: "write report".into(),
                description: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(todo.version, 1);
    assert_eq!(todo.created_by_id, OWNER.user_id);
    assert_eq!(todo.updated_by_id, OWNER.user_id);
    assert!(!todo.is_closed);
}

#[tokio::test]
async fn version_increments_by_exactly_one_per_successful_write() {
    let core = orchestrator().await;
    let article = core
        .create_article(
            &OWNER,
            CreateArticleRequest {
                name: "Apple".into(),
                description: "A fruit".into(),
                price: 0.5,
            },
        )
        .await
        .unwrap();
    assert_eq!(article.version, 1);

    let n = 5;
    for i in 0..n {
        core.update_article(
            &OWNER,
            article.id,
            UpdateArticleRequest {
                price: Some(1.0 + i as f64),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let current = core.get_article(&OWNER, article.id).await.unwrap();
    assert_eq!(current.version, 1 + n);
}

#[tokio::test]
async fn update_merges_only_the_provided_fields() {
    let core = orchestrator().await;
    let todo = core
        .create_todo(
            &OWNER,
            CreateTodoRequest {
                title: "original".into(),
                description: Some("keep me".into()),
            },
        )
        .await
        .unwrap();

    let updated = core
        .update_todo(
            &OWNER,
            todo.id,
            UpdateTodoRequest {
                title: Some("renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "renamed");
    assert_eq!(updated.description.as_deref(), Some("keep me"));
    assert_eq!(updated.version, 2);
}

#[tokio::test]
async fn closing_hides_the_todo_from_its_owner_but_not_from_admins() {
    // Scenario: owner closes own todo, then can no longer see it; the
    // closed state remains visible to admins.
    let core = orchestrator().await;
    let todo = core
        .create_todo(
            &OWNER,
            CreateTodoRequest {
                title: "one-way door".into(),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(core.get_todo(&OWNER, todo.id).await.unwrap().version, 1);

    let closed = core
        .update_todo(
            &OWNER,
            todo.id,
            UpdateTodoRequest {
                is_closed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(closed.is_closed);
    assert_eq!(closed.version, 2);

    // Hidden from the owner now, indistinguishable from absent.
    let err = core.get_todo(&OWNER, todo.id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let seen_by_admin = core.get_todo(&ADMIN, todo.id).await.unwrap();
    assert!(seen_by_admin.is_closed);
}

#[tokio::test]
async fn owner_cannot_reopen_but_admin_can() {
    let core = orchestrator().await;
    let todo = core
        .create_todo(
            &OWNER,
            CreateTodoRequest {
                title: "closable".into(),
                description: None,
            },
        )
        .await
        .unwrap();
    core.update_todo(
        &OWNER,
        todo.id,
        UpdateTodoRequest {
            is_closed: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let reopen = UpdateTodoRequest {
        is_closed: Some(false),
        ..Default::default()
    };
    let err = core
        .update_todo(&OWNER, todo.id, reopen.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden));

    let reopened = core.update_todo(&ADMIN, todo.id, reopen).await.unwrap();
    assert!(!reopened.is_closed);
}

#[tokio::test]
async fn stale_replace_conflicts_no_matter_how_often_it_is_replayed() {
    // Scenario: two clients read at the same version; the first replace
    // wins, every later attempt with the stale version conflicts.
    let core = orchestrator().await;
    let todo = core
        .create_todo(
            &OWNER,
            CreateTodoRequest {
                title: "contended".into(),
                description: None,
            },
        )
        .await
        .unwrap();
    let read_version = todo.version;

    let replace = |title: &str| ReplaceTodoRequest {
        id: todo.id,
        version: read_version,
        title: title.into(),
        description: None,
        is_closed: false,
    };

    let winner = core
        .replace_todo(&OWNER, todo.id, replace("client A"))
        .await
        .unwrap();
    assert_eq!(winner.version, read_version + 1);

    for _ in 0..3 {
        let err = core
            .replace_todo(&OWNER, todo.id, replace("client B"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    // The losing writes left no trace.
    let current = core.get_todo(&OWNER, todo.id).await.unwrap();
    assert_eq!(current.title, "client A");
    assert_eq!(current.version, read_version + 1);
}

#[tokio::test]
async fn a_save_holding_a_stale_snapshot_writes_nothing() {
    // Two writers fetch the same row at version 1 and race: the write layer
    // itself refuses the second save, even though both passed the version
    // check at fetch time.
    let store = fresh_store().await;
    let core = Orchestrator::new(store.clone(), ListingPolicy::default());
    let todo = core
        .create_todo(
            &OWNER,
            CreateTodoRequest {
                title: "snapshot".into(),
                description: None,
            },
        )
        .await
        .unwrap();
    let stale = store.get_todo(todo.id).await.unwrap().unwrap();

    core.update_todo(
        &OWNER,
        todo.id,
        UpdateTodoRequest {
            title: Some("winner".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let mut doomed = stale.clone();
    doomed.title = "loser".to_string();
    assert!(store.save_todo(&doomed).await.unwrap().is_none());

    // The losing save left no trace.
    let current = core.get_todo(&OWNER, todo.id).await.unwrap();
    assert_eq!(current.title, "winner");
    assert_eq!(current.version, 2);
}

#[tokio::test]
async fn replace_rejects_a_payload_stating_a_different_id() {
    let core = orchestrator().await;
    let todo = core
        .create_todo(
            &OWNER,
            CreateTodoRequest {
                title: "target".into(),
                description: None,
            },
        )
        .await
        .unwrap();

    let err = core
        .replace_todo(
            &OWNER,
            todo.id,
            ReplaceTodoRequest {
                id: todo.id + 1,
                version: todo.version,
                title: "sneaky".into(),
                description: None,
                is_closed: false,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn update_with_stated_expected_version_is_guarded() {
    let core = orchestrator().await;
    let article = core
        .create_article(
            &OWNER,
            CreateArticleRequest {
                name: "Pen".into(),
                description: "Blue ink".into(),
                price: 1.2,
            },
        )
        .await
        .unwrap();

    // A stale expectation conflicts...
    core.update_article(
        &OWNER,
        article.id,
        UpdateArticleRequest {
            price: Some(1.5),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let err = core
        .update_article(
            &OWNER,
            article.id,
            UpdateArticleRequest {
                price: Some(9.9),
                expected_version: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    // ...while the current one proceeds.
    let updated = core
        .update_article(
            &OWNER,
            article.id,
            UpdateArticleRequest {
                price: Some(9.9),
                expected_version: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.version, 3);
}

#[tokio::test]
async fn remove_is_forbidden_for_the_owner_and_terminal_for_admins() {
    // Scenario: owner remove => Forbidden; admin remove => gone for good.
    let core = orchestrator().await;
    let article = core
        .create_article(
            &OWNER,
            CreateArticleRequest {
                name: "Mug".into(),
                description: "Ceramic".into(),
                price: 4.0,
            },
        )
        .await
        .unwrap();

    let err = core.remove_article(&OWNER, article.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden));

    core.remove_article(&ADMIN, article.id).await.unwrap();
    let err = core.get_article(&ADMIN, article.id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn strangers_are_denied_before_any_write_happens() {
    let core = orchestrator().await;
    let todo = core
        .create_todo(
            &OWNER,
            CreateTodoRequest {
                title: "private".into(),
                description: None,
            },
        )
        .await
        .unwrap();

    let err = core.get_todo(&STRANGER, todo.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden));

    let err = core
        .update_todo(
            &STRANGER,
            todo.id,
            UpdateTodoRequest {
                title: Some("hijacked".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden));

    // No partial writes: the todo is untouched.
    let current = core.get_todo(&OWNER, todo.id).await.unwrap();
    assert_eq!(current.title, "private");
    assert_eq!(current.version, 1);
}

#[tokio::test]
async fn listing_scope_follows_role_and_listing_policy() {
    let store = fresh_store().await;
    let default_core = Orchestrator::new(store.clone(), ListingPolicy::default());
    let inclusive_core = Orchestrator::new(
        store,
        ListingPolicy {
            include_closed: true,
        },
    );

    let open = default_core
        .create_todo(
            &OWNER,
            CreateTodoRequest {
                title: "open".into(),
                description: None,
            },
        )
        .await
        .unwrap();
    let closed = default_core
        .create_todo(
            &OWNER,
            CreateTodoRequest {
                title: "closed".into(),
                description: None,
            },
        )
        .await
        .unwrap();
    default_core
        .update_todo(
            &OWNER,
            closed.id,
            UpdateTodoRequest {
                is_closed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    default_core
        .create_todo(
            &STRANGER,
            CreateTodoRequest {
                title: "someone else's".into(),
                description: None,
            },
        )
        .await
        .unwrap();

    // Default policy: the owner sees only their own open items.
    let mine = default_core.list_todos(&OWNER).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, open.id);

    // Inclusive policy: own closed items appear too.
    let mine = inclusive_core.list_todos(&OWNER).await.unwrap();
    assert_eq!(mine.len(), 2);

    // Admins see everything either way.
    let all = default_core.list_todos(&ADMIN).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn admin_override_flips_status_regardless_of_ownership() {
    let core = orchestrator().await;
    let todo = core
        .create_todo(
            &OWNER,
            CreateTodoRequest {
                title: "forced".into(),
                description: None,
            },
        )
        .await
        .unwrap();

    let err = core
        .admin_update_todo(&OWNER, todo.id, AdminUpdateTodoRequest { is_closed: true })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden));

    let forced = core
        .admin_update_todo(&ADMIN, todo.id, AdminUpdateTodoRequest { is_closed: true })
        .await
        .unwrap();
    assert!(forced.is_closed);
    assert_eq!(forced.updated_by_id, ADMIN.user_id);
}

#[tokio::test]
async fn registration_rejects_duplicates_and_login_verifies_passwords() {
    let core = orchestrator().await;
    let req = RegisterUserRequest {
        username: "Alice".into(),
        email: "alice@example.com".into(),
        password: "s3cret-pass".into(),
    };
    let created = core.register_user(req.clone()).await.unwrap();
    // Usernames are normalized to lowercase.
    assert_eq!(created.username, "alice");
    assert!(!created.is_admin);

    let err = core.register_user(req).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    let verified = core.verify_credentials("ALICE", "s3cret-pass").await.unwrap();
    assert_eq!(verified.id, created.id);

    let err = core
        .verify_credentials("alice", "wrong-pass")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated));
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let store = fresh_store().await;
    seed::seed(store.as_ref()).await.unwrap();
    let first = store.count_users().await.unwrap();
    assert!(first >= 2);

    seed::seed(store.as_ref()).await.unwrap();
    assert_eq!(store.count_users().await.unwrap(), first);
}
