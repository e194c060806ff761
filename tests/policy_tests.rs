use workboard::auth::Identity;
use workboard::error::ApiError;
use workboard::guard;
use workboard::models::{Article, Todo};
use workboard::policy::{Action, Decision, DenyReason, ListScope, ListingPolicy, decide, list_scope};

// The policy engine and the concurrency guard are pure functions, so these
// tests need no store and no runtime.

fn admin() -> Identity {
    Identity {
        user_id: 1,
        is_admin: true,
    }
}

fn user(user_id: i64) -> Identity {
    Identity {
        user_id,
        is_admin: false,
    }
}

fn todo(owner: i64, closed: bool) -> Todo {
    Todo {
        id: 1,
        created_by_id: owner,
        is_closed: closed,
        ..Todo::default()
    }
}

fn article(owner: i64) -> Article {
    Article {
        id: 1,
        created_by_id: owner,
        ..Article::default()
    }
}

#[test]
fn create_is_allowed_for_any_authenticated_identity() {
    assert_eq!(decide(&admin(), None, Action::Create), Decision::Allow);
    assert_eq!(decide(&user(7), None, Action::Create), Decision::Allow);
}

#[test]
fn admin_reads_anything() {
    let closed_foreign = todo(2, true);
    assert_eq!(
        decide(&admin(), Some(&closed_foreign), Action::ReadOne),
        Decision::Allow
    );
}

#[test]
fn read_one_of_foreign_resource_is_forbidden() {
    let t = todo(2, false);
    assert_eq!(
        decide(&user(3), Some(&t), Action::ReadOne),
        Decision::Deny(DenyReason::Forbidden)
    );
}

#[test]
fn closed_todo_is_hidden_from_its_owner() {
    // Deliberate information hiding: NotFound, not Forbidden.
    let t = todo(2, true);
    assert_eq!(
        decide(&user(2), Some(&t), Action::ReadOne),
        Decision::Deny(DenyReason::NotFound)
    );
}

#[test]
fn owner_reads_own_open_todo() {
    let t = todo(2, false);
    assert_eq!(decide(&user(2), Some(&t), Action::ReadOne), Decision::Allow);
}

#[test]
fn owner_updates_own_open_todo() {
    let t = todo(2, false);
    assert_eq!(
        decide(&user(2), Some(&t), Action::Update { reopens: false }),
        Decision::Allow
    );
}

#[test]
fn owner_may_close_but_not_reopen() {
    // Closing an open todo is fine...
    let open = todo(2, false);
    assert_eq!(
        decide(&user(2), Some(&open), Action::Update { reopens: false }),
        Decision::Allow
    );
    // ...and a payload with is_closed=false against an open todo is not a
    // reopen, even though it states false.
    assert_eq!(
        decide(&user(2), Some(&open), Action::Update { reopens: true }),
        Decision::Allow
    );
    // Reopening a closed one is reserved for admins.
    let closed = todo(2, true);
    assert_eq!(
        decide(&user(2), Some(&closed), Action::Update { reopens: true }),
        Decision::Deny(DenyReason::Forbidden)
    );
    assert_eq!(
        decide(&admin(), Some(&closed), Action::Update { reopens: true }),
        Decision::Allow
    );
}

#[test]
fn non_owner_never_gets_allow_on_targeted_actions() {
    // Property: for all non-admin identities and resources they do not own,
    // readOne/update/replace deny, never allow.
    let stranger = user(9);
    for resource in [todo(2, false), todo(2, true)] {
        for action in [
            Action::ReadOne,
            Action::Update { reopens: false },
            Action::Update { reopens: true },
            Action::Replace,
        ] {
            let decision = decide(&stranger, Some(&resource), action);
            assert!(
                matches!(decision, Decision::Deny(_)),
                "expected deny for {action:?}"
            );
        }
    }
}

#[test]
fn admin_update_is_admin_only_and_ignores_ownership() {
    let foreign = todo(2, true);
    assert_eq!(
        decide(&admin(), Some(&foreign), Action::AdminUpdate),
        Decision::Allow
    );
    // Even the owner is turned away.
    assert_eq!(
        decide(&user(2), Some(&foreign), Action::AdminUpdate),
        Decision::Deny(DenyReason::Forbidden)
    );
}

#[test]
fn replace_is_allowed_for_owner_and_admin() {
    let a = article(2);
    assert_eq!(decide(&user(2), Some(&a), Action::Replace), Decision::Allow);
    assert_eq!(decide(&admin(), Some(&a), Action::Replace), Decision::Allow);
    assert_eq!(
        decide(&user(3), Some(&a), Action::Replace),
        Decision::Deny(DenyReason::Forbidden)
    );
}

#[test]
fn remove_is_admin_only_even_for_the_owner() {
    let own = article(2);
    assert_eq!(
        decide(&user(2), Some(&own), Action::Remove),
        Decision::Deny(DenyReason::Forbidden)
    );
    assert_eq!(decide(&admin(), Some(&own), Action::Remove), Decision::Allow);
}

#[test]
fn list_scope_is_unrestricted_for_admins() {
    let policy = ListingPolicy::default();
    assert_eq!(list_scope(&admin(), policy), ListScope::All);
}

#[test]
fn list_scope_restricts_non_admins_to_own_open_items_by_default() {
    let policy = ListingPolicy::default();
    assert_eq!(
        list_scope(&user(5), policy),
        ListScope::MineOnly {
            user_id: 5,
            open_only: true
        }
    );
}

#[test]
fn list_scope_honors_the_include_closed_parameter() {
    let policy = ListingPolicy {
        include_closed: true,
    };
    assert_eq!(
        list_scope(&user(5), policy),
        ListScope::MineOnly {
            user_id: 5,
            open_only: false
        }
    );
}

// --- Concurrency guard ---

#[test]
fn matching_version_proceeds() {
    assert!(guard::check_version(3, 3).is_ok());
}

#[test]
fn stale_version_conflicts_deterministically() {
    // Replaying the same stale expectation yields Conflict every time.
    for _ in 0..3 {
        let result = guard::check_version(4, 3);
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }
}

#[test]
fn id_mismatch_conflicts() {
    assert!(guard::check_id(1, 1).is_ok());
    assert!(matches!(guard::check_id(1, 2), Err(ApiError::Conflict(_))));
}
