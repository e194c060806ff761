use crate::auth::Identity;
use crate::models::{Article, Todo};

/// Action
///
/// The shared vocabulary between the transport adapter and the core. Every
/// HTTP verb is mapped onto one of these before the orchestrator is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    ReadAll,
    ReadOne,
    /// Partial update. `reopens` is true when the payload attempts to flip
    /// `is_closed` from true back to false.
    Update {
        reopens: bool,
    },
    /// Status-only override. Admin-only, ignores ownership.
    AdminUpdate,
    /// Full replace. Owner or admin; additionally subject to the concurrency
    /// guard and the id-match check.
    Replace,
    Remove,
}

/// Decision
///
/// Outcome of the access policy for one (actor, resource, action) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// DenyReason
///
/// `NotFound` is deliberate information hiding: a closed todo must be
/// indistinguishable from an absent one to its non-admin owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Forbidden,
    NotFound,
}

/// Owned
///
/// The slice of a resource the policy needs to see: who created it, and
/// whether it is closed. Kinds without a closed state report `false`.
pub trait Owned {
    fn created_by(&self) -> i64;
    fn is_closed(&self) -> bool {
        false
    }
}

impl Owned for Article {
    fn created_by(&self) -> i64 {
        self.created_by_id
    }
}

impl Owned for Todo {
    fn created_by(&self) -> i64 {
        self.created_by_id
    }
    fn is_closed(&self) -> bool {
        self.is_closed
    }
}

/// decide
///
/// The pure decision function of the access policy. Rules are evaluated in
/// the fixed precedence below; admins have unrestricted visibility and
/// mutation rights, owners may read and update their own open items but can
/// neither delete nor reopen them.
///
/// `resource` is `None` only for actions that do not target an existing
/// resource (`Create`, `ReadAll`); for all others the orchestrator fetches
/// first and fails `NotFound` before asking the policy.
pub fn decide(actor: &Identity, resource: Option<&dyn Owned>, action: Action) -> Decision {
    match action {
        // 1. Any authenticated identity may create; ownership is fixed to
        // the creator by the orchestrator.
        Action::Create => Decision::Allow,

        // 2. Listing is always allowed; the scope is narrowed separately by
        // `list_scope`.
        Action::ReadAll => Decision::Allow,

        // 5. Status override: admin only, no ownership involved.
        Action::AdminUpdate => {
            if actor.is_admin {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::Forbidden)
            }
        }

        // 7. Removal is a terminal operation reserved for admins, even
        // against the owner.
        Action::Remove => {
            if actor.is_admin {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::Forbidden)
            }
        }

        // 3, 4, 6: resource-targeted actions.
        Action::ReadOne | Action::Update { .. } | Action::Replace => {
            let Some(resource) = resource else {
                return Decision::Deny(DenyReason::NotFound);
            };
            if actor.is_admin {
                return Decision::Allow;
            }
            if resource.created_by() != actor.user_id {
                return Decision::Deny(DenyReason::Forbidden);
            }
            match action {
                // 3. Closed resources are hidden from their non-admin owner.
                Action::ReadOne => {
                    if resource.is_closed() {
                        Decision::Deny(DenyReason::NotFound)
                    } else {
                        Decision::Allow
                    }
                }
                // 4. Owners may not reopen: closing is a one-way commitment
                // reversible only by an authority.
                Action::Update { reopens } => {
                    if reopens && resource.is_closed() {
                        Decision::Deny(DenyReason::Forbidden)
                    } else {
                        Decision::Allow
                    }
                }
                // 6. Owner or admin; id/version checks happen in the guard.
                Action::Replace => Decision::Allow,
                _ => unreachable!(),
            }
        }
    }
}

/// ListScope
///
/// The visibility window a listing runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Admins see everything.
    All,
    /// Non-admins see their own items; `open_only` additionally hides closed
    /// ones when the listing policy says so.
    MineOnly { user_id: i64, open_only: bool },
}

/// ListingPolicy
///
/// Whether non-admin listings include closed items. Kept as an explicit
/// parameter (wired from configuration) rather than a hardcoded rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingPolicy {
    pub include_closed: bool,
}

/// list_scope
///
/// Computes the scope for a `ReadAll` by the given actor.
pub fn list_scope(actor: &Identity, policy: ListingPolicy) -> ListScope {
    if actor.is_admin {
        ListScope::All
    } else {
        ListScope::MineOnly {
            user_id: actor.user_id,
            open_only: !policy.include_closed,
        }
    }
}
