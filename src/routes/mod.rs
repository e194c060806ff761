/// Router Module Index
///
/// Organizes the routing logic into security-segregated modules so that
/// access control is applied explicitly at the module level (via Axum
/// layers) rather than per handler.

/// Routes accessible without a credential (health, register, login).
pub mod public;

/// Routes behind the Identity extractor middleware. Ownership/role checks
/// happen in the policy engine, not here.
pub mod authenticated;

/// Admin override routes, nested under /admin. Also behind the Identity
/// layer; the policy engine rejects non-admin identities.
pub mod admin;
