use crate::error::ApiError;

/// Concurrency guard for version-sensitive writes.
///
/// Optimistic scheme: no lock is held between read and write. The caller
/// states the version it last read; the guard re-compares against the
/// store's current value at write time. The first writer wins and bumps the
/// version, so every stale writer after it observes a mismatch here —
/// deterministically, no matter how often the same stale request is replayed.

/// Rejects the write when the stored version differs from the one the caller
/// expects.
pub fn check_version(current: i64, expected: i64) -> Result<(), ApiError> {
    if current != expected {
        return Err(ApiError::Conflict(format!(
            "version mismatch: expected {current}, got {expected}"
        )));
    }
    Ok(())
}

/// Rejects a replace whose payload states a different id than the resource it
/// targets.
pub fn check_id(current: i64, stated: i64) -> Result<(), ApiError> {
    if current != stated {
        return Err(ApiError::Conflict(format!(
            "id mismatch: expected {current}, got {stated}"
        )));
    }
    Ok(())
}
