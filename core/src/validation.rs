//! Classification of ACL policy validation failures.
//!
//! When an upload is rejected, Rundeck may answer with a body listing every
//! offending policy and its reasons. That body is folded into a single
//! `Error::PolicyValidation` so callers get one readable message:
//!
//! ```text
//! admin: missing context,missing for
//! ops: missing by
//! ```

use crate::error::Error;
use crate::wire::FailedAclValidation;

/// Tries to read `body` as a validation failure.
///
/// Returns `None` unless the body decodes and names at least one policy; the
/// caller then keeps its original error.
pub fn classify_validation_failure(body: &[u8]) -> Option<Error> {
    let failure: FailedAclValidation = match serde_json::from_slice(body) {
        Ok(failure) => failure,
        Err(e) => {
            tracing::debug!("error body is not a policy validation payload: {e}");
            return None;
        }
    };
    if failure.policies.is_empty() {
        tracing::debug!("policy validation payload lists no policies");
        return None;
    }

    let message = failure
        .policies
        .iter()
        .map(|entry| format!("{}: {}", entry.policy, entry.errors.join(",")))
        .collect::<Vec<_>>()
        .join("\n");
    Some(Error::PolicyValidation(message))
}
