//! Trust gate and confirmation flag
//!
//! Before any network call, an install attempt passes through the
//! verification gate. A reference is verified when it resolves through the
//! trust registry or when the caller granted a one-shot confirmation
//! immediately beforehand. The confirmation flag is consumed atomically by
//! the next install attempt that proceeds: two racing installs can observe at
//! most one pending confirmation.
//!
//! Disabling safe mode is an explicit opt-out that makes the gate pass every
//! reference; the flag is still consumed on each proceed so it can never
//! outlive one attempt.

use crate::registry::TrustRegistry;
use sdk::errors::PackError;
use sdk::types::{PackageReference, RepoRef};
use std::sync::atomic::{AtomicBool, Ordering};

/// Outcome of one gate evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Installation may proceed against the resolved repository
    Proceed {
        /// Canonical repository to fetch from
        resolved: RepoRef,
        /// Whether a pending confirmation was consumed by this decision
        consumed_confirmation: bool,
    },
    /// Installation is blocked; no network call may be made
    Blocked,
}

/// Process-wide verification state
///
/// Owns the read-only trust registry and the one-shot confirmation flag.
/// A single instance is shared by reference across all command handlers so
/// the check-and-consume step stays atomic under concurrent installs.
pub struct VerificationService {
    registry: TrustRegistry,
    confirmation: AtomicBool,
    safe_mode: bool,
}

impl VerificationService {
    /// Create the service around a bootstrapped registry
    pub fn new(registry: TrustRegistry, safe_mode: bool) -> Self {
        Self {
            registry,
            confirmation: AtomicBool::new(false),
            safe_mode,
        }
    }

    /// Grant a one-shot confirmation for the next install attempt
    ///
    /// Returns `true` if a confirmation was already pending (at most one can
    /// exist at a time; granting again is idempotent).
    pub fn confirm(&self) -> bool {
        self.confirmation.swap(true, Ordering::SeqCst)
    }

    /// Whether a confirmation is currently pending
    pub fn confirmation_pending(&self) -> bool {
        self.confirmation.load(Ordering::SeqCst)
    }

    /// The bootstrapped registry
    pub fn registry(&self) -> &TrustRegistry {
        &self.registry
    }

    /// Evaluate the gate for one install attempt
    ///
    /// A symbolic name resolves through the registry or fails with
    /// `UnknownPackage`. A raw reference is verified when it matches a
    /// registered repository or when a confirmation is pending; otherwise the
    /// attempt is blocked before any network call, leaving the flag
    /// unchanged. Every proceed consumes a pending confirmation, so a granted
    /// confirmation never survives past the next attempt.
    pub fn decide(&self, reference: &PackageReference) -> Result<GateDecision, PackError> {
        let (resolved, registered) = match reference {
            PackageReference::Named(name) => match self.registry.resolve(name) {
                Some(repo) => (repo.clone(), true),
                None => return Err(PackError::UnknownPackage(name.clone())),
            },
            // The explicit raw form never goes through name lookup; it is
            // registered only if it matches a canonical repository.
            PackageReference::Repo(repo) => (repo.clone(), self.registry.contains_repo(repo)),
        };

        if !self.safe_mode {
            let consumed = self.confirmation.swap(false, Ordering::SeqCst);
            return Ok(GateDecision::Proceed {
                resolved,
                consumed_confirmation: consumed,
            });
        }

        if registered {
            let consumed = self.confirmation.swap(false, Ordering::SeqCst);
            return Ok(GateDecision::Proceed {
                resolved,
                consumed_confirmation: consumed,
            });
        }

        // Unverified raw reference: proceed only by consuming a pending
        // confirmation. The swap is the atomic check-and-consume; a losing
        // racer observes false and blocks.
        if self.confirmation.swap(false, Ordering::SeqCst) {
            Ok(GateDecision::Proceed {
                resolved,
                consumed_confirmation: true,
            })
        } else {
            Ok(GateDecision::Blocked)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TrustRegistry {
        TrustRegistry::parse("widgets : acme/widgets\n")
    }

    fn raw(owner: &str, repo: &str) -> PackageReference {
        PackageReference::Repo(RepoRef::new(owner, repo))
    }

    #[test]
    fn test_unverified_raw_reference_blocks() {
        let service = VerificationService::new(registry(), true);

        let decision = service.decide(&raw("evil", "stuff")).unwrap();
        assert_eq!(decision, GateDecision::Blocked);
        // A block leaves the flag untouched
        assert!(!service.confirmation_pending());
    }

    #[test]
    fn test_registered_name_proceeds() {
        let service = VerificationService::new(registry(), true);

        let decision = service
            .decide(&PackageReference::Named("widgets".to_string()))
            .unwrap();
        assert_eq!(
            decision,
            GateDecision::Proceed {
                resolved: RepoRef::new("acme", "widgets"),
                consumed_confirmation: false,
            }
        );
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        let service = VerificationService::new(registry(), true);

        let result = service.decide(&PackageReference::Named("mystery".to_string()));
        assert!(matches!(result, Err(PackError::UnknownPackage(_))));
    }

    #[test]
    fn test_raw_reference_matching_registry_proceeds() {
        let service = VerificationService::new(registry(), true);

        let decision = service.decide(&raw("acme", "widgets")).unwrap();
        assert!(matches!(decision, GateDecision::Proceed { .. }));
    }

    #[test]
    fn test_confirmation_permits_exactly_one_install() {
        let service = VerificationService::new(registry(), true);

        assert!(!service.confirm());
        let first = service.decide(&raw("acme", "unlisted")).unwrap();
        assert_eq!(
            first,
            GateDecision::Proceed {
                resolved: RepoRef::new("acme", "unlisted"),
                consumed_confirmation: true,
            }
        );

        // The flag is consumed, not sticky
        let second = service.decide(&raw("acme", "unlisted")).unwrap();
        assert_eq!(second, GateDecision::Blocked);
    }

    #[test]
    fn test_confirm_twice_is_one_pending_confirmation() {
        let service = VerificationService::new(registry(), true);

        assert!(!service.confirm());
        assert!(service.confirm());

        assert!(matches!(
            service.decide(&raw("acme", "unlisted")).unwrap(),
            GateDecision::Proceed { .. }
        ));
        assert_eq!(
            service.decide(&raw("acme", "unlisted")).unwrap(),
            GateDecision::Blocked
        );
    }

    #[test]
    fn test_verified_install_consumes_pending_confirmation() {
        // A confirmation granted before a registry-verified install is spent
        // by that install, never carried over to a later one.
        let service = VerificationService::new(registry(), true);
        service.confirm();

        let decision = service
            .decide(&PackageReference::Named("widgets".to_string()))
            .unwrap();
        assert!(matches!(
            decision,
            GateDecision::Proceed {
                consumed_confirmation: true,
                ..
            }
        ));
        assert_eq!(
            service.decide(&raw("acme", "unlisted")).unwrap(),
            GateDecision::Blocked
        );
    }

    #[test]
    fn test_safe_mode_off_always_proceeds() {
        let service = VerificationService::new(TrustRegistry::empty(), false);

        let decision = service.decide(&raw("anyone", "anything")).unwrap();
        assert!(matches!(decision, GateDecision::Proceed { .. }));
    }

    #[test]
    fn test_concurrent_installs_consume_at_most_one_confirmation() {
        use std::sync::Arc;

        let service = Arc::new(VerificationService::new(TrustRegistry::empty(), true));
        service.confirm();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            handles.push(std::thread::spawn(move || {
                matches!(
                    service.decide(&raw("acme", "racer")).unwrap(),
                    GateDecision::Proceed { .. }
                )
            }));
        }

        let proceeded = handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or(false))
            .filter(|proceeded| *proceeded)
            .count();
        assert_eq!(proceeded, 1);
    }
}
