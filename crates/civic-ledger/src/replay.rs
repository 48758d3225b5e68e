use std::collections::BTreeSet;

use civic_types::{Nonce, UserHash};
use serde::{Deserialize, Serialize};

/// The two consumption sets that stop a signature or an identity's
/// credential from being redeemed twice.
///
/// Both sets only ever grow. They are ordered so the ledger's canonical
/// encoding does not depend on insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayGuard {
    used_nonces: BTreeSet<Nonce>,
    used_credentials: BTreeSet<UserHash>,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_nonce_used(&self, nonce: &Nonce) -> bool {
        self.used_nonces.contains(nonce)
    }

    pub fn is_credential_used(&self, user_hash: &UserHash) -> bool {
        self.used_credentials.contains(user_hash)
    }

    pub fn used_nonce_count(&self) -> usize {
        self.used_nonces.len()
    }

    pub fn used_credential_count(&self) -> usize {
        self.used_credentials.len()
    }

    /// Record a checked credential as consumed.
    ///
    /// A [`Redemption`] can only be obtained from
    /// [`CredentialVerifier::check`](crate::verifier::CredentialVerifier::check),
    /// which has already established that neither value is present.
    pub fn redeem(&mut self, redemption: Redemption) {
        self.used_nonces.insert(redemption.nonce);
        self.used_credentials.insert(redemption.user_hash);
    }
}

/// Proof that a credential passed every verifier check against a given
/// replay state. Consumed by [`ReplayGuard::redeem`].
#[must_use = "a redemption has no effect until it is passed to ReplayGuard::redeem"]
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Redemption {
    pub(crate) nonce: Nonce,
    pub(crate) user_hash: UserHash,
}

impl Redemption {
    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    pub fn user_hash(&self) -> &UserHash {
        &self.user_hash
    }
}
