use civic_crypto::{verify_signature, CryptoError};
use civic_types::CurvePoint;

use crate::error::VerifyError;
use crate::records::Credential;
use crate::replay::{Redemption, ReplayGuard};

/// Gate every credential-consuming operation passes through.
///
/// Checks run in a fixed order and stop at the first failure:
/// liveliness, key match, the Schnorr equation, then replay. Nothing is
/// written until [`ReplayGuard::redeem`] receives the [`Redemption`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialVerifier {
    authority_pk: CurvePoint,
    min_liveliness: u8,
}

impl CredentialVerifier {
    pub fn new(authority_pk: CurvePoint, min_liveliness: u8) -> Self {
        Self {
            authority_pk,
            min_liveliness,
        }
    }

    pub fn authority_pk(&self) -> &CurvePoint {
        &self.authority_pk
    }

    pub fn min_liveliness(&self) -> u8 {
        self.min_liveliness
    }

    /// Liveliness, key match, and signature checks. Independent of replay
    /// state.
    pub fn check_signature(&self, credential: &Credential) -> Result<(), VerifyError> {
        if credential.liveliness <= self.min_liveliness {
            return Err(VerifyError::InsufficientLiveliness {
                actual: credential.liveliness,
                minimum: self.min_liveliness,
            });
        }

        if credential.authority_signature.pk != self.authority_pk {
            return Err(VerifyError::PublicKeyMismatch);
        }

        verify_signature(
            &self.authority_pk,
            credential.user_hash.as_bytes(),
            &credential.authority_signature,
        )
        .map_err(signature_rejection)
    }

    /// Replay membership checks.
    pub fn check_replay(
        &self,
        guard: &ReplayGuard,
        credential: &Credential,
    ) -> Result<Redemption, VerifyError> {
        let nonce = credential.authority_signature.nonce;
        if guard.is_nonce_used(&nonce) {
            return Err(VerifyError::NonceReused);
        }
        if guard.is_credential_used(&credential.user_hash) {
            return Err(VerifyError::CredentialReused);
        }
        Ok(Redemption {
            nonce,
            user_hash: credential.user_hash,
        })
    }

    /// Every check, without touching `guard`.
    pub fn check(
        &self,
        guard: &ReplayGuard,
        credential: &Credential,
    ) -> Result<Redemption, VerifyError> {
        self.check_signature(credential)?;
        self.check_replay(guard, credential)
    }

    /// Every check, then mark the credential consumed.
    pub fn verify(
        &self,
        guard: &mut ReplayGuard,
        credential: &Credential,
    ) -> Result<(), VerifyError> {
        let redemption = self.check(guard, credential)?;
        guard.redeem(redemption);
        Ok(())
    }
}

fn signature_rejection(error: CryptoError) -> VerifyError {
    VerifyError::SignatureInvalid(error.to_string())
}
