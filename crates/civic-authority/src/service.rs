use civic_crypto::{DeterministicSigner, SecretKeyProvider};
use civic_ledger::Credential;
use civic_types::{CurvePoint, UserHash};
use tracing::{debug, warn};

use crate::config::AuthorityConfig;
use crate::error::AuthorityError;

/// Issues one-time credentials binding a user hash to a liveliness score.
///
/// The secret key stays behind the provider; the service only remembers the
/// public key it derived at construction.
pub struct AuthorityService<P> {
    signer: DeterministicSigner<P>,
    public_key: CurvePoint,
    floor: u8,
}

impl<P: SecretKeyProvider> AuthorityService<P> {
    pub fn new(provider: P, floor: u8) -> Result<Self, AuthorityError> {
        let signer = DeterministicSigner::new(provider);
        let public_key = signer.public_key()?;
        debug!(floor, "authority service ready");
        Ok(Self {
            signer,
            public_key,
            floor,
        })
    }

    /// Like [`new`](Self::new), but refuses a provider whose key is not
    /// `expected`.
    pub fn with_expected_key(
        provider: P,
        expected: CurvePoint,
        floor: u8,
    ) -> Result<Self, AuthorityError> {
        let service = Self::new(provider, floor)?;
        if service.public_key != expected {
            return Err(AuthorityError::NotAuthority);
        }
        Ok(service)
    }

    pub fn public_key(&self) -> &CurvePoint {
        &self.public_key
    }

    pub fn floor(&self) -> u8 {
        self.floor
    }

    /// Sign `user_hash` and wrap it with `liveliness` into a credential.
    ///
    /// Issuing twice for the same user yields the same signature, so the
    /// ledger will accept at most one of the copies.
    pub fn issue(&self, user_hash: UserHash, liveliness: u8) -> Result<Credential, AuthorityError> {
        if liveliness <= self.floor {
            warn!(
                user = %user_hash.short_id(),
                liveliness,
                floor = self.floor,
                "issuance refused"
            );
            return Err(AuthorityError::InsufficientLiveliness {
                actual: liveliness,
                floor: self.floor,
            });
        }

        let authority_signature = self.signer.sign(user_hash.as_bytes())?;
        if authority_signature.pk != self.public_key {
            // provider now hands out a different key than at construction
            return Err(AuthorityError::NotAuthority);
        }

        debug!(
            user = %user_hash.short_id(),
            liveliness,
            nonce = %authority_signature.nonce.short_id(),
            "credential issued"
        );
        Ok(Credential {
            user_hash,
            liveliness,
            authority_signature,
        })
    }
}

impl AuthorityService<Box<dyn SecretKeyProvider>> {
    pub fn from_config(config: &AuthorityConfig) -> Result<Self, AuthorityError> {
        let provider = config.key.provider()?;
        match config.expected_pk {
            Some(expected) => Self::with_expected_key(provider, expected, config.floor),
            None => Self::new(provider, config.floor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeySource;
    use civic_crypto::{derive_public_key, verify_signature, SecretKey, StaticKeyProvider};
    use civic_ledger::{
        GenesisConfig, GovernanceLedger, LedgerError, LedgerReader, ProposalStatus, VerifyError,
    };
    use civic_types::Identity;
    use proptest::prelude::*;
    use std::sync::RwLock;

    const AUTHORITY_KEY: [u8; 32] = [0x11; 32];

    fn provider() -> StaticKeyProvider {
        StaticKeyProvider::from_bytes(AUTHORITY_KEY)
    }

    fn service(floor: u8) -> AuthorityService<StaticKeyProvider> {
        AuthorityService::new(provider(), floor).unwrap()
    }

    #[test]
    fn issued_credential_verifies() {
        let svc = service(0);
        let user = UserHash::from_label("alice");
        let cred = svc.issue(user, 80).unwrap();

        assert_eq!(cred.user_hash, user);
        assert_eq!(cred.liveliness, 80);
        assert_eq!(&cred.authority_signature.pk, svc.public_key());
        verify_signature(svc.public_key(), user.as_bytes(), &cred.authority_signature).unwrap();
    }

    #[test]
    fn issuance_is_deterministic() {
        let user = UserHash::from_label("bob");
        let a = service(0).issue(user, 10).unwrap();
        let b = service(0).issue(user, 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn floor_is_strict() {
        let svc = service(30);
        let user = UserHash::from_label("carol");
        assert_eq!(
            svc.issue(user, 30).unwrap_err(),
            AuthorityError::InsufficientLiveliness {
                actual: 30,
                floor: 30
            }
        );
        assert!(svc.issue(user, 31).is_ok());
    }

    #[test]
    fn zero_key_is_rejected() {
        let err = AuthorityService::new(StaticKeyProvider::from_bytes([0; 32]), 0)
            .err()
            .unwrap();
        assert_eq!(err, AuthorityError::InvalidKey);
    }

    #[test]
    fn unexpected_key_is_not_authority() {
        let other = derive_public_key(&SecretKey::from_bytes([0x22; 32])).unwrap();
        let err = AuthorityService::with_expected_key(provider(), other, 0)
            .err()
            .unwrap();
        assert_eq!(err, AuthorityError::NotAuthority);

        let own = derive_public_key(&SecretKey::from_bytes(AUTHORITY_KEY)).unwrap();
        assert!(AuthorityService::with_expected_key(provider(), own, 0).is_ok());
    }

    struct RotatingProvider(RwLock<[u8; 32]>);

    impl SecretKeyProvider for RotatingProvider {
        fn secret_key(&self) -> Result<SecretKey, civic_crypto::ProviderError> {
            Ok(SecretKey::from_bytes(*self.0.read().unwrap()))
        }
    }

    #[test]
    fn rotated_key_stops_issuance() {
        let svc =
            AuthorityService::new(RotatingProvider(RwLock::new(AUTHORITY_KEY)), 0).unwrap();
        *svc.signer.provider().0.write().unwrap() = [0x33; 32];
        assert_eq!(
            svc.issue(UserHash::from_label("dave"), 50).unwrap_err(),
            AuthorityError::NotAuthority
        );
    }

    #[test]
    fn from_config_with_inline_key() {
        let config = AuthorityConfig {
            key: KeySource::Inline {
                key: "11".repeat(32),
            },
            floor: 12,
            expected_pk: Some(derive_public_key(&SecretKey::from_bytes(AUTHORITY_KEY)).unwrap()),
        };
        let svc = AuthorityService::from_config(&config).unwrap();
        assert_eq!(svc.floor(), 12);
        assert_eq!(svc.public_key(), service(0).public_key());
    }

    #[test]
    fn from_config_missing_env_key() {
        let config = AuthorityConfig {
            key: KeySource::Env {
                var: "CIVIC_TEST_KEY_THAT_IS_NEVER_SET".into(),
            },
            ..AuthorityConfig::default()
        };
        assert!(matches!(
            AuthorityService::from_config(&config).err(),
            Some(AuthorityError::Crypto(_))
        ));
    }

    #[test]
    fn end_to_end_vote_and_execute() {
        let svc = service(0);
        let mut ledger = GovernanceLedger::genesis(
            GenesisConfig {
                description: "fund the library".into(),
                proposer: Identity::from_label("council"),
                min_liveliness: 10,
                ..GenesisConfig::default()
            },
            &provider(),
        )
        .unwrap();
        assert_eq!(ledger.authority_pk(), svc.public_key());

        let alice = svc.issue(UserHash::from_label("alice"), 50).unwrap();
        ledger.vote_for(alice).unwrap();
        assert_eq!(ledger.proposal().votes_for, 1);

        assert_eq!(ledger.vote_for(alice).unwrap_err(), LedgerError::AlreadyVoted);
        assert_eq!(ledger.proposal().votes_for, 1);

        ledger.execute_proposal(&provider()).unwrap();
        assert_eq!(ledger.proposal().executed, ProposalStatus::Passed);
        assert!(ledger.validate_journal().is_valid());
    }

    #[test]
    fn foreign_authority_credentials_are_refused() {
        let rogue = AuthorityService::new(StaticKeyProvider::from_bytes([0x44; 32]), 0).unwrap();
        let mut ledger =
            GovernanceLedger::genesis(GenesisConfig::default(), &provider()).unwrap();
        let cred = rogue.issue(UserHash::from_label("eve"), 90).unwrap();
        assert_eq!(
            ledger.vote_for(cred).unwrap_err(),
            LedgerError::Verify(VerifyError::PublicKeyMismatch)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn any_issued_credential_passes_the_ledger(
            label in "[a-z]{1,24}",
            liveliness in 1u8..=u8::MAX,
        ) {
            let svc = service(0);
            let mut ledger =
                GovernanceLedger::genesis(GenesisConfig::default(), &provider()).unwrap();
            let cred = svc.issue(UserHash::from_label(&label), liveliness).unwrap();
            prop_assert!(ledger.vote_against(cred).is_ok());
            prop_assert!(ledger.has_voted(&cred.user_hash));
        }
    }
}
