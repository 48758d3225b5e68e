use civic_types::{CurvePoint, Nonce, ScalarBytes};
use k256::{ProjectivePoint, Scalar};
use serde::{Deserialize, Serialize};

use crate::curve::{CurveError, CurveOps};
use crate::provider::{ProviderError, SecretKey, SecretKeyProvider};

/// Schnorr-variant signature issued by the authority.
///
/// `r` and `nonce` are derived from the secret key and the message; they are
/// never independent inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Public key of the signer at issuance time.
    pub pk: CurvePoint,
    /// Ephemeral point `k · G`.
    #[serde(rename = "R")]
    pub r: CurvePoint,
    /// Response `k + c · secret`.
    pub s: ScalarBytes,
    /// Deterministic per-message value, `H(secret || message)`.
    pub nonce: Nonce,
}

/// A secret key together with its public point.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub secret: SecretKey,
    pub public: CurvePoint,
}

impl KeyPair {
    /// Build a key pair, rejecting a zero secret.
    pub fn from_secret(secret: SecretKey) -> Result<Self, CryptoError> {
        let public = derive_public_key(&secret)?;
        Ok(Self { secret, public })
    }

    /// Generate a fresh key from the thread-local CSPRNG.
    ///
    /// Only key generation draws randomness; signing never does.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let mut bytes = [0u8; 32];
            rand::Rng::fill(&mut rng, &mut bytes);
            if let Ok(pair) = Self::from_secret(SecretKey::from_bytes(bytes)) {
                return pair;
            }
        }
    }
}

/// Signer that fetches the authority key from a [`SecretKeyProvider`] on
/// every call.
pub struct DeterministicSigner<P> {
    provider: P,
}

impl<P: SecretKeyProvider> DeterministicSigner<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Public key of the provider's current secret.
    pub fn public_key(&self) -> Result<CurvePoint, CryptoError> {
        derive_public_key(&self.provider.secret_key()?)
    }

    /// Sign a 32-byte message. Identical messages produce identical
    /// signatures.
    pub fn sign(&self, message: &[u8; 32]) -> Result<Signature, CryptoError> {
        sign_message(&self.provider.secret_key()?, message)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

/// `secret · G`, rejecting a secret that is zero modulo the group order.
pub fn derive_public_key(secret: &SecretKey) -> Result<CurvePoint, CryptoError> {
    let sk = secret_scalar(secret)?;
    Ok(CurveOps::encode(&(ProjectivePoint::GENERATOR * sk)))
}

/// Produce a signature over `message` with nonces derived from the key.
///
/// `secret_prefix` below is the canonical 32-byte encoding of the secret
/// scalar.
pub fn sign_message(secret: &SecretKey, message: &[u8; 32]) -> Result<Signature, CryptoError> {
    let sk = secret_scalar(secret)?;
    let secret_prefix = zeroize::Zeroizing::new(CurveOps::scalar_to_bytes(&sk).0);
    let pk = CurveOps::encode(&(ProjectivePoint::GENERATOR * sk));

    let nonce = Nonce::from_bytes(CurveOps::hash(&[&secret_prefix[..], message]));
    let msg_hash = message_hash(message, &nonce);

    let k = CurveOps::truncate(&CurveOps::hash(&[&secret_prefix[..], &msg_hash]));
    if k == Scalar::ZERO {
        return Err(CryptoError::ZeroNonce);
    }
    let r = CurveOps::encode(&(ProjectivePoint::GENERATOR * k));

    let c = challenge(&r, &pk, &msg_hash)?;
    let s = k + c * sk;

    Ok(Signature {
        pk,
        r,
        s: CurveOps::scalar_to_bytes(&s),
        nonce,
    })
}

/// Check the Schnorr equation `s · G == R + c · pk` for `message` under
/// `authority_pk`.
///
/// Only the cryptographic part of credential verification lives here; the
/// ledger adds the liveliness, key-match, and replay checks.
pub fn verify_signature(
    authority_pk: &CurvePoint,
    message: &[u8; 32],
    signature: &Signature,
) -> Result<(), CryptoError> {
    let msg_hash = message_hash(message, &signature.nonce);

    if signature.r.x_is_zero() || authority_pk.x_is_zero() {
        return Err(CryptoError::ZeroCoordinate);
    }

    let c = challenge(&signature.r, authority_pk, &msg_hash)?;

    let r = CurveOps::decode(&signature.r)?;
    let pk = CurveOps::decode(authority_pk)?;
    let s = CurveOps::scalar_from_canonical(&signature.s)?;

    if ProjectivePoint::GENERATOR * s == r + pk * c {
        Ok(())
    } else {
        Err(CryptoError::EquationFailed)
    }
}

/// `H(message || nonce)`.
fn message_hash(message: &[u8; 32], nonce: &Nonce) -> [u8; 32] {
    CurveOps::hash(&[message, nonce.as_bytes()])
}

/// `truncate(H(R.x || pk.x || msg_hash))`, rejecting a zero window.
fn challenge(r: &CurvePoint, pk: &CurvePoint, msg_hash: &[u8; 32]) -> Result<Scalar, CryptoError> {
    let digest = CurveOps::hash(&[&r.x, &pk.x, msg_hash]);
    if CurveOps::truncated_window_is_zero(&digest) {
        return Err(CryptoError::ZeroChallenge);
    }
    let c = CurveOps::truncate(&digest);
    if c == Scalar::ZERO {
        return Err(CryptoError::ZeroChallenge);
    }
    Ok(c)
}

fn secret_scalar(secret: &SecretKey) -> Result<Scalar, CryptoError> {
    let sk = CurveOps::scalar_from_reduced(secret.as_bytes());
    if sk == Scalar::ZERO {
        return Err(CryptoError::InvalidKey);
    }
    Ok(sk)
}

/// Errors from signing and signature checks.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("private key cannot be zero")]
    InvalidKey,
    #[error("nonce cannot be zero")]
    ZeroNonce,
    #[error("challenge cannot be zero")]
    ZeroChallenge,
    #[error("signature point or public key has a zero x coordinate")]
    ZeroCoordinate,
    #[error("signature verification failed")]
    EquationFailed,
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticKeyProvider;
    use proptest::prelude::*;

    const AUTHORITY: [u8; 32] = [0x11; 32];

    fn secret() -> SecretKey {
        SecretKey::from_bytes(AUTHORITY)
    }

    fn message(seed: u8) -> [u8; 32] {
        CurveOps::hash(&[&b"message"[..], &[seed][..]])
    }

    #[test]
    fn zero_secret_is_rejected() {
        let zero = SecretKey::from_bytes([0; 32]);
        assert_eq!(derive_public_key(&zero).unwrap_err(), CryptoError::InvalidKey);
        assert_eq!(
            sign_message(&zero, &message(1)).unwrap_err(),
            CryptoError::InvalidKey
        );
        assert_eq!(
            CryptoError::InvalidKey.to_string(),
            "private key cannot be zero"
        );
    }

    #[test]
    fn public_key_is_secret_times_generator() {
        let pk = derive_public_key(&secret()).unwrap();
        let expected = CurveOps::mul_generator(&ScalarBytes(AUTHORITY)).unwrap();
        assert_eq!(pk, expected);
    }

    #[test]
    fn key_pair_generation_yields_matching_public_key() {
        let pair = KeyPair::generate();
        assert_eq!(pair.public, derive_public_key(&pair.secret).unwrap());
    }

    #[test]
    fn sign_and_verify() {
        let msg = message(1);
        let sig = sign_message(&secret(), &msg).unwrap();
        assert_eq!(sig.pk, derive_public_key(&secret()).unwrap());
        assert!(verify_signature(&sig.pk, &msg, &sig).is_ok());
    }

    #[test]
    fn signing_is_deterministic_across_signers() {
        let msg = message(2);
        let a = DeterministicSigner::new(StaticKeyProvider::from_bytes(AUTHORITY));
        let b = DeterministicSigner::new(StaticKeyProvider::from_bytes(AUTHORITY));
        let first = a.sign(&msg).unwrap();
        assert_eq!(first, a.sign(&msg).unwrap());
        assert_eq!(first, b.sign(&msg).unwrap());
        assert_eq!(a.public_key().unwrap(), first.pk);
    }

    #[test]
    fn distinct_messages_get_distinct_nonces() {
        let first = sign_message(&secret(), &message(1)).unwrap();
        let second = sign_message(&secret(), &message(2)).unwrap();
        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.r, second.r);
    }

    #[test]
    fn nonce_is_hash_of_secret_and_message() {
        let msg = message(3);
        let sig = sign_message(&secret(), &msg).unwrap();
        assert_eq!(sig.nonce.as_bytes(), &CurveOps::hash(&[&AUTHORITY, &msg]));
    }

    #[test]
    fn verify_fails_on_wrong_message() {
        let sig = sign_message(&secret(), &message(1)).unwrap();
        assert_eq!(
            verify_signature(&sig.pk, &message(2), &sig).unwrap_err(),
            CryptoError::EquationFailed
        );
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        let msg = message(1);
        let sig = sign_message(&secret(), &msg).unwrap();
        let other = derive_public_key(&SecretKey::from_bytes([0x22; 32])).unwrap();
        assert!(verify_signature(&other, &msg, &sig).is_err());
    }

    #[test]
    fn zero_r_coordinate_is_rejected() {
        let msg = message(1);
        let mut sig = sign_message(&secret(), &msg).unwrap();
        sig.r.x = [0; 32];
        assert_eq!(
            verify_signature(&sig.pk, &msg, &sig).unwrap_err(),
            CryptoError::ZeroCoordinate
        );
    }

    #[test]
    fn tampered_r_y_is_rejected() {
        let msg = message(1);
        let mut sig = sign_message(&secret(), &msg).unwrap();
        sig.r.y[31] ^= 0x01;
        assert!(verify_signature(&sig.pk, &msg, &sig).is_err());
    }

    #[test]
    fn signature_serde_roundtrip() {
        let sig = sign_message(&secret(), &message(4)).unwrap();
        let json = serde_json::to_string(&sig).unwrap();
        assert!(json.contains("\"R\""));
        let parsed: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, parsed);
    }

    #[test]
    fn signer_surfaces_provider_errors() {
        let signer = DeterministicSigner::new(crate::provider::EnvKeyProvider::new(
            "CIVIC_SIGNER_TEST_UNSET_KEY",
        ));
        assert!(matches!(
            signer.sign(&message(1)),
            Err(CryptoError::Provider(ProviderError::Missing(_)))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn any_key_and_message_verifies(key in any::<[u8; 32]>(), msg in any::<[u8; 32]>()) {
            let secret = SecretKey::from_bytes(key);
            prop_assume!(derive_public_key(&secret).is_ok());
            let sig = sign_message(&secret, &msg).unwrap();
            prop_assert!(verify_signature(&sig.pk, &msg, &sig).is_ok());
            prop_assert_eq!(sig, sign_message(&secret, &msg).unwrap());
        }

        #[test]
        fn flipping_any_bit_breaks_verification(field in 0usize..4, byte in 0usize..32, bit in 0u8..8) {
            let msg = message(9);
            let mut sig = sign_message(&secret(), &msg).unwrap();
            let mask = 1u8 << bit;
            match field {
                0 => sig.s.0[byte] ^= mask,
                1 => sig.r.x[byte] ^= mask,
                2 => sig.r.y[byte] ^= mask,
                _ => {
                    let mut nonce = *sig.nonce.as_bytes();
                    nonce[byte] ^= mask;
                    sig.nonce = Nonce::from_bytes(nonce);
                }
            }
            prop_assert!(verify_signature(&sig.pk, &msg, &sig).is_err());
        }
    }
}
