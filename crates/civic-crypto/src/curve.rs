use civic_types::{CurvePoint, ScalarBytes};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar, U256};
use sha2::{Digest, Sha256};

/// Number of leading digest bytes kept when a hash output is turned into a
/// scalar (120 bits). Signer and verifier must agree on this width.
pub const TRUNCATED_CHALLENGE_BYTES: usize = 15;

/// Group operations over secp256k1 and the SHA-256 oracle.
///
/// The methods taking [`CurvePoint`] are the public boundary. The signer
/// works on [`ProjectivePoint`] directly through [`decode`](Self::decode) and
/// [`encode`](Self::encode).
pub struct CurveOps;

impl CurveOps {
    /// `a + b`.
    pub fn add(a: &CurvePoint, b: &CurvePoint) -> Result<CurvePoint, CurveError> {
        let sum = Self::decode(a)? + Self::decode(b)?;
        Ok(Self::encode(&sum))
    }

    /// `scalar · p`.
    pub fn mul(p: &CurvePoint, scalar: &ScalarBytes) -> Result<CurvePoint, CurveError> {
        let product = Self::decode(p)? * Self::scalar_from_canonical(scalar)?;
        Ok(Self::encode(&product))
    }

    /// `scalar · G`.
    pub fn mul_generator(scalar: &ScalarBytes) -> Result<CurvePoint, CurveError> {
        let s = Self::scalar_from_canonical(scalar)?;
        Ok(Self::encode(&(ProjectivePoint::GENERATOR * s)))
    }

    /// SHA-256 over the concatenation of `parts`.
    pub fn hash(parts: &[&[u8]]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize().into()
    }

    /// Keep the first [`TRUNCATED_CHALLENGE_BYTES`] of `digest` as a
    /// big-endian integer and lift it into the scalar field.
    ///
    /// The result is always below the group order, so no reduction happens.
    pub fn truncate(digest: &[u8; 32]) -> Scalar {
        let mut wide = [0u8; 32];
        wide[32 - TRUNCATED_CHALLENGE_BYTES..].copy_from_slice(&digest[..TRUNCATED_CHALLENGE_BYTES]);
        Self::scalar_from_reduced(&wide)
    }

    /// `true` when the bytes [`truncate`](Self::truncate) keeps are all zero.
    pub fn truncated_window_is_zero(digest: &[u8; 32]) -> bool {
        digest[..TRUNCATED_CHALLENGE_BYTES].iter().all(|b| *b == 0)
    }

    /// Decode affine coordinates into a group element.
    ///
    /// The all-zero encoding decodes to the identity.
    pub fn decode(point: &CurvePoint) -> Result<ProjectivePoint, CurveError> {
        if point.is_identity() {
            return Ok(ProjectivePoint::IDENTITY);
        }
        let encoded = EncodedPoint::from_affine_coordinates(
            &FieldBytes::from(point.x),
            &FieldBytes::from(point.y),
            false,
        );
        Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .map(ProjectivePoint::from)
            .ok_or(CurveError::InvalidPoint)
    }

    /// Encode a group element as affine coordinates.
    pub fn encode(point: &ProjectivePoint) -> CurvePoint {
        let encoded = AffinePoint::from(*point).to_encoded_point(false);
        match (encoded.x(), encoded.y()) {
            (Some(x), Some(y)) => {
                let mut out = CurvePoint::IDENTITY;
                out.x.copy_from_slice(x);
                out.y.copy_from_slice(y);
                out
            }
            _ => CurvePoint::IDENTITY,
        }
    }

    /// Interpret 32 big-endian bytes as a scalar, reducing modulo the order.
    pub fn scalar_from_reduced(bytes: &[u8; 32]) -> Scalar {
        <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(*bytes))
    }

    /// Interpret 32 big-endian bytes as a scalar, rejecting values at or
    /// above the group order.
    pub fn scalar_from_canonical(bytes: &ScalarBytes) -> Result<Scalar, CurveError> {
        Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*bytes.as_bytes())))
            .ok_or(CurveError::InvalidScalar)
    }

    pub fn scalar_to_bytes(scalar: &Scalar) -> ScalarBytes {
        let mut out = [0u8; 32];
        out.copy_from_slice(&scalar.to_repr());
        ScalarBytes(out)
    }
}

/// Errors from decoding curve inputs.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CurveError {
    #[error("point is not on the curve")]
    InvalidPoint,
    #[error("scalar is not below the group order")]
    InvalidScalar,
}
