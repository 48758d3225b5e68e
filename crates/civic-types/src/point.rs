use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bytes::hex32;

/// Affine coordinates of a group element, big-endian.
///
/// The all-zero encoding stands for the point at infinity. Whether a
/// `CurvePoint` actually lies on the curve is only checked when it is
/// decoded by the crypto layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurvePoint {
    #[serde(with = "hex32")]
    pub x: [u8; 32],
    #[serde(with = "hex32")]
    pub y: [u8; 32],
}

impl CurvePoint {
    /// Encoding of the point at infinity.
    pub const IDENTITY: Self = Self {
        x: [0; 32],
        y: [0; 32],
    };

    pub const fn new(x: [u8; 32], y: [u8; 32]) -> Self {
        Self { x, y }
    }

    /// `true` when the x coordinate is all zero bytes.
    pub fn x_is_zero(&self) -> bool {
        self.x.iter().all(|b| *b == 0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl fmt::Debug for CurvePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CurvePoint(x={}.., y={}..)",
            hex::encode(&self.x[..4]),
            hex::encode(&self.y[..4])
        )
    }
}

/// Big-endian encoding of a scalar modulo the group order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScalarBytes(#[serde(with = "hex32")] pub [u8; 32]);

impl ScalarBytes {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ScalarBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScalarBytes({}..)", hex::encode(&self.0[..4]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_encoding() {
        assert!(CurvePoint::IDENTITY.is_identity());
        assert!(CurvePoint::IDENTITY.x_is_zero());
        assert!(!CurvePoint::new([1; 32], [0; 32]).x_is_zero());
    }

    #[test]
    fn json_uses_hex_coordinates() {
        let point = CurvePoint::new([2; 32], [3; 32]);
        let value = serde_json::to_value(point).unwrap();
        assert_eq!(value["x"], "02".repeat(32));
        assert_eq!(value["y"], "03".repeat(32));
        let parsed: CurvePoint = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, point);
    }

    #[test]
    fn scalar_rejects_short_hex() {
        let result: Result<ScalarBytes, _> = serde_json::from_str("\"00ff\"");
        assert!(result.is_err());
    }
}
