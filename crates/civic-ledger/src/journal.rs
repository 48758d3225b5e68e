use std::fmt;

use civic_crypto::ContentHasher;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Kind of state transition a receipt records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    VoteFor,
    VoteAgainst,
    Comment,
    Post,
    Execute,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VoteFor => "vote-for",
            Self::VoteAgainst => "vote-against",
            Self::Comment => "comment",
            Self::Post => "post",
            Self::Execute => "execute",
        };
        f.write_str(name)
    }
}

/// Hash-linked record of one committed operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// 1-based position in the journal.
    pub seq: u64,
    pub kind: OperationKind,
    pub prev_hash: Option<[u8; 32]>,
    /// Rolling digest over the genesis state and every change up to and
    /// including this one.
    pub chain_digest: [u8; 32],
    pub receipt_hash: [u8; 32],
}

impl TxReceipt {
    pub fn short_hash(&self) -> String {
        hex::encode(&self.receipt_hash[..4])
    }
}

/// Append-only list of receipts, one per committed operation.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    receipts: Vec<TxReceipt>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the receipt that would follow the current head. Does not append.
    pub fn prepare(
        &self,
        kind: OperationKind,
        chain_digest: [u8; 32],
    ) -> Result<TxReceipt, LedgerError> {
        let mut receipt = TxReceipt {
            seq: self.receipts.len() as u64 + 1,
            kind,
            prev_hash: self.receipts.last().map(|r| r.receipt_hash),
            chain_digest,
            receipt_hash: [0; 32],
        };
        receipt.receipt_hash = compute_receipt_hash(&receipt)?;
        Ok(receipt)
    }

    /// Append a receipt produced by [`prepare`](Self::prepare) against the
    /// current head.
    pub fn append(&mut self, receipt: TxReceipt) -> Result<(), LedgerError> {
        let expected_seq = self.receipts.len() as u64 + 1;
        if receipt.seq != expected_seq {
            return Err(LedgerError::IntegrityViolation {
                seq: receipt.seq,
                reason: format!("append attempted out of order; expected seq {expected_seq}"),
            });
        }
        if receipt.prev_hash != self.receipts.last().map(|r| r.receipt_hash) {
            return Err(LedgerError::IntegrityViolation {
                seq: receipt.seq,
                reason: "append attempted with mismatched previous hash".into(),
            });
        }
        self.receipts.push(receipt);
        Ok(())
    }

    pub fn receipts(&self) -> &[TxReceipt] {
        &self.receipts
    }

    pub fn head(&self) -> Option<&TxReceipt> {
        self.receipts.last()
    }

    /// Check sequence numbering, hash links, and recomputed hashes.
    pub fn validate(&self) -> JournalReport {
        let mut violations = Vec::new();

        for (index, receipt) in self.receipts.iter().enumerate() {
            let expected_seq = (index + 1) as u64;
            if receipt.seq != expected_seq {
                violations.push(Violation {
                    seq: receipt.seq,
                    kind: ViolationKind::SequenceGap,
                    description: format!("expected seq {expected_seq}, got {}", receipt.seq),
                });
            }

            let expected_prev = index
                .checked_sub(1)
                .map(|prev| self.receipts[prev].receipt_hash);
            if receipt.prev_hash != expected_prev {
                violations.push(Violation {
                    seq: receipt.seq,
                    kind: ViolationKind::HashChainBreak,
                    description: "previous hash link mismatch".into(),
                });
            }

            match compute_receipt_hash(receipt) {
                Ok(hash) if hash == receipt.receipt_hash => {}
                Ok(_) => violations.push(Violation {
                    seq: receipt.seq,
                    kind: ViolationKind::HashMismatch,
                    description: "receipt hash does not match computed".into(),
                }),
                Err(e) => violations.push(Violation {
                    seq: receipt.seq,
                    kind: ViolationKind::HashMismatch,
                    description: e.to_string(),
                }),
            }
        }

        JournalReport {
            receipt_count: self.receipts.len() as u64,
            violations,
        }
    }

    #[cfg(test)]
    pub(crate) fn receipts_mut(&mut self) -> &mut Vec<TxReceipt> {
        &mut self.receipts
    }
}

/// Result of journal validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JournalReport {
    pub receipt_count: u64,
    pub violations: Vec<Violation>,
}

impl JournalReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub seq: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    SequenceGap,
    HashChainBreak,
    HashMismatch,
}

fn compute_receipt_hash(receipt: &TxReceipt) -> Result<[u8; 32], LedgerError> {
    let mut canonical = receipt.clone();
    canonical.receipt_hash = [0; 32];
    Ok(ContentHasher::RECEIPT.hash_json(&canonical)?)
}
