use civic_types::{CurvePoint, Identity, Nonce, UserHash};

use crate::records::Proposal;

/// Read boundary for ledger queries. No method mutates state.
pub trait LedgerReader {
    fn authority_pk(&self) -> &CurvePoint;

    fn min_liveliness(&self) -> u8;

    /// Next sequence id a comment or post will receive.
    fn sequence(&self) -> u64;

    fn proposal(&self) -> &Proposal;

    fn vote_count(&self) -> u64;

    fn comment_count(&self) -> u64;

    fn post_count(&self) -> u64;

    /// Number of distinct post authors.
    fn author_count(&self) -> u64;

    fn is_nonce_used(&self, nonce: &Nonce) -> bool;

    fn is_credential_used(&self, user_hash: &UserHash) -> bool;

    fn has_voted(&self, user_hash: &UserHash) -> bool;

    fn has_posted(&self, author: &Identity) -> bool;

    /// Whether `now` is past the proposal deadline. Purely informational.
    fn deadline_passed(&self, now: u64) -> bool {
        now > self.proposal().deadline_timestamp
    }
}
