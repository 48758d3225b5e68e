use civic_crypto::Signature;
use civic_types::{Identity, UserHash};
use serde::{Deserialize, Serialize};

/// One-time authorization token binding a user identity to a liveliness
/// score, signed by the authority.
///
/// Only `user_hash` is covered by the signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub user_hash: UserHash,
    pub liveliness: u8,
    pub authority_signature: Signature,
}

/// Lifecycle of the proposal. `Rejected` and `Passed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Active,
    Rejected,
    Passed,
}

impl ProposalStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// The single proposal a ledger instance governs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub description: String,
    pub proposer: Identity,
    pub deadline_timestamp: u64,
    pub votes_for: u64,
    pub votes_against: u64,
    pub executed: ProposalStatus,
}

impl Proposal {
    /// Outcome `execute` would produce right now. A tie does not pass.
    pub fn tally(&self) -> ProposalStatus {
        if self.votes_for > self.votes_against {
            ProposalStatus::Passed
        } else {
            ProposalStatus::Rejected
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: u64,
    pub voter_hash: UserHash,
    /// `true` for a vote in favour.
    pub vote_type: bool,
}

/// Comment attached to the proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    /// User hash of the credential that authorized the comment.
    pub hash: UserHash,
    pub timestamp: u64,
    pub sequence_id: u64,
}

/// Bulletin-board post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub text: String,
    /// User hash of the credential that authorized the post.
    pub hash: UserHash,
    pub timestamp: u64,
    pub sequence_id: u64,
    pub author: Identity,
}
