use std::collections::BTreeSet;

use civic_crypto::{derive_public_key, ContentHasher, CryptoError, SecretKeyProvider};
use civic_types::{CurvePoint, Identity, Nonce, UserHash};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::GenesisConfig;
use crate::error::LedgerError;
use crate::journal::{Journal, JournalReport, OperationKind, TxReceipt};
use crate::records::{Comment, Credential, Post, Proposal, ProposalStatus, Vote};
use crate::replay::{Redemption, ReplayGuard};
use crate::traits::LedgerReader;
use crate::verifier::CredentialVerifier;

/// Mutable state of a ledger instance.
///
/// Sets are ordered so the JSON encoding behind
/// [`GovernanceLedger::state_digest`] is canonical.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub proposal: Proposal,
    pub votes: Vec<Vote>,
    /// Voter registry: one vote per identity.
    pub voters: BTreeSet<UserHash>,
    pub comments: Vec<Comment>,
    pub posts: Vec<Post>,
    pub authors: BTreeSet<Identity>,
    /// Shared counter for comments and posts.
    pub sequence: u64,
    pub replay: ReplayGuard,
}

impl LedgerState {
    fn commit(&mut self, change: Change) {
        match change {
            Change::Vote { vote, redemption } => {
                self.replay.redeem(redemption);
                if vote.vote_type {
                    self.proposal.votes_for += 1;
                } else {
                    self.proposal.votes_against += 1;
                }
                self.voters.insert(vote.voter_hash);
                self.votes.push(vote);
            }
            Change::Comment {
                comment,
                redemption,
            } => {
                self.replay.redeem(redemption);
                self.comments.push(comment);
                self.sequence += 1;
            }
            Change::Post { post, redemption } => {
                self.replay.redeem(redemption);
                self.authors.insert(post.author);
                self.posts.push(post);
                self.sequence += 1;
            }
            Change::Execute { outcome } => self.proposal.executed = outcome,
        }
    }
}

/// A fully checked state transition, not yet applied.
#[derive(Debug, Serialize)]
#[serde(tag = "change", rename_all = "kebab-case")]
enum Change {
    Vote {
        vote: Vote,
        redemption: Redemption,
    },
    Comment {
        comment: Comment,
        redemption: Redemption,
    },
    Post {
        post: Post,
        redemption: Redemption,
    },
    Execute {
        outcome: ProposalStatus,
    },
}

/// What a receipt's chain digest is computed over.
#[derive(Serialize)]
struct ChainLink<'a> {
    prev: &'a [u8; 32],
    change: &'a Change,
}

fn chain_digest(prev: &[u8; 32], change: &Change) -> Result<[u8; 32], LedgerError> {
    Ok(ContentHasher::STATE.hash_json(&ChainLink { prev, change })?)
}

/// Public view of a ledger, as hashed by [`GovernanceLedger::state_digest`].
#[derive(Debug, Serialize)]
pub struct LedgerSnapshot<'a> {
    pub authority_pk: &'a CurvePoint,
    pub min_liveliness: u8,
    pub state: &'a LedgerState,
}

/// One operation submitted by the transaction pipeline.
pub enum Transaction<'a> {
    VoteFor(Credential),
    VoteAgainst(Credential),
    Comment {
        text: String,
        credential: Credential,
    },
    Post {
        message: String,
        timestamp: u64,
        author: Identity,
        credential: Credential,
    },
    Execute {
        caller: &'a dyn SecretKeyProvider,
    },
}

impl Transaction<'_> {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::VoteFor(_) => OperationKind::VoteFor,
            Self::VoteAgainst(_) => OperationKind::VoteAgainst,
            Self::Comment { .. } => OperationKind::Comment,
            Self::Post { .. } => OperationKind::Post,
            Self::Execute { .. } => OperationKind::Execute,
        }
    }
}

/// Credential-gated governance ledger for a single proposal.
///
/// Every state-changing operation is checked against the live state first
/// and turned into a pending change. The change is digested and its receipt
/// appended before anything is mutated, so a rejected operation leaves no
/// trace. The per-operation cost depends on the change, not on the history.
pub struct GovernanceLedger {
    verifier: CredentialVerifier,
    state: LedgerState,
    journal: Journal,
    /// Digest of the state at genesis; the root of the receipt chain.
    genesis_digest: [u8; 32],
    clock: Box<dyn Clock>,
}

impl GovernanceLedger {
    /// Create a ledger whose authority key is derived from `authority`.
    pub fn genesis(
        config: GenesisConfig,
        authority: &dyn SecretKeyProvider,
    ) -> Result<Self, LedgerError> {
        let secret = authority.secret_key().map_err(CryptoError::from)?;
        let authority_pk = derive_public_key(&secret)?;
        Self::with_authority_pk(config, authority_pk)
    }

    /// Create a ledger for an already known authority public key.
    pub fn with_authority_pk(
        config: GenesisConfig,
        authority_pk: CurvePoint,
    ) -> Result<Self, LedgerError> {
        config.validate()?;
        if authority_pk.is_identity() {
            return Err(LedgerError::InvalidKey);
        }

        let proposal = Proposal {
            id: config.proposal_id,
            description: config.description,
            proposer: config.proposer,
            deadline_timestamp: config.deadline_timestamp,
            votes_for: 0,
            votes_against: 0,
            executed: ProposalStatus::Active,
        };
        let verifier = CredentialVerifier::new(authority_pk, config.min_liveliness);
        let state = LedgerState {
            proposal,
            votes: Vec::new(),
            voters: BTreeSet::new(),
            comments: Vec::new(),
            posts: Vec::new(),
            authors: BTreeSet::new(),
            sequence: 0,
            replay: ReplayGuard::new(),
        };
        let genesis_digest = ContentHasher::STATE.hash_json(&snapshot_of(&verifier, &state))?;

        debug!(
            proposal = state.proposal.id,
            min_liveliness = config.min_liveliness,
            "ledger genesis"
        );

        Ok(Self {
            verifier,
            state,
            journal: Journal::new(),
            genesis_digest,
            clock: Box::new(SystemClock),
        })
    }

    /// Replace the clock used to timestamp comments.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // ---- Operations ----

    pub fn vote_for(&mut self, credential: Credential) -> Result<TxReceipt, LedgerError> {
        self.vote(credential, true)
    }

    pub fn vote_against(&mut self, credential: Credential) -> Result<TxReceipt, LedgerError> {
        self.vote(credential, false)
    }

    pub fn comment_on_proposal(
        &mut self,
        text: impl Into<String>,
        credential: Credential,
    ) -> Result<TxReceipt, LedgerError> {
        let text = text.into();
        let timestamp = self.clock.now();
        self.transact(OperationKind::Comment, |verifier, state| {
            let redemption = verifier.check(&state.replay, &credential)?;
            Ok(Change::Comment {
                comment: Comment {
                    text,
                    hash: credential.user_hash,
                    timestamp,
                    sequence_id: state.sequence,
                },
                redemption,
            })
        })
    }

    pub fn post(
        &mut self,
        message: impl Into<String>,
        timestamp: u64,
        author: Identity,
        credential: Credential,
    ) -> Result<TxReceipt, LedgerError> {
        let text = message.into();
        self.transact(OperationKind::Post, |verifier, state| {
            let redemption = verifier.check(&state.replay, &credential)?;
            Ok(Change::Post {
                post: Post {
                    text,
                    hash: credential.user_hash,
                    timestamp,
                    sequence_id: state.sequence,
                    author,
                },
                redemption,
            })
        })
    }

    /// Close the proposal. Only the authority may call this, and only once.
    ///
    /// The proposal passes on a strict majority; a tie is rejected.
    pub fn execute_proposal(
        &mut self,
        caller: &dyn SecretKeyProvider,
    ) -> Result<TxReceipt, LedgerError> {
        let receipt = self.transact(OperationKind::Execute, |verifier, state| {
            let secret = caller.secret_key().map_err(CryptoError::from)?;
            if derive_public_key(&secret)? != *verifier.authority_pk() {
                return Err(LedgerError::NotAuthority);
            }
            if !state.proposal.executed.is_active() {
                return Err(LedgerError::AlreadyExecuted);
            }
            Ok(Change::Execute {
                outcome: state.proposal.tally(),
            })
        })?;

        let proposal = &self.state.proposal;
        info!(
            proposal = proposal.id,
            outcome = ?proposal.executed,
            votes_for = proposal.votes_for,
            votes_against = proposal.votes_against,
            "proposal executed"
        );
        Ok(receipt)
    }

    /// Run one transaction from the pipeline.
    pub fn apply(&mut self, transaction: Transaction<'_>) -> Result<TxReceipt, LedgerError> {
        match transaction {
            Transaction::VoteFor(credential) => self.vote_for(credential),
            Transaction::VoteAgainst(credential) => self.vote_against(credential),
            Transaction::Comment { text, credential } => {
                self.comment_on_proposal(text, credential)
            }
            Transaction::Post {
                message,
                timestamp,
                author,
                credential,
            } => self.post(message, timestamp, author, credential),
            Transaction::Execute { caller } => self.execute_proposal(caller),
        }
    }

    // ---- Inspection ----

    pub fn votes(&self) -> &[Vote] {
        &self.state.votes
    }

    pub fn comments(&self) -> &[Comment] {
        &self.state.comments
    }

    pub fn posts(&self) -> &[Post] {
        &self.state.posts
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn snapshot(&self) -> LedgerSnapshot<'_> {
        snapshot_of(&self.verifier, &self.state)
    }

    /// Canonical digest of the current state. Hashes the whole state, so it
    /// is computed on demand and never on the write path.
    pub fn state_digest(&self) -> Result<[u8; 32], LedgerError> {
        Ok(ContentHasher::STATE.hash_json(&self.snapshot())?)
    }

    pub fn genesis_digest(&self) -> &[u8; 32] {
        &self.genesis_digest
    }

    /// Chain digest of the newest receipt, or the genesis digest before the
    /// first operation.
    pub fn chain_head(&self) -> &[u8; 32] {
        self.journal
            .head()
            .map_or(&self.genesis_digest, |receipt| &receipt.chain_digest)
    }

    pub fn receipts(&self) -> &[TxReceipt] {
        self.journal.receipts()
    }

    pub fn validate_journal(&self) -> JournalReport {
        self.journal.validate()
    }

    // ---- Internals ----

    fn vote(&mut self, credential: Credential, in_favour: bool) -> Result<TxReceipt, LedgerError> {
        let kind = if in_favour {
            OperationKind::VoteFor
        } else {
            OperationKind::VoteAgainst
        };
        self.transact(kind, |verifier, state| {
            verifier.check_signature(&credential)?;
            if !state.proposal.executed.is_active() {
                return Err(LedgerError::AlreadyExecuted);
            }
            if state.voters.contains(&credential.user_hash) {
                return Err(LedgerError::AlreadyVoted);
            }
            let redemption = verifier.check_replay(&state.replay, &credential)?;
            Ok(Change::Vote {
                vote: Vote {
                    proposal_id: state.proposal.id,
                    voter_hash: credential.user_hash,
                    vote_type: in_favour,
                },
                redemption,
            })
        })
    }

    /// Check, digest, and journal a change, then commit it to the state.
    /// Every fallible step runs before the state is touched.
    fn transact<F>(&mut self, kind: OperationKind, check: F) -> Result<TxReceipt, LedgerError>
    where
        F: FnOnce(&CredentialVerifier, &LedgerState) -> Result<Change, LedgerError>,
    {
        let prev = *self.chain_head();
        let journaled = check(&self.verifier, &self.state).and_then(|change| {
            let receipt = self.journal.prepare(kind, chain_digest(&prev, &change)?)?;
            self.journal.append(receipt.clone())?;
            Ok((change, receipt))
        });

        match journaled {
            Ok((change, receipt)) => {
                self.state.commit(change);
                debug!(
                    op = %kind,
                    seq = receipt.seq,
                    receipt = %receipt.short_hash(),
                    "transaction applied"
                );
                Ok(receipt)
            }
            Err(error) => {
                warn!(op = %kind, %error, "transaction rejected");
                Err(error)
            }
        }
    }
}

fn snapshot_of<'a>(verifier: &'a CredentialVerifier, state: &'a LedgerState) -> LedgerSnapshot<'a> {
    LedgerSnapshot {
        authority_pk: verifier.authority_pk(),
        min_liveliness: verifier.min_liveliness(),
        state,
    }
}

impl LedgerReader for GovernanceLedger {
    fn authority_pk(&self) -> &CurvePoint {
        self.verifier.authority_pk()
    }

    fn min_liveliness(&self) -> u8 {
        self.verifier.min_liveliness()
    }

    fn sequence(&self) -> u64 {
        self.state.sequence
    }

    fn proposal(&self) -> &Proposal {
        &self.state.proposal
    }

    fn vote_count(&self) -> u64 {
        self.state.votes.len() as u64
    }

    fn comment_count(&self) -> u64 {
        self.state.comments.len() as u64
    }

    fn post_count(&self) -> u64 {
        self.state.posts.len() as u64
    }

    fn author_count(&self) -> u64 {
        self.state.authors.len() as u64
    }

    fn is_nonce_used(&self, nonce: &Nonce) -> bool {
        self.state.replay.is_nonce_used(nonce)
    }

    fn is_credential_used(&self, user_hash: &UserHash) -> bool {
        self.state.replay.is_credential_used(user_hash)
    }

    fn has_voted(&self, user_hash: &UserHash) -> bool {
        self.state.voters.contains(user_hash)
    }

    fn has_posted(&self, author: &Identity) -> bool {
        self.state.authors.contains(author)
    }
}
