use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use civic_authority::AuthorityService;
use civic_crypto::{SecretKey, SecretKeyProvider, StaticKeyProvider};
use civic_ledger::{
    Clock, GenesisConfig, GovernanceLedger, LedgerSnapshot, ManualClock, Transaction, TxReceipt,
};
use civic_types::{Identity, UserHash};
use serde::{Deserialize, Serialize};

/// A scripted run: one authority, one proposal, and an ordered list of
/// actions against it.
#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    /// Hex-encoded authority secret key.
    pub authority_key: String,
    /// Starting value of the clock that stamps comments.
    #[serde(default)]
    pub clock_start: u64,
    #[serde(default)]
    pub genesis: GenesisConfig,
    #[serde(default)]
    pub actions: Vec<Action>,
}

fn default_liveliness() -> u8 {
    100
}

/// One scripted step. Credentials are issued on the fly for `user`, so the
/// same user always presents the same credential.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Action {
    VoteFor {
        user: String,
        #[serde(default = "default_liveliness")]
        liveliness: u8,
    },
    VoteAgainst {
        user: String,
        #[serde(default = "default_liveliness")]
        liveliness: u8,
    },
    Comment {
        user: String,
        #[serde(default = "default_liveliness")]
        liveliness: u8,
        text: String,
    },
    Post {
        user: String,
        #[serde(default = "default_liveliness")]
        liveliness: u8,
        author: String,
        text: String,
        #[serde(default)]
        timestamp: u64,
    },
    Execute {
        /// Hex key of the caller; the authority itself when absent.
        #[serde(default)]
        caller_key: Option<String>,
    },
    Advance {
        seconds: u64,
    },
}

impl Action {
    pub fn label(&self) -> String {
        match self {
            Self::VoteFor { user, .. } => format!("vote-for {user}"),
            Self::VoteAgainst { user, .. } => format!("vote-against {user}"),
            Self::Comment { user, .. } => format!("comment {user}"),
            Self::Post { user, author, .. } => format!("post {user} as {author}"),
            Self::Execute { caller_key: None } => "execute".into(),
            Self::Execute { caller_key: Some(_) } => "execute (foreign caller)".into(),
            Self::Advance { seconds } => format!("advance {seconds}s"),
        }
    }
}

impl Scenario {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("invalid scenario")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&contents)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum StepOutcome {
    Applied { seq: u64, receipt: String },
    Rejected { reason: String },
    ClockAdvanced { now: u64 },
}

#[derive(Clone, Debug, Serialize)]
pub struct Step {
    pub index: usize,
    pub action: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Ledger and step log after a scenario has run.
pub struct Simulation {
    pub ledger: GovernanceLedger,
    pub steps: Vec<Step>,
}

#[derive(Serialize)]
pub struct SimulationReport<'a> {
    pub steps: &'a [Step],
    pub ledger: LedgerSnapshot<'a>,
    pub state_digest: String,
    pub chain_head: String,
    pub receipts: usize,
    pub journal_valid: bool,
}

impl Simulation {
    pub fn report(&self) -> anyhow::Result<SimulationReport<'_>> {
        Ok(SimulationReport {
            steps: &self.steps,
            ledger: self.ledger.snapshot(),
            state_digest: hex::encode(self.ledger.state_digest()?),
            chain_head: hex::encode(self.ledger.chain_head()),
            receipts: self.ledger.receipts().len(),
            journal_valid: self.ledger.validate_journal().is_valid(),
        })
    }
}

/// Run every action in order. Rejections are recorded as steps, not
/// returned; only a broken scenario setup is an error.
pub fn run(scenario: &Scenario) -> anyhow::Result<Simulation> {
    let authority = StaticKeyProvider::new(
        SecretKey::from_hex(&scenario.authority_key).context("invalid authority_key")?,
    );
    let issuer = AuthorityService::new(authority.clone(), 0)?;
    let clock = Arc::new(ManualClock::new(scenario.clock_start));
    let mut ledger =
        GovernanceLedger::genesis(scenario.genesis.clone(), &authority)?.with_clock(clock.clone());

    let mut steps = Vec::with_capacity(scenario.actions.len());
    for (index, action) in scenario.actions.iter().enumerate() {
        let outcome = match action {
            Action::Advance { seconds } => {
                clock.advance(*seconds);
                StepOutcome::ClockAdvanced {
                    now: clock.now(),
                }
            }
            _ => match apply(&mut ledger, &issuer, &authority, action) {
                Ok(receipt) => StepOutcome::Applied {
                    seq: receipt.seq,
                    receipt: receipt.short_hash(),
                },
                Err(e) => StepOutcome::Rejected {
                    reason: e.to_string(),
                },
            },
        };
        steps.push(Step {
            index,
            action: action.label(),
            outcome,
        });
    }

    Ok(Simulation { ledger, steps })
}

fn apply(
    ledger: &mut GovernanceLedger,
    issuer: &AuthorityService<StaticKeyProvider>,
    authority: &StaticKeyProvider,
    action: &Action,
) -> anyhow::Result<TxReceipt> {
    let issue = |user: &str, liveliness: u8| issuer.issue(UserHash::from_label(user), liveliness);

    let receipt = match action {
        Action::VoteFor { user, liveliness } => {
            ledger.apply(Transaction::VoteFor(issue(user.as_str(), *liveliness)?))?
        }
        Action::VoteAgainst { user, liveliness } => {
            ledger.apply(Transaction::VoteAgainst(issue(user.as_str(), *liveliness)?))?
        }
        Action::Comment {
            user,
            liveliness,
            text,
        } => ledger.apply(Transaction::Comment {
            text: text.clone(),
            credential: issue(user.as_str(), *liveliness)?,
        })?,
        Action::Post {
            user,
            liveliness,
            author,
            text,
            timestamp,
        } => ledger.apply(Transaction::Post {
            message: text.clone(),
            timestamp: *timestamp,
            author: Identity::from_label(author),
            credential: issue(user.as_str(), *liveliness)?,
        })?,
        Action::Execute { caller_key } => {
            let caller: Box<dyn SecretKeyProvider> = match caller_key {
                Some(key) => Box::new(StaticKeyProvider::new(SecretKey::from_hex(key)?)),
                None => Box::new(authority.clone()),
            };
            ledger.apply(Transaction::Execute {
                caller: &*caller,
            })?
        }
        Action::Advance { .. } => anyhow::bail!("clock advances do not touch the ledger"),
    };
    Ok(receipt)
}
