use std::path::PathBuf;

use civic_authority::{KeySource, DEFAULT_KEY_VAR};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "civic",
    about = "Civic: credential-gated governance ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a fresh authority key pair
    Keygen(KeygenArgs),
    /// Print the public key of an authority secret key
    Pubkey(PubkeyArgs),
    /// Issue a one-time credential for a user
    Issue(IssueArgs),
    /// Check a credential against an authority key without spending it
    Check(CheckArgs),
    /// Run a governance scenario against a fresh ledger
    Simulate(SimulateArgs),
}

/// Where to read the authority secret key from.
#[derive(Args, Clone, Debug)]
pub struct KeyArgs {
    /// File holding the hex-encoded secret key
    #[arg(long)]
    pub key_file: Option<PathBuf>,
    /// Environment variable holding the hex-encoded secret key
    #[arg(long, default_value = DEFAULT_KEY_VAR)]
    pub key_env: String,
}

impl KeyArgs {
    pub fn source(&self) -> KeySource {
        match &self.key_file {
            Some(path) => KeySource::File { path: path.clone() },
            None => KeySource::Env {
                var: self.key_env.clone(),
            },
        }
    }
}

#[derive(Args)]
pub struct KeygenArgs {
    /// Write the secret key here instead of printing it
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct PubkeyArgs {
    #[command(flatten)]
    pub key: KeyArgs,
}

#[derive(Args)]
pub struct IssueArgs {
    /// Label hashed into the user identity
    #[arg(long, conflicts_with = "user_hash", required_unless_present = "user_hash")]
    pub user: Option<String>,
    /// Precomputed 32-byte user hash, hex
    #[arg(long)]
    pub user_hash: Option<String>,
    #[arg(short, long)]
    pub liveliness: u8,
    /// Authority configuration file; overrides the key flags
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub key: KeyArgs,
    /// Refuse to issue at or below this liveliness
    #[arg(long, default_value = "0")]
    pub floor: u8,
    /// Write the credential here instead of printing it
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Credential JSON produced by `civic issue`
    pub credential: PathBuf,
    /// Authority public key JSON produced by `civic pubkey --format json`
    #[arg(long)]
    pub authority_pk: Option<PathBuf>,
    #[command(flatten)]
    pub key: KeyArgs,
    #[arg(long, default_value = "0")]
    pub min_liveliness: u8,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario TOML file
    pub scenario: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keygen() {
        let cli = Cli::try_parse_from(["civic", "keygen"]).unwrap();
        if let Command::Keygen(args) = cli.command {
            assert!(args.out.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_pubkey_defaults_to_env() {
        let cli = Cli::try_parse_from(["civic", "pubkey"]).unwrap();
        if let Command::Pubkey(args) = cli.command {
            assert_eq!(
                args.key.source(),
                KeySource::Env {
                    var: DEFAULT_KEY_VAR.into()
                }
            );
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_pubkey_from_file() {
        let cli = Cli::try_parse_from(["civic", "pubkey", "--key-file", "/tmp/k"]).unwrap();
        if let Command::Pubkey(args) = cli.command {
            assert_eq!(
                args.key.source(),
                KeySource::File {
                    path: "/tmp/k".into()
                }
            );
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_issue() {
        let cli =
            Cli::try_parse_from(["civic", "issue", "--user", "alice", "-l", "42", "--floor", "10"])
                .unwrap();
        if let Command::Issue(args) = cli.command {
            assert_eq!(args.user, Some("alice".into()));
            assert_eq!(args.liveliness, 42);
            assert_eq!(args.floor, 10);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn issue_needs_a_user() {
        assert!(Cli::try_parse_from(["civic", "issue", "-l", "42"]).is_err());
    }

    #[test]
    fn issue_user_and_hash_conflict() {
        let hash = "00".repeat(32);
        assert!(Cli::try_parse_from([
            "civic",
            "issue",
            "--user",
            "alice",
            "--user-hash",
            &hash,
            "-l",
            "1"
        ])
        .is_err());
    }

    #[test]
    fn parse_check() {
        let cli = Cli::try_parse_from([
            "civic",
            "check",
            "cred.json",
            "--authority-pk",
            "pk.json",
            "--min-liveliness",
            "5",
        ])
        .unwrap();
        if let Command::Check(args) = cli.command {
            assert_eq!(args.credential, PathBuf::from("cred.json"));
            assert_eq!(args.authority_pk, Some("pk.json".into()));
            assert_eq!(args.min_liveliness, 5);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_simulate() {
        let cli = Cli::try_parse_from(["civic", "simulate", "town-hall.toml"]).unwrap();
        assert!(matches!(cli.command, Command::Simulate(_)));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["civic", "--verbose", "keygen"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["civic", "--format", "json", "keygen"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
