use std::path::Path;

use anyhow::Context;
use civic_authority::{AuthorityConfig, AuthorityService};
use civic_crypto::{derive_public_key, KeyPair, SecretKeyProvider};
use civic_ledger::{
    Credential, CredentialVerifier, LedgerReader, ProposalStatus, ReplayGuard,
};
use civic_types::{CurvePoint, UserHash};
use colored::Colorize;
use serde::Serialize;

use crate::cli::*;
use crate::scenario::{self, Scenario, StepOutcome};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Keygen(args) => cmd_keygen(args, &format),
        Command::Pubkey(args) => cmd_pubkey(args, &format),
        Command::Issue(args) => cmd_issue(args, &format),
        Command::Check(args) => cmd_check(args, &format),
        Command::Simulate(args) => cmd_simulate(args, &format),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn hex_point(pk: &CurvePoint) -> String {
    format!("04{}{}", hex::encode(pk.x), hex::encode(pk.y))
}

fn cmd_keygen(args: KeygenArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let pair = KeyPair::generate();
    let secret_hex = hex::encode(pair.secret.as_bytes());

    if let Some(path) = &args.out {
        std::fs::write(path, format!("{secret_hex}\n"))
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    let printed_secret = args.out.is_none().then_some(secret_hex);

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "public_key": pair.public,
            "secret_key": printed_secret,
            "written_to": args.out,
        })),
        OutputFormat::Text => {
            println!("{} Generated authority key", "✓".green().bold());
            println!("  Public key: {}", hex_point(&pair.public).cyan());
            match (&args.out, printed_secret) {
                (Some(path), _) => println!("  Secret key: written to {}", path.display()),
                (None, Some(secret)) => println!("  Secret key: {}", secret.yellow()),
                (None, None) => {}
            }
            Ok(())
        }
    }
}

fn cmd_pubkey(args: PubkeyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let provider = args.key.source().provider()?;
    let pk = derive_public_key(&provider.secret_key()?)?;
    match format {
        OutputFormat::Json => print_json(&pk),
        OutputFormat::Text => {
            println!("{}", hex_point(&pk));
            Ok(())
        }
    }
}

fn cmd_issue(args: IssueArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => AuthorityConfig::load(path)?,
        None => AuthorityConfig {
            key: args.key.source(),
            floor: args.floor,
            expected_pk: None,
        },
    };
    let service = AuthorityService::from_config(&config)?;

    let user_hash = match (&args.user, &args.user_hash) {
        (_, Some(hash)) => UserHash::from_hex(hash).context("invalid --user-hash")?,
        (Some(label), None) => UserHash::from_label(label),
        (None, None) => anyhow::bail!("either --user or --user-hash is required"),
    };
    let credential = service.issue(user_hash, args.liveliness)?;

    if let Some(path) = &args.out {
        std::fs::write(path, serde_json::to_string_pretty(&credential)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    match format {
        OutputFormat::Json if args.out.is_none() => print_json(&credential),
        OutputFormat::Json => print_json(&serde_json::json!({ "written_to": args.out })),
        OutputFormat::Text => {
            println!("{} Credential issued", "✓".green().bold());
            println!("  User: {}", user_hash.to_hex().cyan());
            println!("  Liveliness: {}", credential.liveliness);
            println!(
                "  Nonce: {}",
                credential.authority_signature.nonce.short_id().yellow()
            );
            match &args.out {
                Some(path) => println!("  Written to {}", path.display()),
                None => println!("{}", serde_json::to_string_pretty(&credential)?),
            }
            Ok(())
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn cmd_check(args: CheckArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let credential: Credential = read_json(&args.credential)?;
    let authority_pk = match &args.authority_pk {
        Some(path) => read_json::<CurvePoint>(path)?,
        None => derive_public_key(&args.key.source().provider()?.secret_key()?)?,
    };

    let verifier = CredentialVerifier::new(authority_pk, args.min_liveliness);
    let result = verifier.check(&ReplayGuard::new(), &credential);

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "user_hash": credential.user_hash,
            "valid": result.is_ok(),
            "reason": result.as_ref().err().map(|e| e.to_string()),
        }))?,
        OutputFormat::Text => match &result {
            Ok(_) => println!(
                "{} Credential for {} is valid",
                "✓".green().bold(),
                credential.user_hash.short_id()
            ),
            Err(e) => println!(
                "{} Credential for {} rejected: {}",
                "✗".red().bold(),
                credential.user_hash.short_id(),
                e
            ),
        },
    }

    result.map(|_| ()).context("credential check failed")
}

fn cmd_simulate(args: SimulateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let simulation = scenario::run(&scenario)?;

    if let OutputFormat::Json = format {
        return print_json(&simulation.report()?);
    }

    for step in &simulation.steps {
        let index = format!("#{}", step.index + 1).dimmed();
        match &step.outcome {
            StepOutcome::Applied { seq, receipt } => println!(
                "{index} {} {}  r#{seq} {}",
                "✓".green(),
                step.action,
                receipt.yellow()
            ),
            StepOutcome::Rejected { reason } => {
                println!("{index} {} {}  {}", "✗".red(), step.action, reason.red())
            }
            StepOutcome::ClockAdvanced { now } => {
                println!("{index} {} {}  now={now}", "·".dimmed(), step.action)
            }
        }
    }

    let ledger = &simulation.ledger;
    let proposal = ledger.proposal();
    let status = match proposal.executed {
        ProposalStatus::Active => "Active".yellow(),
        ProposalStatus::Passed => "Passed".green().bold(),
        ProposalStatus::Rejected => "Rejected".red().bold(),
    };
    println!();
    println!("Proposal #{}: {} [{}]", proposal.id, proposal.description, status);
    println!(
        "  Votes: {} for, {} against",
        proposal.votes_for, proposal.votes_against
    );
    println!(
        "  Comments: {}, posts: {} by {} author(s)",
        ledger.comment_count(),
        ledger.post_count(),
        ledger.author_count()
    );

    let report = ledger.validate_journal();
    let integrity = if report.is_valid() {
        "✓".green()
    } else {
        "✗".red()
    };
    println!(
        "  Journal: {} receipts, integrity {}",
        report.receipt_count, integrity
    );
    println!(
        "  State digest: {}",
        hex::encode(ledger.state_digest()?).cyan()
    );
    println!("  Chain head: {}", hex::encode(ledger.chain_head()).cyan());
    Ok(())
}
