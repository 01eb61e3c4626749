//! CLI entry point for `spambegone`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use spambegone::classify::{ClassificationRun, Classifier};
use spambegone::config::Config;
use spambegone::mailbox::{self, MailStore, MboxFolders};
use spambegone::model::address::EmailAddress;
use spambegone::model::envelope::{MessageEnvelope, MessageUid, Sender};
use spambegone::model::verdict::Verdict;
use spambegone::{classify, parser, report};

#[derive(Parser)]
#[command(
    name = "spambegone",
    version,
    about = "Sweep spam out of local mail folders with blacklist and whitelist rules"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: $SPAMBEGONE_CONFIG or the user config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the selected folder and move matches to the trash folder
    Scan {
        /// Directory of mbox folders (overrides the config)
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
        /// Report matches without writing metrics or moving anything
        #[arg(long)]
        dry_run: bool,
        /// Print verdicts as JSON
        #[arg(long)]
        json: bool,
    },
    /// List messages whose name or subject stays non-ASCII after normalization
    Diagnose {
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Classify a single message
    Check {
        /// `.eml` file to classify
        #[arg(required_unless_present = "from", conflicts_with_all = ["from", "subject"])]
        file: Option<PathBuf>,
        /// Sender, e.g. "Name <user@example.com>"
        #[arg(long)]
        from: Option<String>,
        #[arg(long, default_value = "")]
        subject: String,
    },
    /// Show how text is normalized and whether it is acceptable
    Normalize { text: String },
    /// List folders with message counts and sizes
    Folders {
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = spambegone::config::load_config(cli.config.as_deref())?;

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Scan {
            root,
            dry_run,
            json,
        } => cmd_scan(&config, root.as_deref(), dry_run, json),
        Commands::Diagnose { root, json } => cmd_diagnose(&config, root.as_deref(), json),
        Commands::Check {
            file,
            from,
            subject,
        } => cmd_check(&config, file.as_deref(), from.as_deref(), &subject),
        Commands::Normalize { text } => cmd_normalize(&text),
        Commands::Folders { root } => cmd_folders(&config, root.as_deref()),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = spambegone::config::log_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "spambegone.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Open the folder directory from `--root` or the config.
fn open_store(config: &Config, root: Option<&Path>) -> anyhow::Result<MboxFolders> {
    let Some(root) = root.or(config.mailbox.root.as_deref()) else {
        anyhow::bail!("No mail folder directory: pass --root or set [mailbox] root in the config");
    };
    MboxFolders::open(root)
        .with_context(|| format!("Cannot open mail folders at {}", root.display()))
}

fn progress_bar(label: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} {label} [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{eta}})"
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// The full sweep: rules, trash check, diagnostics, classification,
/// metrics, relocation.
fn cmd_scan(
    config: &Config,
    root: Option<&Path>,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let classifier = Classifier::load(&config.rules).context("Cannot load rule lists")?;
    let mut store = open_store(config, root)?;
    let mut stdout = std::io::stdout().lock();
    let select = config.mailbox.select_folder.as_str();
    let trash = config.mailbox.trash_folder.as_str();

    let trash_status = store
        .status(trash)
        .with_context(|| format!("Cannot access trash folder '{trash}'"))?;
    tracing::info!(trash, messages = trash_status.messages, "Trash folder accessible");

    if config.mailbox.show_folders && !json {
        report::write_folder_table(&mut stdout, &store.list_folders()?)?;
    }

    let selected = store.select(select)?;
    if selected.messages == 0 {
        if json {
            writeln!(stdout, "[]")?;
        } else {
            writeln!(stdout, "  No messages in {select}.")?;
        }
        return Ok(());
    }

    if !json {
        let mut found = Vec::new();
        store.fetch_envelopes(
            &mut |env| {
                found.extend(report::diagnose(&env));
                true
            },
            None,
        )?;
        if !found.is_empty() {
            report::write_diagnostics(&mut stdout, &found)?;
        }
    }

    let start = Instant::now();
    let mut run = ClassificationRun::new(&classifier);
    let pb = progress_bar("Classifying")?;
    store.fetch_envelopes(
        &mut |env| {
            run.observe(&env);
            true
        },
        Some(&|current, total| {
            pb.set_length(total);
            pb.set_position(current);
        }),
    )?;
    pb.finish_and_clear();
    tracing::info!(
        scanned = run.scanned(),
        matched = run.verdicts().len(),
        elapsed = ?start.elapsed(),
        "Classification finished"
    );

    let sorted = run.sorted_verdicts();
    if json {
        writeln!(stdout, "{}", report::verdicts_to_json(&sorted)?)?;
    } else {
        report::write_verdict_table(&mut stdout, &sorted)?;
        report::write_metrics_summary(&mut stdout, run.metrics())?;
    }

    if dry_run {
        tracing::info!("Dry run: metrics and folders left untouched");
        return Ok(());
    }

    run.metrics()
        .append_to(&config.rules.metrics, &run.started_display())?;

    if !config.mailbox.move_to_trash {
        tracing::info!("move_to_trash is disabled, skipping relocation");
        return Ok(());
    }
    let moved = mailbox::move_to_trash(&mut store, select, &run.relocation_uids(), trash)?;
    if !moved.is_complete() {
        tracing::warn!(
            requested = moved.requested,
            copied = moved.copied,
            expunged = moved.expunged,
            "Relocation incomplete"
        );
    }
    if !json {
        writeln!(
            stdout,
            "  Moved {} message(s) to {trash}; {select} now holds {}.",
            moved.expunged, moved.remaining
        )?;
    }
    Ok(())
}

fn cmd_diagnose(config: &Config, root: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let mut store = open_store(config, root)?;
    store.select(&config.mailbox.select_folder)?;

    let mut found = Vec::new();
    store.fetch_envelopes(
        &mut |env| {
            found.extend(report::diagnose(&env));
            true
        },
        None,
    )?;

    let mut stdout = std::io::stdout().lock();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&found)?)?;
    } else {
        report::write_diagnostics(&mut stdout, &found)?;
    }
    Ok(())
}

fn cmd_check(
    config: &Config,
    file: Option<&Path>,
    from: Option<&str>,
    subject: &str,
) -> anyhow::Result<()> {
    let classifier = Classifier::load(&config.rules).context("Cannot load rule lists")?;

    let envelope = match (file, from) {
        (Some(path), _) => parser::eml::parse_eml(path, MessageUid(1))?,
        (None, Some(from)) => MessageEnvelope {
            uid: MessageUid(1),
            from: Some(from)
                .filter(|f| !f.trim().is_empty())
                .map(|f| Sender::from_address(&EmailAddress::parse(f))),
            subject: subject.to_string(),
            received: Utc::now(),
        },
        (None, None) => anyhow::bail!("Give an .eml file or --from"),
    };

    let mut stdout = std::io::stdout().lock();
    match classifier.classify_message(&envelope) {
        Some(hit) => {
            let verdict = Verdict::new(&envelope, hit);
            writeln!(
                stdout,
                "TRASH code {} ({}): From: {}, Subject: {}",
                verdict.code, verdict.category, verdict.from, verdict.subject
            )?;
        }
        None => writeln!(
            stdout,
            "KEEP: From: {}, Subject: {}",
            envelope.from_display(),
            envelope.subject
        )?,
    }
    Ok(())
}

fn cmd_normalize(text: &str) -> anyhow::Result<()> {
    let normalized = classify::normalize::normalize(text);
    let acceptable = !classify::unacceptable::has_unacceptable_content(text);
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{normalized}")?;
    writeln!(
        stdout,
        "acceptable: {}, ascii after normalization: {}",
        if acceptable { "yes" } else { "no" },
        if normalized.is_ascii() { "yes" } else { "no" }
    )?;
    Ok(())
}

fn cmd_folders(config: &Config, root: Option<&Path>) -> anyhow::Result<()> {
    let store = open_store(config, root)?;
    let folders = store.list_folders()?;
    report::write_folder_table(&mut std::io::stdout().lock(), &folders)?;
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "spambegone", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::stdout().write_all(&buf)?;
    Ok(())
}
