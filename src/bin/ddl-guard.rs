//! ddl-guard CLI
//!
//! Patches a generated migration in place:
//!
//! ```text
//! ddl-guard wrap prisma/migrations/20240101120000_init/migration.sql --backup
//! ddl-guard check --latest prisma/migrations
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use ddl_guard::{audit, realign, Audit, Config, MigrationFile, StatementKind};

#[derive(Parser)]
#[command(name = "ddl-guard", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./ddl-guard.toml, then the user config dir)
    #[arg(short, long, global = true, env = "DDL_GUARD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Wrap CREATE TABLE / INDEX / TYPE statements in idempotency guards
    Wrap {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        write: WriteArgs,
        /// Write even if the result still fails the audit
        #[arg(long)]
        force: bool,
        /// Print stats as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fix guard blocks that catch the wrong error code
    Realign {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        write: WriteArgs,
    },
    /// Remove lines matching the configured or given patterns
    Prune {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        write: WriteArgs,
        /// Regular expression for lines to drop (repeatable)
        #[arg(short, long = "pattern")]
        patterns: Vec<String>,
    },
    /// Report unguarded statements and mismatched handlers
    Check {
        #[command(flatten)]
        target: Target,
        /// Print the audit as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct Target {
    /// Migration file to patch
    path: Option<PathBuf>,
    /// Use the newest migration.sql under this directory
    #[arg(long, conflicts_with = "path")]
    latest: Option<PathBuf>,
}

#[derive(Args)]
struct WriteArgs {
    /// Write the result here instead of overwriting the input
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Keep a timestamped copy of the original beside it
    #[arg(long)]
    backup: bool,
    /// Show what would change without writing
    #[arg(long)]
    dry_run: bool,
}

impl Target {
    fn resolve(&self, config: &Config) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let dir = self
            .latest
            .as_ref()
            .or(config.latest_dir.as_ref())
            .context("No migration given: pass a PATH or --latest <DIR>")?;
        Ok(MigrationFile::latest_in(dir)?)
    }

    fn open(&self, config: &Config) -> Result<MigrationFile> {
        let path = self.resolve(config)?;
        MigrationFile::open(&path)
            .with_context(|| format!("Failed to read migration {}", path.display()))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::discover(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Wrap {
            target,
            write,
            force,
            json,
        } => cmd_wrap(&config, &target, &write, force, json),
        Commands::Realign { target, write } => cmd_realign(&config, &target, &write),
        Commands::Prune {
            target,
            write,
            patterns,
        } => cmd_prune(&config, &target, &write, &patterns),
        Commands::Check { target, json } => cmd_check(&config, &target, json),
    }
}

fn cmd_wrap(config: &Config, target: &Target, write: &WriteArgs, force: bool, json: bool) -> Result<()> {
    let file = target.open(config)?;
    status(json, "🛡  Wrapping DDL statements".cyan().bold());
    print_file(&file, json);
    let out = config.wrapper().wrap(file.lines());

    if json {
        println!("{}", serde_json::to_string_pretty(&out.stats)?);
    } else {
        for kind in StatementKind::ALL {
            let count = out.stats.count(kind);
            if count > 0 {
                println!("  {} {} {}", "✓".green(), count, kind);
            }
        }
        if out.stats.already_wrapped > 0 {
            println!(
                "  {} {} already guarded",
                "•".dimmed(),
                out.stats.already_wrapped
            );
        }
        for u in &out.stats.unresolved {
            println!(
                "  {} unterminated {} \"{}\" at line {} left unchanged",
                "⚠".yellow(),
                u.kind,
                u.name,
                u.line
            );
        }
    }

    if out.stats.is_noop() {
        status(json, "✓ Nothing to wrap".green());
        return persist(&file, &out.lines, write, json);
    }

    let report = audit(&out.lines, config.wrapper().codes());
    if !report.is_clean() && !force {
        print_audit(&report, json);
        anyhow::bail!("Wrapped output still fails the audit; rerun with --force to write anyway");
    }

    persist(&file, &out.lines, write, json)
}

fn cmd_realign(config: &Config, target: &Target, write: &WriteArgs) -> Result<()> {
    println!("{}", "🔧 Realigning exception handlers".cyan().bold());
    let file = target.open(config)?;
    print_file(&file, false);
    let out = realign(file.lines(), &config.codes);

    if out.fixed.is_empty() {
        println!("{}", "✓ All handlers already match".green());
    }
    for m in &out.fixed {
        println!(
            "  {} line {}: {} {} → {}",
            "✓".green(),
            m.line,
            m.kind,
            m.found.red(),
            m.expected.green()
        );
    }

    persist(&file, &out.lines, write, false)
}

fn cmd_prune(config: &Config, target: &Target, write: &WriteArgs, patterns: &[String]) -> Result<()> {
    println!("{}", "✂  Pruning lines".cyan().bold());
    let pruner = config.pruner(patterns)?;
    if pruner.is_empty() {
        anyhow::bail!("No patterns: pass --pattern or set `prune` in the config");
    }
    let file = target.open(config)?;
    print_file(&file, false);
    let out = pruner.prune(file.lines());

    if out.removed.is_empty() {
        println!("{}", "✓ No matching lines".green());
    }
    for removed in &out.removed {
        println!("  {} {:>5}: {}", "-".red(), removed.line, removed.text.red());
    }

    persist(&file, &out.lines, write, false)
}

fn cmd_check(config: &Config, target: &Target, json: bool) -> Result<()> {
    let file = target.open(config)?;
    let report = audit(file.lines(), &config.codes);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_file(&file, json);
        print_audit(&report, json);
    }

    if !report.is_clean() {
        anyhow::bail!("{} needs patching", file.path().display());
    }
    status(json, "✓ Migration is safe to re-run".green());
    Ok(())
}

/// Progress line; goes to stderr when stdout carries JSON.
fn status(json: bool, msg: impl std::fmt::Display) {
    if json {
        eprintln!("{}", msg);
    } else {
        println!("{}", msg);
    }
}

fn print_file(file: &MigrationFile, json: bool) {
    status(json, format!("  {} {}", "File:".dimmed(), file.path().display()));
}

fn print_audit(report: &Audit, json: bool) {
    status(
        json,
        format!(
            "  Guarded: {}  Unguarded: {}  Wrong handlers: {}",
            report.guarded.to_string().green(),
            report.unwrapped.to_string().yellow(),
            report.mismatched_handlers.len().to_string().red()
        ),
    );
    for m in &report.mismatched_handlers {
        status(
            json,
            format!(
                "    line {}: {} catches {} (expected {})",
                m.line, m.kind, m.found, m.expected
            ),
        );
    }
    for u in &report.unresolved {
        status(
            json,
            format!(
                "    {} unterminated {} \"{}\" at line {}",
                "⚠".yellow(),
                u.kind,
                u.name,
                u.line
            ),
        );
    }
}

/// Write `lines` in place when they changed, or to `--output` whenever given.
fn persist(file: &MigrationFile, lines: &[String], write: &WriteArgs, json: bool) -> Result<()> {
    if write.dry_run {
        status(
            json,
            format!(
                "{} Dry run: {} → {} lines, nothing written",
                "💡".yellow(),
                file.lines().len(),
                lines.len()
            ),
        );
        return Ok(());
    }

    match &write.output {
        Some(path) => {
            file.write_to(path, lines)?;
            status(json, format!("{} {}", "Saved to:".green(), path.display()));
        }
        None if file.is_changed(lines) => {
            if write.backup {
                let backup = file.backup().context("Failed to back up migration")?;
                status(json, format!("  {} {}", "Backup:".dimmed(), backup.display()));
            }
            file.write(lines)?;
            status(json, format!("{} {}", "Updated:".green(), file.path().display()));
        }
        None => {}
    }
    Ok(())
}
