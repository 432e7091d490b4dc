//! portmask CLI
//!
//! Command-line front end for the masking engine: compare versions, test
//! atoms against packages and ask why a package is (not) visible.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::{
    ConfigLoader, EngineSettings, MaskFlags, MaskRuleSet, Package, PackageAtom, VersionSpec,
    VisibilityResolver,
};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "portmask",
    about = "Portage-style version matching and package visibility",
    version,
    author
)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, global = true, env = "PORTMASK_CONFIG")]
    config: Option<PathBuf>,

    /// Configuration root containing etc/portage
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Host architecture keyword
    #[arg(long, global = true)]
    arch: Option<String>,

    /// Profile folder, instead of etc/portage/make.profile
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether `<a> <op> <b>` holds
    Compare(CompareArgs),
    /// Test an atom against a package
    Match(MatchArgs),
    /// Classify a package against the loaded rules
    Visibility(VisibilityArgs),
    /// Show how many rules were loaded
    Rules,
}

#[derive(Args)]
struct CompareArgs {
    /// Left-hand version
    a: String,
    /// One of <, <=, =, ~, >=, >
    op: String,
    /// Right-hand version
    b: String,
}

#[derive(Args)]
struct MatchArgs {
    /// Atom expression (e.g. ">=dev-lang/python-3.10:3.*")
    atom: String,
    /// Package as category/name-version
    cpv: String,
    /// Package slot, optionally slot/subslot
    #[arg(long, default_value = "0")]
    slot: String,
    /// Package subslot
    #[arg(long)]
    subslot: Option<String>,
}

#[derive(Args)]
struct VisibilityArgs {
    /// Package as category/name-version
    cpv: String,
    /// Package KEYWORDS (e.g. "amd64 ~arm64")
    #[arg(short, long, default_value = "")]
    keywords: String,
    /// Package slot, optionally slot/subslot
    #[arg(long, default_value = "0")]
    slot: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let result = match &cli.command {
        Commands::Compare(args) => cmd_compare(args),
        Commands::Match(args) => cmd_match(args),
        Commands::Visibility(args) => {
            load_settings(&cli).and_then(|settings| cmd_visibility(&settings, args))
        }
        Commands::Rules => load_settings(&cli).map(|settings| cmd_rules(&settings)),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Settings file, then environment, then command-line flags
fn load_settings(cli: &Cli) -> Result<EngineSettings> {
    let mut settings = match &cli.config {
        Some(path) => EngineSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => EngineSettings::default(),
    };
    settings.apply_env();

    if let Some(root) = &cli.root {
        settings.config_root = root.clone();
    }
    if let Some(arch) = &cli.arch {
        settings.arch = arch.clone();
    }
    if let Some(profile) = &cli.profile {
        settings.profile = Some(profile.clone());
    }

    settings.validate()?;
    debug!("Using settings: {:?}", settings);
    Ok(settings)
}

fn load_rules(settings: &EngineSettings) -> MaskRuleSet {
    ConfigLoader::new(settings.clone()).load()
}

fn cmd_compare(args: &CompareArgs) -> Result<bool> {
    let a = VersionSpec::parse(&args.a);
    let b = VersionSpec::parse(&args.b);
    args.op.parse::<config::Operator>()?;

    let holds = b.match_op(&args.op, &a);
    println!("{} {} {}: {}", a, args.op, b, verdict(holds));
    Ok(holds)
}

fn cmd_match(args: &MatchArgs) -> Result<bool> {
    let atom = PackageAtom::parse(&args.atom)?;
    let mut pkg = Package::parse_cpv(&args.cpv)?.with_slot(&args.slot);
    if let Some(subslot) = &args.subslot {
        pkg = pkg.with_subslot(subslot.as_str());
    }

    let holds = atom.matches_package(&pkg);
    println!(
        "{} ({}) vs {}: {}",
        atom,
        atom.kind().name(),
        pkg,
        verdict(holds)
    );
    Ok(holds)
}

fn cmd_visibility(settings: &EngineSettings, args: &VisibilityArgs) -> Result<bool> {
    let pkg = Package::parse_cpv(&args.cpv)?
        .with_slot(&args.slot)
        .with_keywords(args.keywords.as_str());

    let rules = load_rules(settings);
    let resolver = VisibilityResolver::new(&rules, settings.arch.as_str());
    let flags = resolver.is_masked(&pkg);

    let label = if flags.is_visible() {
        style(flags.to_string()).green().bold()
    } else if flags.contains(MaskFlags::HARD_MASK) {
        style(flags.to_string()).red().bold()
    } else {
        style(flags.to_string()).yellow()
    };
    println!("{} [{}]: {} ({})", pkg, settings.arch, label, flags.bits());
    Ok(flags.is_visible())
}

fn cmd_rules(settings: &EngineSettings) -> bool {
    let rules = load_rules(settings);
    println!(
        "{} {}",
        style("Rules from").bold(),
        settings.portage_dir().display()
    );
    println!("{}", rules.stats());
    true
}

fn verdict(holds: bool) -> console::StyledObject<&'static str> {
    if holds {
        style("true").green()
    } else {
        style("false").red()
    }
}
