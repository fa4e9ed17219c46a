//! CLI argument parsing module for pyprojkit

use crate::domain::TargetKind;
use crate::error::ConfigError;
use crate::registry::{IndexSource, PYPI_API_URL};
use crate::resolve::DEFAULT_CONCURRENCY;
use crate::scripts::DEFAULT_PYTHON;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Parse duration string in format: Nd (days), Nw (weeks), Nm (months)
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration {
        value: s.to_string(),
    };

    let trimmed = s.trim();
    let (num_str, unit) = if let Some(n) = trimmed.strip_suffix('d') {
        (n, 'd')
    } else if let Some(n) = trimmed.strip_suffix('w') {
        (n, 'w')
    } else if let Some(n) = trimmed.strip_suffix('m') {
        (n, 'm')
    } else {
        return Err(invalid());
    };

    let num: u64 = num_str.parse().map_err(|_| invalid())?;

    let unit_seconds: u64 = match unit {
        'd' => 24 * 60 * 60,      // days
        'w' => 7 * 24 * 60 * 60,  // weeks
        'm' => 30 * 24 * 60 * 60, // months (30 days)
        _ => unreachable!(),
    };
    let seconds = num.checked_mul(unit_seconds).ok_or_else(invalid)?;

    Ok(Duration::from_secs(seconds))
}

/// Python package descriptor toolkit
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pyprojkit",
    version,
    about = "Read, validate, resolve, build and install from pyproject.toml"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print identity, dependencies, scripts and build targets
    Show(PathArgs),

    /// Validate the descriptor; exits 1 on any error
    Check(PathArgs),

    /// Rewrite the descriptor in canonical form
    Fmt(FmtArgs),

    /// Resolve dependencies to concrete versions
    Resolve(ResolveArgs),

    /// Build wheel and sdist artifacts
    Build(BuildArgs),

    /// Write launchers for the console scripts
    InstallScripts(InstallArgs),
}

impl Command {
    /// Descriptor path (file or project directory)
    pub fn path(&self) -> &PathBuf {
        match self {
            Command::Show(args) | Command::Check(args) => &args.path,
            Command::Fmt(args) => &args.target.path,
            Command::Resolve(args) => &args.target.path,
            Command::Build(args) => &args.target.path,
            Command::InstallScripts(args) => &args.target.path,
        }
    }

    /// Whether the command runs without touching the filesystem
    pub fn is_dry_run(&self) -> bool {
        match self {
            Command::Fmt(args) => args.dry_run || args.check,
            Command::InstallScripts(args) => args.dry_run,
            _ => false,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PathArgs {
    /// pyproject.toml or the directory containing it
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct FmtArgs {
    #[command(flatten)]
    pub target: PathArgs,

    /// Exit 1 if the file is not canonical; never write
    #[arg(long)]
    pub check: bool,

    /// Dry run mode - show what would change without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub target: PathArgs,

    /// Include an optional dependency group (can be specified multiple times)
    #[arg(long = "group", short = 'g', action = ArgAction::Append)]
    pub groups: Vec<String>,

    /// Allow pre-release versions
    #[arg(long)]
    pub pre: bool,

    /// Only use versions released at least this long ago (e.g., 2w, 10d, 1m)
    #[arg(long, value_parser = parse_duration)]
    pub min_age: Option<Duration>,

    /// Read releases from a local JSON index file instead of the network
    #[arg(long, value_name = "FILE")]
    pub index: Option<PathBuf>,

    /// Base URL of a PyPI-compatible JSON API
    #[arg(long, value_name = "URL", env = "PYPROJKIT_INDEX_URL", default_value = PYPI_API_URL)]
    pub index_url: String,

    /// Maximum number of concurrent index queries
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
}

impl ResolveArgs {
    /// A local index file takes precedence over the URL
    pub fn index_source(&self) -> IndexSource {
        match self.index {
            Some(ref path) => IndexSource::File(path.clone()),
            None => IndexSource::Remote {
                base_url: self.index_url.clone(),
            },
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub target: PathArgs,

    /// Output directory (default: dist/ under the project root)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Build only the wheel
    #[arg(long, conflicts_with = "sdist")]
    pub wheel: bool,

    /// Build only the source distribution
    #[arg(long)]
    pub sdist: bool,
}

impl BuildArgs {
    /// Artifact kinds requested on the command line
    pub fn kinds(&self) -> Vec<TargetKind> {
        if self.wheel {
            vec![TargetKind::Wheel]
        } else if self.sdist {
            vec![TargetKind::Sdist]
        } else {
            TargetKind::all().to_vec()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InstallArgs {
    #[command(flatten)]
    pub target: PathArgs,

    /// Directory the launchers are written to
    #[arg(long, value_name = "DIR")]
    pub bin: PathBuf,

    /// Interpreter used in the launcher shebang
    #[arg(long, env = "PYPROJKIT_PYTHON", default_value = DEFAULT_PYTHON)]
    pub python: String,

    /// Dry run mode - list launchers without writing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(args)
    }

    #[test]
    fn test_show_default_path() {
        let args = parse(&["pyprojkit", "show"]);
        assert!(matches!(args.command, Command::Show(_)));
        assert_eq!(args.command.path(), &PathBuf::from("."));
        assert!(!args.json);
        assert!(!args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["pyprojkit", "check", "some/dir", "--json", "-q"]);
        assert!(args.json);
        assert!(args.quiet);
        assert_eq!(args.command.path(), &PathBuf::from("some/dir"));
    }

    #[test]
    fn test_fmt_flags() {
        let args = parse(&["pyprojkit", "fmt", "--check"]);
        match args.command {
            Command::Fmt(ref fmt) => {
                assert!(fmt.check);
                assert!(!fmt.dry_run);
            }
            _ => panic!("expected fmt"),
        }
        assert!(args.command.is_dry_run());

        let args = parse(&["pyprojkit", "fmt", "-n"]);
        assert!(args.command.is_dry_run());
    }

    #[test]
    fn test_resolve_args() {
        let args = parse(&[
            "pyprojkit",
            "resolve",
            "--group",
            "dev",
            "-g",
            "docs",
            "--pre",
            "--min-age",
            "2w",
            "--index",
            "index.json",
        ]);
        let Command::Resolve(resolve) = args.command else {
            panic!("expected resolve");
        };
        assert_eq!(resolve.groups, vec!["dev", "docs"]);
        assert!(resolve.pre);
        assert_eq!(resolve.min_age, Some(Duration::from_secs(14 * 24 * 60 * 60)));
        assert_eq!(resolve.concurrency, 10);
        assert_eq!(
            resolve.index_source(),
            IndexSource::File(PathBuf::from("index.json"))
        );
    }

    #[test]
    fn test_resolve_index_url() {
        let args = parse(&[
            "pyprojkit",
            "resolve",
            "--index-url",
            "https://mirror.example.com/pypi",
        ]);
        let Command::Resolve(resolve) = args.command else {
            panic!("expected resolve");
        };
        assert_eq!(
            resolve.index_source(),
            IndexSource::Remote {
                base_url: "https://mirror.example.com/pypi".to_string()
            }
        );
    }

    #[test]
    fn test_build_kinds() {
        let Command::Build(build) = parse(&["pyprojkit", "build"]).command else {
            panic!("expected build");
        };
        assert_eq!(build.kinds(), vec![TargetKind::Sdist, TargetKind::Wheel]);
        assert!(build.out.is_none());

        let Command::Build(build) = parse(&["pyprojkit", "build", "--wheel", "--out", "o"]).command
        else {
            panic!("expected build");
        };
        assert_eq!(build.kinds(), vec![TargetKind::Wheel]);
        assert_eq!(build.out, Some(PathBuf::from("o")));
    }

    #[test]
    fn test_build_wheel_conflicts_with_sdist() {
        let result = CliArgs::try_parse_from(["pyprojkit", "build", "--wheel", "--sdist"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_install_scripts_requires_bin() {
        assert!(CliArgs::try_parse_from(["pyprojkit", "install-scripts"]).is_err());

        let args = parse(&["pyprojkit", "install-scripts", "--bin", "out/bin", "-n"]);
        let Command::InstallScripts(install) = args.command else {
            panic!("expected install-scripts");
        };
        assert_eq!(install.bin, PathBuf::from("out/bin"));
        assert!(install.dry_run);
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(CliArgs::try_parse_from(["pyprojkit"]).is_err());
    }

    #[test]
    fn test_parse_duration_days() {
        assert_eq!(
            parse_duration("10d").unwrap(),
            Duration::from_secs(10 * 24 * 60 * 60)
        );
    }

    #[test]
    fn test_parse_duration_months() {
        assert_eq!(
            parse_duration("1m").unwrap(),
            Duration::from_secs(30 * 24 * 60 * 60)
        );
    }

    #[test]
    fn test_parse_duration_invalid() {
        let err = parse_duration("5y").unwrap_err();
        assert!(err.to_string().contains("invalid duration format '5y'"));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("xd").is_err());
        assert!(parse_duration("5y").is_err());
    }

    #[test]
    fn test_parse_duration_overflow() {
        let err = parse_duration("99999999999999999m").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration { .. }));
        assert!(parse_duration(&format!("{}d", u64::MAX)).is_err());
    }
}
