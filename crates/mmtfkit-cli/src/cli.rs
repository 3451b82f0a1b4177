use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "MMTFKit CLI - Decode MMTF macromolecular structures and extract interactions of a chemical group within a cutoff distance.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to process structures in parallel.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract all atom pairs between a chemical group and its surroundings within a cutoff.
    Interactions(InteractionsArgs),
    /// Print a summary of one MMTF file.
    Inspect(InspectArgs),
    /// Decode an MMTF file and write it back, optionally gzip compressed.
    Convert(ConvertArgs),
    /// Cut polymer chains into sequence windows labelled with DSSP secondary structure.
    Segments(SegmentsArgs),
}

/// Arguments for the `interactions` subcommand.
#[derive(Args, Debug)]
pub struct InteractionsArgs {
    /// MMTF files to process (plain or gzip compressed).
    #[arg(required = true, num_args = 1.., value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Chemical component identifier of the target group (e.g., 'ZN', 'ATP').
    /// Overrides `search.target-group` from the config file.
    #[arg(short, long, value_name = "NAME")]
    pub group: Option<String>,

    /// Maximum interaction distance, inclusive.
    /// Overrides `search.cutoff` from the config file.
    #[arg(short, long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Path to a configuration file in TOML format.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the CSV dataset to this file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Skip structures that contain alternative atom locations.
    #[arg(long)]
    pub exclude_alt_locs: bool,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the MMTF file.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Also list every entity with its description and chains.
    #[arg(long)]
    pub entities: bool,
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Path to the input MMTF file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the re-encoded MMTF file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Gzip-compress the output.
    #[arg(long)]
    pub gzip: bool,
}

/// Arguments for the `segments` subcommand.
#[derive(Args, Debug)]
pub struct SegmentsArgs {
    /// MMTF files to process (plain or gzip compressed).
    #[arg(required = true, num_args = 1.., value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Window length in residues; must be odd so the window has a centre.
    #[arg(short, long, default_value_t = 25, value_name = "NUM")]
    pub length: usize,

    /// Write the CSV dataset to this file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interactions_accepts_multiple_inputs_and_overrides() {
        let cli = Cli::try_parse_from([
            "mmtfkit",
            "-vv",
            "interactions",
            "a.mmtf",
            "b.mmtf.gz",
            "--group",
            "ZN",
            "--cutoff",
            "3.5",
            "--exclude-alt-locs",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Interactions(args) = cli.command else {
            panic!("expected interactions command");
        };
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.group.as_deref(), Some("ZN"));
        assert_eq!(args.cutoff, Some(3.5));
        assert!(args.exclude_alt_locs);
        assert!(args.output.is_none());
    }

    #[test]
    fn interactions_requires_an_input() {
        assert!(Cli::try_parse_from(["mmtfkit", "interactions", "--group", "ZN"]).is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["mmtfkit", "-q", "-v", "inspect", "a.mmtf"]).is_err());
    }

    #[test]
    fn global_thread_option_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["mmtfkit", "inspect", "a.mmtf", "-j", "4"]).unwrap();
        assert_eq!(cli.threads, Some(4));
    }

    #[test]
    fn segments_defaults_window_length() {
        let cli = Cli::try_parse_from(["mmtfkit", "segments", "a.mmtf"]).unwrap();
        let Commands::Segments(args) = cli.command else {
            panic!("expected segments command");
        };
        assert_eq!(args.length, 25);

        let cli = Cli::try_parse_from(["mmtfkit", "segments", "a.mmtf", "-l", "11"]).unwrap();
        let Commands::Segments(args) = cli.command else {
            panic!("expected segments command");
        };
        assert_eq!(args.length, 11);
    }
}
