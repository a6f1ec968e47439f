use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{error::ErrorKind, value_parser, CommandFactory, Parser, ValueEnum};

use dvframe::{Modulation, Polarity, SyncFamily};

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program accepts a stream of demodulated symbols and decodes any P25 Phase 1, DMR, X2-TDMA, D-STAR, NXDN, or ProVoice frames that are present. Each frame is summarized on one line.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program accepts a stream of demodulated symbols and decodes any P25 Phase 1, DMR, X2-TDMA, D-STAR, NXDN, or ProVoice frames that are present. Each frame is summarized on one line.

The input is either

  * --format dibit: one byte per symbol, with the symbol (0 to 3) in
    the two least-significant bits; or

  * --format s16: one signed 16-bit native-endian soft symbol per
    symbol period, as from a discriminator tap which has been
    downsampled to the symbol rate.

Voice frames may be saved for later decoding with --mbe-out-dir. One file is written per call.

Arguments which follow "--" will be used to spawn a child process whenever the scanner should resume: after more than --resume terminators, or on any control or data frame when --resume is nonzero.

    dvdec --file capture.bin --resume 2 -- ./next-channel.sh

The child process receives the following environment variables which describe the last frame:

  DVDEC_SYNC="+P25p1" (sync type)
  DVDEC_NAC="293" (P25 network access code, hex)
  DVDEC_TG="100" (talkgroup)
  DVDEC_SRC="1234" (source radio)

The child process is awaited before decoding continues.
"#;

const ADVANCED: &str = "Advanced Options";

/// Input symbol format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    /// One byte per dibit
    Dibit,
    /// Signed 16-bit soft symbols
    S16,
}

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even frame summaries
    #[arg(short, long)]
    pub quiet: bool,

    /// Input file (or "-" for stdin)
    #[arg(long, default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// Input symbol format
    #[arg(long, value_enum, default_value_t = InputFormat::Dibit)]
    pub format: InputFormat,

    /// Show the input signal level (requires -v)
    #[arg(long)]
    pub error_bars: bool,

    /// Show P25 NAC, source, and talkgroup
    #[arg(long)]
    pub p25_status: bool,

    /// Resume scanning after N terminators (0 to disable)
    #[arg(long, default_value_t = 0)]
    pub resume: u32,

    /// Save voice frames to MBE files in DIR
    ///
    /// The directory must already exist.
    #[arg(long, value_name = "DIR")]
    pub mbe_out_dir: Option<PathBuf>,

    /// RF modulation (c4fm, qpsk, gfsk)
    #[arg(long, default_value = "c4fm", value_parser = Modulation::from_str)]
    pub modulation: Modulation,

    /// Permitted dibit errors in sync words (<5)
    #[arg(long, default_value_t = 0)]
    #[arg(value_parser = value_parser!(u32).range(0..5))]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub sync_max_errors: u32,

    /// Signal polarity (auto, normal, inverted)
    #[arg(long, default_value = "auto", value_parser = Polarity::from_str)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub polarity: Polarity,

    /// Decode only these standards (comma-separated)
    ///
    /// Any of: p25, x2tdma, dstar, dstar-hd, nxdn, dmr, provoice.
    /// The default is all of them.
    #[arg(long, value_delimiter = ',', value_parser = SyncFamily::from_str)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub only: Vec<SyncFamily>,

    /// Symbol slicer bandwidth, for s16 input (fsym)
    #[arg(long, default_value_t = 0.01)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = ADVANCED)]
    pub slicer_bw: f32,

    /// Spawn child process when the scan should resume. Optional.
    ///
    /// Arguments are provided VERBATIM to the child process
    /// without shell interpretation.
    #[arg(last = true)]
    pub child: Vec<String>,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
    }
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}
