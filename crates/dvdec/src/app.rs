//! Frame loop and scan control
//!
//! Every frame is summarized on standard output. When the
//! receiver asks the scanner to resume, the child process, if
//! any, is spawned and run to completion before decoding
//! continues. Repeated requests within one run of terminator
//! frames spawn one child each.
//!
//! The loop exits when the input is exhausted.

use log::{debug, error, info, warn};

use dvframe::{DataRecord, DibitSource, FrameReport, Receiver};

use crate::cli::Args;
use crate::spawner;

/// Run the application
///
/// Runs the `dvdec` frame loop with the given command-line
/// `args`, a fully-initialized `receiver`, and a `source`
/// which supplies dibits until it is exhausted.
pub fn run<S>(args: &Args, receiver: &mut Receiver, source: S)
where
    S: DibitSource,
{
    let cfg = Config {
        child_args: args.child.iter().map(|s| s.as_str()).collect(),
        quiet: args.quiet,
    };

    let mut frames = 0u64;
    for report in receiver.iter(source) {
        frames += 1;
        if !cfg.quiet {
            println!("{}", report);
        }

        log_records(&report);

        if report.resume_scan() {
            resume_scan(&cfg, &report);
        }
    }

    info!("input exhausted after {} frames", frames);
}

/// Configuration
#[derive(Clone, Debug)]
struct Config<'args> {
    child_args: Vec<&'args str>,
    quiet: bool,
}

// Report data which does not fit on the summary line
fn log_records(report: &FrameReport) {
    for rec in report.data_records() {
        match rec {
            DataRecord::DstarSlowData {
                message: Some(msg), ..
            } => info!("dstar: message \"{}\"", msg),
            DataRecord::P25EncryptionSync(es) if es.is_encrypted() => {
                info!(
                    "p25: encrypted, algid {:02X} kid {:04X}",
                    es.algid, es.kid
                )
            }
            DataRecord::TdmaBurst(burst) => debug!(
                "tdma: slot {:?} {}",
                burst.slot,
                burst.data_type_name().unwrap_or("data")
            ),
            DataRecord::NxdnLich(lich) if !lich.parity_ok() => {
                debug!("nxdn: LICH parity error")
            }
            _ => {}
        }
    }
}

// Spawn program to resume the scan; run it to completion
fn resume_scan(config: &Config<'_>, report: &FrameReport) {
    if config.child_args.is_empty() {
        debug!("resume scan: no child process to spawn");
        return;
    }

    let mut child = match spawner::spawn(config.child_args[0], &config.child_args[1..], report) {
        Ok(child) => child,
        Err(err) => {
            error!("unable to spawn child process: {}", err);
            return;
        }
    };

    debug!("spawned child process PID {}", child.id());

    match child.wait() {
        Ok(exit) => {
            if exit.success() {
                debug!("child process exited successfully");
            } else {
                warn!(
                    "child process exited abnormally with status {}",
                    exit.code().unwrap_or(1)
                );
            }
        }
        Err(err) => {
            error!("unable to await child process exit: {}", err);
        }
    }
}
