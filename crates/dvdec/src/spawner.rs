//! Spawns child process from a FrameReport

use std::ffi::OsStr;
use std::io;
use std::process::{Child, Command, Stdio};

use dvframe::FrameReport;

/// Spawn a child process to resume the scan
///
/// The child process will receive information about the last
/// frame via the environment. Its standard input is closed.
///
/// This method will attempt to start an executable named
/// `cmd` with the given `args`.
pub fn spawn<C, A, B>(cmd: C, args: A, report: &FrameReport) -> io::Result<Child>
where
    C: AsRef<OsStr>,
    B: AsRef<OsStr>,
    A: IntoIterator<Item = B>,
{
    Command::new(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .args(args)
        .envs(child_env(report))
        .spawn()
}

// Environment variables for the child
fn child_env(report: &FrameReport) -> [(&'static str, String); 4] {
    [
        (childenv::DVDEC_SYNC, report.sync.as_str().to_owned()),
        (childenv::DVDEC_NAC, format!("{:X}", report.nac)),
        (childenv::DVDEC_TG, report.tg.to_string()),
        (childenv::DVDEC_SRC, report.src.to_string()),
    ]
}

mod childenv {
    /// Sync type of the last frame
    ///
    /// A short label with a leading polarity sign, like
    /// `+P25p1` or `-DMR`.
    pub const DVDEC_SYNC: &str = "DVDEC_SYNC";

    /// P25 Network Access Code (hex)
    ///
    /// `0` if the last frame was not P25.
    pub const DVDEC_NAC: &str = "DVDEC_NAC";

    /// Talkgroup of the call, in decimal
    ///
    /// `0` once the call has ended.
    pub const DVDEC_TG: &str = "DVDEC_TG";

    /// Source radio of the call, in decimal
    pub const DVDEC_SRC: &str = "DVDEC_SRC";
}
