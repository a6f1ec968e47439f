use std::io;

use anyhow::{anyhow, Context};
use byteorder::{NativeEndian, ReadBytesExt};
use clap::Parser;
use log::{info, LevelFilter};

use dvframe::{DibitStream, ReceiverBuilder, SoftSymbolStream};

mod app;
mod cli;
mod spawner;

use cli::{Args, CliError, InputFormat};

fn main() {
    match dvdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn dvdec() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    // create the decoder
    let mut builder = ReceiverBuilder::new();
    builder
        .with_families(args.only.iter().copied())
        .with_sync_max_errors(args.sync_max_errors)
        .with_polarity(args.polarity)
        .with_modulation(args.modulation)
        .with_slicer_bandwidth(args.slicer_bw)
        .with_verbose(args.verbose)
        .with_error_bars(args.error_bars)
        .with_p25_status(args.p25_status)
        .with_resume(args.resume);

    if let Some(dir) = &args.mbe_out_dir {
        if !dir.is_dir() {
            return Err(anyhow!("--mbe-out-dir \"{}\" is not a directory", dir.display()).into());
        }
        builder.with_mbe_out_dir(dir);
    }

    let mut rx = builder.build();

    // file setup: locks stdin in case we need it
    let stdin = io::stdin();
    let stdin_handle = stdin.lock();
    let mut inbuf = file_setup(&args, stdin_handle)?;

    // processing: read symbols from the input source
    match args.format {
        InputFormat::Dibit => app::run(
            &args,
            &mut rx,
            DibitStream::new(std::iter::from_fn(|| inbuf.read_u8().ok())),
        ),
        InputFormat::S16 => app::run(
            &args,
            &mut rx,
            SoftSymbolStream::new(
                std::iter::from_fn(|| inbuf.read_i16::<NativeEndian>().ok()),
                builder.build_slicer(),
            ),
        ),
    }

    // close any MBE file
    rx.reset();

    Ok(())
}

fn log_setup(args: &Args) {
    if args.quiet {
        // no logging
        return;
    } else if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("dvframe", log_filter)
            .filter_module("dvdec", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

fn file_setup<'stdin>(
    args: &Args,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, anyhow::Error> {
    if args.input_is_stdin() {
        info!("dvdec reading standard input");
        if !is_terminal(&std::io::stdin()) {
            Ok(Box::new(io::BufReader::new(stdin)))
        } else {
            Err(anyhow!(
                "cowardly refusing to read symbols from a terminal.

Pipe a symbol stream from a demodulator, or from a capture file,
into this program."
            ))
        }
    } else {
        info!("dvdec reading file: \"{}\"", &args.file);
        Ok(Box::new(io::BufReader::new(
            std::fs::File::open(&args.file)
                .with_context(|| format!("Unable to open --file \"{}\"", args.file))?,
        )))
    }
}

#[cfg(not(target_os = "windows"))]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::fd::AsRawFd,
{
    terminal_size::terminal_size_using_fd(stream.as_raw_fd()).is_some()
}

#[cfg(target_os = "windows")]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::windows::io::AsRawHandle,
{
    terminal_size::terminal_size_using_handle(stream.as_raw_handle()).is_some()
}
