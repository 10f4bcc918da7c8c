mod compare;
mod media;
mod meta;
mod pipeline;
mod place;
mod plan;
mod resolve;
mod scan;
mod timezone;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use compare::CmpMode;
use pipeline::SortOptions;
use place::OutputMode;
use timezone::TimezonePolicy;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser)]
#[command(
    name = "exiftzsort-rs",
    version,
    about = "Organize photos and videos into date-based folders using EXIF or metadata timestamps"
)]
struct Cli {
    /// Input directory containing media files
    #[arg(default_value = ".")]
    source_dir: PathBuf,

    /// Base output directory for sorted files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Minimum log level to display (RUST_LOG overrides)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Copy files instead of creating symbolic links
    #[arg(long)]
    copy: bool,

    /// Duplicate check method
    #[arg(long, value_enum, default_value_t = CmpMode::Filecmp)]
    cmp_mode: CmpMode,

    /// Timezone for interpreting metadata timestamps: "auto" (derive from
    /// GPS), "local", an IANA name like "Asia/Tokyo", or an offset like "+09:00"
    #[arg(long, default_value = "local")]
    exif_timezone: TimezonePolicy,

    /// Enable skipping of the directories listed in --skip-dirs
    #[arg(long)]
    enable_skip_dir: bool,

    /// Directory names to skip (used only if --enable-skip-dir is set)
    #[arg(long, num_args = 0..)]
    skip_dirs: Vec<String>,

    /// Treat files without a metadata timestamp as unresolved instead of
    /// falling back to the file's modification time
    #[arg(long)]
    no_mtime_fallback: bool,

    /// Highest disambiguation suffix to try before reporting a conflict
    #[arg(long, default_value_t = 99)]
    max_suffix: u32,

    /// Print the final summary as JSON on stdout
    #[arg(long)]
    json_summary: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level.as_filter()),
    )
    .format_timestamp(None)
    .init();

    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupt.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
            log::warn!("cannot install interrupt handler: {e}");
        }
    }

    let options = SortOptions {
        source_dir: cli.source_dir,
        output_dir: cli.output_dir,
        output_mode: if cli.copy { OutputMode::Copy } else { OutputMode::Link },
        cmp_mode: cli.cmp_mode,
        timezone: cli.exif_timezone,
        skip_dirs: if cli.enable_skip_dir { cli.skip_dirs } else { Vec::new() },
        mtime_fallback: !cli.no_mtime_fallback,
        max_suffix: cli.max_suffix,
    };

    let summary = match pipeline::run(&options, &interrupt) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("{e:#}");
            return ExitCode::from(2);
        }
    };

    if cli.json_summary {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("cannot render JSON summary: {e}"),
        }
    }

    eprintln!(
        "Processed {} media file(s): {} created, {} linked, {} duplicate(s) skipped",
        summary.candidates, summary.created, summary.linked, summary.skipped_duplicates
    );
    if summary.unsupported > 0 {
        eprintln!("  {} unsupported file(s)", summary.unsupported);
    }
    if summary.unresolved > 0 {
        eprintln!("  {} file(s) with no resolvable timestamp", summary.unresolved);
    }
    if summary.conflicts > 0 {
        eprintln!("  {} placement conflict(s)", summary.conflicts);
    }
    if summary.write_failures > 0 {
        eprintln!("  {} write failure(s)", summary.write_failures);
    }
    if summary.interrupted {
        eprintln!("Interrupted; partial results above");
    }
    eprintln!("Finished with {} error(s)", summary.reported_errors());

    if summary.interrupted {
        ExitCode::from(130)
    } else if summary.failure_count() > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
