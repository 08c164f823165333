//! snappdf command line
//!
//! One subcommand per tool. Local transforms run entirely in-process;
//! pdf-to-word and word-to-pdf go through the remote conversion service.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use snappdf_remote::{Direction, RemoteConfig, RemoteConverter};
use snappdf_session::{
    cancellation, CancelHandle, CompressSession, ConvertSession, ImagePackSession, MergeSession,
    RecordStatus, save_result,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "snappdf",
    version,
    about = "PDF toolbox: compress, merge, pack images, convert PDF/Word"
)]
struct Cli {
    /// Directory where outputs are written
    #[arg(long, short = 'o', global = true, default_value = ".")]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Shrink PDFs by blanking metadata and compacting structure
    Compress {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Combine PDFs into one document, pages in argument order
    Merge {
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
    },
    /// Pack images into a PDF, one page per image
    Images {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert a PDF to Word via the conversion service
    PdfToWord {
        file: PathBuf,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Convert a Word document to PDF via the conversion service
    WordToPdf {
        file: PathBuf,
        #[command(flatten)]
        remote: RemoteArgs,
    },
}

#[derive(Args)]
struct RemoteArgs {
    /// Base URL of the conversion service
    #[arg(long, default_value = "http://localhost:8000")]
    api_url: String,

    /// Request deadline in seconds
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,
}

impl RemoteArgs {
    fn converter(&self) -> Result<RemoteConverter> {
        let config = RemoteConfig::new(self.api_url.as_str())
            .with_timeout(Duration::from_secs(self.timeout_secs));
        Ok(RemoteConverter::new(config)?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Compress { files } => run_compress(files, &cli.out_dir).await,
        Command::Merge { files } => run_merge(files, &cli.out_dir).await,
        Command::Images { files } => run_images(files, &cli.out_dir).await,
        Command::PdfToWord { file, remote } => {
            run_convert(file, remote, Direction::PdfToWord, &cli.out_dir).await
        }
        Command::WordToPdf { file, remote } => {
            run_convert(file, remote, Direction::WordToPdf, &cli.out_dir).await
        }
    }
}

async fn run_compress(files: Vec<PathBuf>, out_dir: &Path) -> Result<()> {
    let mut session = CompressSession::new();
    for path in &files {
        let name = display_name(path);
        let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        if let Err(e) = session.add_file(&name, bytes) {
            eprintln!("skipping {}: {}", name, e);
        }
    }
    if session.pending_count() == 0 {
        bail!("no files accepted");
    }

    let token = cancel_on_ctrl_c();
    let bar = ProgressBar::new(session.pending_count() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:30.green} {pos}/{len} {msg}",
    )?);

    // One record at a time, in list order.
    while !token.is_cancelled() {
        let Some(id) = session.process_next().await else {
            break;
        };
        if let Some(record) = session.record(id) {
            bar.set_message(record.name.clone());
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let mut failed = 0;
    for record in session.records() {
        match record.status() {
            RecordStatus::Done => {
                if let (Some(result), Some(out_name)) =
                    (record.result(), session.output_name(record.id))
                {
                    let path = save_result(out_dir, &out_name, &result.bytes)?;
                    println!(
                        "{} -> {} ({} -> {}, -{}%)",
                        record.name,
                        path.display(),
                        format_size(record.size_before()),
                        format_size(result.len()),
                        savings_percent(record.size_before(), result.len()),
                    );
                }
            }
            RecordStatus::Error => {
                failed += 1;
                eprintln!(
                    "{}: {}",
                    record.name,
                    record.error().unwrap_or("compression failed")
                );
            }
            status => debug!(file = %record.name, ?status, "record left unprocessed"),
        }
    }

    if failed == session.records().len() {
        bail!("every file failed to compress");
    }
    Ok(())
}

async fn run_merge(files: Vec<PathBuf>, out_dir: &Path) -> Result<()> {
    let mut session = MergeSession::new();
    for path in &files {
        let name = display_name(path);
        let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        session
            .add_file(&name, bytes)
            .with_context(|| format!("cannot accept {}", name))?;
    }

    let output_name = session.output_name();
    let file_count = session.files().len();

    let spinner = spinner("Merging...")?;
    let outcome = session.merge().await;
    spinner.finish_and_clear();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => bail!("{}", e),
    };
    let pages = snappdf_core::page_count(&result.bytes)?;
    let path = save_result(out_dir, output_name, &result.bytes)?;
    println!(
        "merged {} files into {} ({} pages, {})",
        file_count,
        path.display(),
        pages,
        format_size(result.len()),
    );
    Ok(())
}

async fn run_images(files: Vec<PathBuf>, out_dir: &Path) -> Result<()> {
    let mut session = ImagePackSession::new();
    for path in &files {
        let name = display_name(path);
        let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        session
            .add_file(&name, bytes)
            .with_context(|| format!("cannot accept {}", name))?;
    }

    let output_name = session.output_name();
    let file_count = session.files().len();

    let spinner = spinner("Packing images...")?;
    let outcome = session.convert().await;
    spinner.finish_and_clear();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => bail!("{}", e),
    };
    let path = save_result(out_dir, output_name, &result.bytes)?;
    println!(
        "packed {} images into {} ({})",
        file_count,
        path.display(),
        format_size(result.len()),
    );
    Ok(())
}

async fn run_convert(
    file: PathBuf,
    remote: RemoteArgs,
    direction: Direction,
    out_dir: &Path,
) -> Result<()> {
    let mut session = ConvertSession::new(remote.converter()?, direction);
    let name = display_name(&file);
    let bytes = fs::read(&file).with_context(|| format!("cannot read {}", file.display()))?;
    session.set_file(&name, bytes)?;

    let token = cancel_on_ctrl_c();
    let spinner = spinner("Converting...")?;
    let status = session.convert_with(token).await;
    spinner.finish_and_clear();

    match status {
        Some(RecordStatus::Done) => {
            let record = session.record().context("record vanished")?;
            let out_name = session.output_name().context("no output name")?;
            if let Some(result) = record.result() {
                let path = save_result(out_dir, &out_name, &result.bytes)?;
                println!(
                    "{} -> {} ({})",
                    record.name,
                    path.display(),
                    format_size(result.len()),
                );
            }
            Ok(())
        }
        Some(RecordStatus::Error) => {
            let message = session
                .record()
                .and_then(|r| r.error().map(str::to_owned))
                .unwrap_or_else(|| "conversion failed".to_string());
            bail!("{}", message)
        }
        _ => bail!("nothing to convert"),
    }
}

/// Flip a cancellation handle on Ctrl-C.
fn cancel_on_ctrl_c() -> snappdf_session::CancelToken {
    let (handle, token) = cancellation();
    tokio::spawn(wait_for_ctrl_c(handle));
    token
}

async fn wait_for_ctrl_c(handle: CancelHandle) {
    if tokio::signal::ctrl_c().await.is_ok() {
        handle.cancel();
    }
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
    }
}

fn savings_percent(before: u64, after: u64) -> i64 {
    if before == 0 {
        return 0;
    }
    (100.0 * (1.0 - after as f64 / before as f64)).round() as i64
}
