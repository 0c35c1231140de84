//! Narrate - video transcription command-line interface

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use narrate_core::{
    save_transcription, ModelManager, Pipeline, TranscriptionConfig, WhisperModel,
};
use owo_colors::OwoColorize as _;
use std::path::PathBuf;
use std::process;
use std::str::FromStr as _;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

const ABOUT: &str = "Extract the audio of a video file and transcribe it with Whisper";

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), author, version)]
#[command(about = ABOUT)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the video file to transcribe (when no subcommand)
    #[arg(value_name = "VIDEO_FILE")]
    video_file: Option<PathBuf>,

    /// Model tier to use (tiny, base, small, medium, large)
    #[arg(short, long, default_value = "base")]
    model: String,

    /// Path to a Whisper model file, overrides --model
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Language code (e.g., en, es, fr). Auto-detect if not specified
    #[arg(short, long)]
    language: Option<String>,

    /// Disable GPU acceleration
    #[arg(long)]
    no_gpu: bool,

    /// Number of threads to use
    #[arg(short, long)]
    threads: Option<usize>,

    /// Output format: text, json, srt
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    /// Output file path (writes to stdout if not given)
    #[arg(short = 'f', long = "output-file")]
    output_file: Option<PathBuf>,

    /// Temperature for sampling (0.0 = deterministic)
    #[arg(long, default_value = "0.0")]
    temperature: f32,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Model management commands
    Models {
        #[command(subcommand)]
        command: ModelCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ModelCommands {
    /// Download a Whisper model
    Download {
        /// Model to download (e.g., base, small, large)
        #[arg(value_name = "MODEL")]
        model: String,

        /// Force download even if the model is already downloaded
        #[arg(short, long)]
        force: bool,
    },
    /// List models (downloaded by default, use --available for all)
    List {
        /// List all available models instead of downloaded models
        #[arg(short, long)]
        available: bool,
    },
    /// Delete a downloaded model
    Delete {
        /// Model to delete (e.g., base, small, large)
        #[arg(value_name = "MODEL")]
        model: String,
    },
    /// Show model information
    Info {
        /// Model to show info for (e.g., base, small, large)
        #[arg(value_name = "MODEL")]
        model: String,
    },
}

/// Output format options
#[derive(Clone, Debug, clap::ValueEnum)]
enum OutputFormat {
    /// Plain transcript text
    Text,
    /// JSON report with segments and timing metadata
    Json,
    /// SRT subtitle format
    Srt,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::builder().parse("info,whisper_rs::whisper_logging_hook=warn")?,
            )
            .compact()
            .without_time()
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
    debug!("Command line arguments: {:?}", cli);

    if let Some(command) = cli.command {
        return handle_command(command, cli.verbose).await;
    }

    let Some(video_file) = cli.video_file.clone() else {
        error!("No video file specified. Please provide a video file to transcribe.");
        process::exit(1);
    };

    if !video_file.exists() {
        error!("Video file not found: {}", video_file.display());
        process::exit(1);
    }

    let model = match WhisperModel::from_str(&cli.model) {
        Ok(model) => model,
        Err(e) => {
            error!("{}. Use 'models list --available' to see valid names.", e);
            process::exit(1);
        }
    };

    let mut config = TranscriptionConfig::new()
        .with_model(model)
        .with_gpu(!cli.no_gpu)
        .with_threads(cli.threads.unwrap_or_else(num_cpus::get))
        .with_verbose(cli.verbose);

    if let Some(ref model_path) = cli.model_path {
        config = config.with_model_path(model_path.clone());
    }

    if let Some(ref language) = cli.language {
        config = config.with_language(language.clone());
    }

    config.temperature = cli.temperature;

    println!("{} Transcribing video...", "Info:".blue().bold());

    let pipeline = Pipeline::new(config);
    let result = match pipeline.transcribe_video(&video_file).await {
        Ok(result) => result,
        Err(e) => {
            error!("Transcription failed: {}", e);
            process::exit(1);
        }
    };

    // Render the requested format
    let output_content = match cli.output {
        OutputFormat::Text => result.text.trim().to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Srt => result
            .segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                format!(
                    "{}\n{} --> {}\n{}\n",
                    i + 1,
                    format_srt_time(segment.start),
                    format_srt_time(segment.end),
                    segment.text.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    };

    // Write output to file or stdout
    if let Some(output_file) = cli.output_file {
        if let Err(e) = save_transcription(&output_content, &output_file).await {
            error!("{}", e);
            process::exit(1);
        }
        if cli.verbose {
            println!(
                "{} Output written to: {}",
                "Success:".green().bold(),
                output_file.display()
            );
        }
    } else {
        println!("{}", output_content);
    }

    if cli.verbose {
        println!();
        println!("{}", "Transcription Summary:".green().bold());
        println!("Audio duration: {:.2}s", result.audio_duration);
        println!("Processing time: {:.2}s", result.processing_time);
        println!(
            "Real-time factor: {:.2}x",
            result.processing_time / result.audio_duration as f64
        );
        println!("Segments: {}", result.segments.len());
    }

    Ok(())
}

/// Handle subcommands
async fn handle_command(command: Commands, verbose: bool) -> anyhow::Result<()> {
    match command {
        Commands::Models { command } => handle_model_command(command, verbose).await,
    }
}

/// Handle model management subcommands
async fn handle_model_command(command: ModelCommands, verbose: bool) -> anyhow::Result<()> {
    let model_manager = ModelManager::new()?;

    match command {
        ModelCommands::Download { model, force } => {
            let whisper_model = parse_model(&model)?;

            if !force && model_manager.is_model_downloaded(whisper_model).await {
                println!(
                    "{} Model {} is already downloaded.",
                    "Info:".blue().bold(),
                    whisper_model.as_str()
                );
                return Ok(());
            }

            println!(
                "{} Downloading model: {} ({})",
                "Info:".blue().bold(),
                whisper_model.as_str(),
                whisper_model.description()
            );

            let progress_bar = ProgressBar::new(whisper_model.size());
            progress_bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
                    .progress_chars("#>-"),
            );

            model_manager
                .download_model_with_progress(whisper_model, |downloaded, total| {
                    if let Some(total) = total {
                        if progress_bar.length().unwrap_or(0) != total {
                            progress_bar.set_length(total);
                        }
                    }
                    progress_bar.set_position(downloaded);
                })
                .await?;

            progress_bar.finish_and_clear();

            println!(
                "{} Model {} downloaded.",
                "Success:".green().bold(),
                whisper_model.as_str()
            );
        }

        ModelCommands::List { available } => {
            if available {
                println!("{}", "Available Whisper Models:".blue().bold());
                println!();
                for &model in WhisperModel::all_models() {
                    println!("  {} - {}", model.as_str().green(), model.description());
                }
                println!();
                println!(
                    "{}{}{}",
                    "Usage: ".dimmed(),
                    env!("CARGO_PKG_NAME").cyan().dimmed(),
                    " models download <model>".cyan().dimmed()
                );
            } else {
                let downloaded = model_manager.list_downloaded_models().await?;

                if downloaded.is_empty() {
                    println!("{} No models downloaded yet.", "Info:".blue().bold());
                    println!(
                        "Use {}{} to download one.",
                        env!("CARGO_PKG_NAME").cyan(),
                        " models download base".cyan()
                    );
                } else {
                    println!("{} Downloaded models:", "Info:".blue().bold());
                    println!();

                    for model in downloaded {
                        let path = model_manager.get_model_path(model);
                        let size = if let Ok(metadata) = std::fs::metadata(&path) {
                            format_file_size(metadata.len())
                        } else {
                            "unknown size".to_string()
                        };

                        println!(
                            "  {} - {} ({})",
                            model.as_str().green(),
                            model.description().dimmed(),
                            size.yellow()
                        );

                        if verbose {
                            println!("    Path: {}", path.display().to_string().dimmed());
                        }
                    }

                    println!();
                    println!(
                        "Models directory: {}",
                        model_manager.models_dir().display().to_string().dimmed()
                    );
                }
            }
        }

        ModelCommands::Delete { model } => {
            let whisper_model = parse_model(&model)?;

            if !model_manager.is_model_downloaded(whisper_model).await {
                println!(
                    "{} Model {} is not downloaded.",
                    "Warning:".yellow().bold(),
                    whisper_model.as_str()
                );
                return Ok(());
            }

            model_manager.delete_model(whisper_model).await?;

            println!(
                "{} Model {} deleted.",
                "Success:".green().bold(),
                whisper_model.as_str()
            );
        }

        ModelCommands::Info { model } => {
            let whisper_model = parse_model(&model)?;

            println!("{} Model Information", "Info:".blue().bold());
            println!();
            println!("Name: {}", whisper_model.as_str().green().bold());
            println!("Description: {}", whisper_model.description());
            println!("Filename: {}", whisper_model.filename().yellow());

            let is_downloaded = model_manager.is_model_downloaded(whisper_model).await;
            println!(
                "Downloaded: {}",
                if is_downloaded {
                    "yes".green().to_string()
                } else {
                    "no".red().to_string()
                }
            );

            if is_downloaded {
                let path = model_manager.get_model_path(whisper_model);
                println!("Path: {}", path.display());

                if let Ok(metadata) = std::fs::metadata(&path) {
                    println!("Size: {}", format_file_size(metadata.len()).yellow());
                }
            }
        }
    }

    Ok(())
}

fn parse_model(name: &str) -> anyhow::Result<WhisperModel> {
    WhisperModel::from_str(name).map_err(|e| {
        anyhow::anyhow!(
            "Unknown model: {}. Use 'models list --available' to see valid names. Error: {}",
            name,
            e
        )
    })
}

/// Format file size in human readable format
fn format_file_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format time for SRT subtitles (HH:MM:SS,mmm)
fn format_srt_time(seconds: f64) -> String {
    let hours = (seconds / 3600.0) as u32;
    let minutes = ((seconds % 3600.0) / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    let millis = ((seconds % 1.0) * 1000.0) as u32;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srt_time_formatting() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(61.5), "00:01:01,500");
        assert_eq!(format_srt_time(3661.123), "01:01:01,123");
    }

    #[test]
    fn test_file_size_formatting() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(142 * 1024 * 1024), "142.0 MB");
    }
}
