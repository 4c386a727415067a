use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use podcast_downloader::{
    DirectoryPolicy, NoopReporter, ProgressEvent, ProgressReporter, ReqwestClient,
    SharedProgressReporter, default_config_path, load_config, sync_podcasts,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Download new podcast episodes listed in a configuration file
#[derive(Parser, Debug)]
#[command(name = "podcast-downloader")]
#[command(about = "Download new podcast episodes from RSS feeds")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to ~/.podcast_downloader_config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of episodes to download in this run
    #[arg(long)]
    downloads_limit: Option<usize>,

    /// What to download into empty directories: download_last,
    /// download_all_from_feed or download_from_<N>_days
    #[arg(long)]
    if_directory_empty: Option<DirectoryPolicy>,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    multi: MultiProgress,
    download_bar: Mutex<Option<ProgressBar>>,
    main_bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let main_style = ProgressStyle::default_bar()
            .template("{spinner:.green} {wide_msg}")
            .unwrap();

        let main_bar = multi.add(ProgressBar::new_spinner());
        main_bar.set_style(main_style);
        main_bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            multi,
            download_bar: Mutex::new(None),
            main_bar,
        }
    }

    fn current_bar(&self) -> ProgressBar {
        let mut slot = self.download_bar.lock().unwrap();

        if let Some(bar) = slot.as_ref() {
            return bar.clone();
        }

        let style = ProgressStyle::default_bar()
            .template(&format!(
                "  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{bytes}}/{{total_bytes}} {{wide_msg}}"
            ))
            .unwrap()
            .progress_chars("█▓░");

        let bar = self.multi.add(ProgressBar::new(0));
        bar.set_style(style);
        *slot = Some(bar.clone());
        bar
    }

    fn finish_bar(&self) {
        if let Some(bar) = self.download_bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }

    fn line(&self, message: String) {
        let _ = self.multi.println(message);
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::PodcastSkipped { podcast } => {
                self.line(format!("  {} {}", podcast.dimmed(), "(disabled)".dimmed()));
            }

            ProgressEvent::FetchingFeed { podcast, url } => {
                self.main_bar
                    .set_message(format!("{SEARCH}{}: fetching {}", podcast.bold(), url.cyan()));
            }

            ProgressEvent::FeedFailed {
                podcast,
                url,
                error,
            } => {
                self.line(format!(
                    "{FAILURE}{} ({}) - {}",
                    podcast.red().bold(),
                    url,
                    error.red()
                ));
            }

            ProgressEvent::EntriesSelected {
                podcast,
                marker,
                selected,
            } => {
                let since = marker
                    .map(|name| format!("after {}", name.yellow()))
                    .unwrap_or_else(|| "empty directory".dimmed().to_string());

                self.line(format!(
                    "{HEADPHONES}{} • {} new ({})",
                    podcast.bold().green(),
                    selected.to_string().cyan(),
                    since
                ));
            }

            ProgressEvent::DownloadStarting {
                file_name,
                index,
                total,
                content_length,
            } => {
                let bar = self.current_bar();
                bar.set_length(content_length.unwrap_or(0));
                bar.set_position(0);
                bar.set_message(format!(
                    "[{}/{}] {}",
                    (index + 1).to_string().cyan(),
                    total.to_string().cyan(),
                    truncate_title(&file_name, 40)
                ));
            }

            ProgressEvent::DownloadProgress {
                bytes_downloaded,
                total_bytes,
                ..
            } => {
                let bar = self.current_bar();
                if let Some(total) = total_bytes {
                    bar.set_length(total);
                }
                bar.set_position(bytes_downloaded);
            }

            ProgressEvent::DownloadCompleted {
                file_name,
                bytes_downloaded,
            } => {
                self.current_bar().set_position(bytes_downloaded);
                self.finish_bar();
                self.line(format!("  {SUCCESS}{}", file_name.green()));
            }

            ProgressEvent::DownloadFailed { file_name, error } => {
                self.finish_bar();
                self.line(format!(
                    "  {FAILURE}{} - {}",
                    truncate_title(&file_name, 30).red(),
                    error.red()
                ));
            }

            ProgressEvent::DownloadLimitReached { limit } => {
                self.line(format!(
                    "{} {}",
                    "Download limit reached:".yellow(),
                    limit.to_string().yellow().bold()
                ));
            }

            ProgressEvent::PartialFilesCleanedUp { podcast, count } => {
                self.line(format!(
                    "  {}: removed {} unfinished download(s)",
                    podcast.dimmed(),
                    count
                ));
            }

            ProgressEvent::SyncCompleted {
                downloaded_count,
                failed_count,
                failed_podcasts,
            } => {
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} downloaded, {} failed, {} feed(s) unavailable",
                    "Done:".bold().green(),
                    downloaded_count.to_string().green().bold(),
                    if failed_count > 0 {
                        failed_count.to_string().red().bold()
                    } else {
                        failed_count.to_string().green()
                    },
                    if failed_podcasts > 0 {
                        failed_podcasts.to_string().red().bold()
                    } else {
                        failed_podcasts.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path)
        .with_context(|| format!("Failed to load configuration {}", config_path.display()))?;

    if let Some(limit) = args.downloads_limit {
        config.downloads_limit = Some(limit);
    }
    if let Some(policy) = args.if_directory_empty {
        config.if_directory_empty = policy;
    }

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podcast-downloader".bold().magenta(),
            "- new episodes only".dimmed()
        );
    }

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    };

    let client = ReqwestClient::new();
    let result = sync_podcasts(&client, &config, reporter).await;

    if !args.quiet && !result.failed_episodes.is_empty() {
        println!("\n{}", "Failed episodes:".red().bold());
        for (file_name, error) in &result.failed_episodes {
            println!("  {}{} - {}", CROSS, file_name.yellow(), error.dimmed());
        }
    }

    let nothing_worked = result.downloaded == 0 && (result.failed > 0 || !result.failed_podcasts.is_empty());
    if nothing_worked {
        std::process::exit(1);
    }

    Ok(())
}
