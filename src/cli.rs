use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dropout-dl")]
#[command(about = "Scrape the Dropout catalog and download every episode with yt-dlp")]
pub struct Cli {
    /// Base directory where videos will be downloaded
    #[arg(short = 'o', long = "output-dir", default_value = "Dropout")]
    pub output_dir: String,

    /// Config file (defaults to the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Netscape cookie file exported from a logged-in browser session
    #[arg(long)]
    pub cookies: Option<PathBuf>,

    /// yt-dlp download archive used to skip episodes fetched by earlier runs
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Log debug output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
