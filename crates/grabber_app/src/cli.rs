use std::path::PathBuf;

use clap::Parser;
use grabber_core::{FormatType, Quality};

#[derive(Parser, Debug)]
#[command(name = "grabber")]
#[command(about = "Download a YouTube video through a grabber backend", long_about = None)]
pub struct Cli {
    /// Video URL (youtube.com/watch?v=, youtu.be/, shorts/ or embed/)
    pub url: String,

    /// Output kind: video or audio
    #[arg(short, long, default_value = "video")]
    pub format: FormatType,

    /// best, worst, or a maximum height such as 720
    #[arg(short, long, default_value = "best")]
    pub quality: Quality,

    /// RON configuration file
    #[arg(short, long, default_value = "grabber.ron")]
    pub config: PathBuf,

    /// Backend base URL; overrides the configuration file
    #[arg(long)]
    pub base_url: Option<String>,

    /// Leave the finished file on the backend instead of saving it locally
    #[arg(long)]
    pub no_save: bool,
}
