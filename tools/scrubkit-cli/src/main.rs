//! scrubkit CLI: inspect and exercise sprite-sheet scrubbing assets.
//!
//! Usage:
//!   scrubkit info <METADATA>               Show metadata summary
//!   scrubkit frame <METADATA> --time T     Resolve a time or index to a frame
//!   scrubkit regions <METADATA>            List skip-silence playable regions
//!   scrubkit encode <SECONDS>              Encode seconds as a compact token
//!   scrubkit decode <TOKEN>                Decode a compact time token
//!   scrubkit share <PAGE_URL> --start T    Build a shareable link
//!   scrubkit follow <LINK>                 Read the range carried by a link
//!   scrubkit timestamps <ACTIVITIES>       Print the activity timestamp list
//!   scrubkit render-frame <METADATA>       Render one preview frame to PNG
//!   scrubkit render-filmstrip <METADATA>   Render the filmstrip to PNG
//!
//! Locations may be filesystem paths or http(s) URLs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scrubkit_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "scrubkit",
    about = "Sprite-sheet video scrubbing toolkit",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a summary of a sprite metadata document
    Info {
        /// Metadata location
        metadata: String,

        /// Padding around speech segments (seconds)
        #[arg(long)]
        margin: Option<f64>,
    },

    /// Resolve a time or a frame index
    Frame {
        /// Metadata location
        metadata: String,

        /// Time in seconds
        #[arg(long, conflicts_with = "index")]
        time: Option<f64>,

        /// Frame index
        #[arg(long)]
        index: Option<usize>,
    },

    /// List playable regions used by skip-silence
    Regions {
        /// Metadata location
        metadata: String,

        /// Padding around speech segments (seconds)
        #[arg(long)]
        margin: Option<f64>,
    },

    /// Encode seconds as a compact token (e.g. 3750 -> 1h2m30s)
    Encode {
        /// Seconds; fractions are floored
        seconds: f64,
    },

    /// Decode a compact token to seconds
    Decode {
        /// Token such as 1h2m30s
        token: String,
    },

    /// Build a shareable link
    Share {
        /// Page URL the link points at
        page_url: String,

        /// Start token (e.g. 1m30s)
        #[arg(short, long)]
        start: String,

        /// Optional end token
        #[arg(short, long)]
        end: Option<String>,

        /// Recording duration used to validate the range (seconds)
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Show the range an incoming link asks for
    Follow {
        /// Link with t/e parameters
        link: String,
    },

    /// Print the activity timestamp list
    Timestamps {
        /// Activities feed location
        activities: String,

        /// Playback position used to mark the current entry (seconds)
        #[arg(long, default_value = "0")]
        at: f64,

        /// Case-insensitive filter over app, title and path
        #[arg(long)]
        search: Option<String>,
    },

    /// Render one preview frame to a PNG file
    RenderFrame {
        /// Metadata location
        metadata: String,

        /// Frame index
        #[arg(long, conflicts_with = "time")]
        frame: Option<usize>,

        /// Time in seconds
        #[arg(long)]
        time: Option<f64>,

        /// Preview sheet prefix; derived from `<id>-meta.json` when omitted
        #[arg(long)]
        prefix: Option<String>,

        /// Output PNG path
        #[arg(short, long, default_value = "frame.png")]
        output: PathBuf,
    },

    /// Render the filmstrip to a PNG file
    RenderFilmstrip {
        /// Metadata location
        metadata: String,

        /// Timeline sprite; derived from `<id>-meta.json` when omitted
        #[arg(long)]
        sprite: Option<String>,

        /// Strip width in pixels
        #[arg(long, default_value = "1200")]
        width: u32,

        /// Strip height in pixels
        #[arg(long, default_value = "60")]
        height: u32,

        /// Draw the playhead at this frame
        #[arg(long)]
        playhead: Option<usize>,

        /// Output PNG path
        #[arg(short, long, default_value = "filmstrip.png")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    logging.json |= cli.json_logs;
    scrubkit_common::logging::init_logging(&logging);

    let playback = &config.playback;

    match cli.command {
        Commands::Info { metadata, margin } => {
            commands::info::run(&metadata, margin.unwrap_or(playback.region_margin_secs)).await
        }
        Commands::Frame {
            metadata,
            time,
            index,
        } => commands::frame::run(&metadata, time, index).await,
        Commands::Regions { metadata, margin } => {
            commands::regions::run(&metadata, margin.unwrap_or(playback.region_margin_secs)).await
        }
        Commands::Encode { seconds } => commands::codec::encode(seconds),
        Commands::Decode { token } => commands::codec::decode(&token),
        Commands::Share {
            page_url,
            start,
            end,
            duration,
        } => commands::share::build(
            &page_url,
            &start,
            end.as_deref(),
            duration,
            playback.share_default_span_secs,
        ),
        Commands::Follow { link } => {
            commands::share::follow(&link, playback.timestamp_offset_secs)
        }
        Commands::Timestamps {
            activities,
            at,
            search,
        } => {
            commands::timestamps::run(
                &activities,
                at,
                search.as_deref(),
                playback.timestamp_offset_secs,
            )
            .await
        }
        Commands::RenderFrame {
            metadata,
            frame,
            time,
            prefix,
            output,
        } => commands::render::frame(&metadata, frame, time, prefix, output).await,
        Commands::RenderFilmstrip {
            metadata,
            sprite,
            width,
            height,
            playhead,
            output,
        } => commands::render::filmstrip(&metadata, sprite, width, height, playhead, output).await,
    }
}
