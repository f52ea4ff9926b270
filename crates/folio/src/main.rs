//! Folio CLI binary.
//!
//! Command-line access to the pipeline stages:
//! - Plan spreads for a story
//! - Decide scenes for its spreads
//! - Generate the front/back covers once a style reference exists

use clap::{Parser, Subcommand};
use folio::{FolioConfig, PipelineApp, StoryEvent};

#[derive(Parser)]
#[command(name = "folio", version, about = "Illustrated-book pipeline")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the spread planner for a story
    Plan {
        /// Target story id
        #[arg(long)]
        story_id: i64,
    },
    /// Run the scene-decision engine for a story
    Scenes {
        /// Target story id
        #[arg(long)]
        story_id: i64,
    },
    /// Record the style reference and run the two cover jobs for a story
    Covers {
        /// Target story id
        #[arg(long)]
        story_id: i64,
        /// URL of the style reference image
        #[arg(long)]
        style_image_url: String,
        /// Interior page image URLs for visual-consistency conditioning
        #[arg(long = "interior-url")]
        interior_urls: Vec<String>,
    },
    /// Print the story's lifecycle status
    Status {
        /// Target story id
        #[arg(long)]
        story_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = FolioConfig::load()?;
    let app = PipelineApp::new(&config)?;

    match cli.command {
        Commands::Plan { story_id } => {
            app.handle(StoryEvent::BuildSpreads { story_id }).await?;
            app.drain().await;
        }
        Commands::Scenes { story_id } => {
            app.handle(StoryEvent::DecideSpreadScenes { story_id })
                .await?;
            app.drain().await;
        }
        Commands::Covers {
            story_id,
            style_image_url,
            interior_urls,
        } => {
            app.dispatch_covers(story_id, &style_image_url, &interior_urls)
                .await?;
            app.drain().await;
        }
        Commands::Status { story_id } => {
            println!("{}", app.story_status(story_id).await?);
        }
    }

    Ok(())
}
