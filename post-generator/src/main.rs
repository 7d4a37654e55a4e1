use anyhow::Context;
use clap::{Parser, Subcommand};
use post_generator::mock::{MemoryPostStore, RecordingAnnouncer};
use post_generator::{
    AnnouncerConfig, ContentService, GeneratorConfig, PgPostStore, PostKind, PostPipeline, PostStore,
    TelegramAnnouncer, UnsplashImages,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "post-generator", about = "Scheduled AI blog post generation", version)]
struct Cli {
    /// Keep posts in memory and skip announcements
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish on a timer
    Run {
        #[arg(long, default_value_t = 360)]
        interval_minutes: u64,
        #[arg(long)]
        trending: bool,
        #[arg(long)]
        max_runs: Option<usize>,
    },
    /// Publish one post now
    Publish {
        #[arg(long)]
        trending: bool,
    },
    /// Generate a post for a category and print it
    Generate {
        #[arg(long)]
        category: String,
    },
    /// Generate a search-grounded trending post and print it
    Trending {
        #[arg(long)]
        category: String,
    },
    /// Generate posts for several categories
    Batch {
        #[arg(long, value_delimiter = ',', required = true)]
        categories: Vec<String>,
        #[arg(long, default_value_t = 2)]
        max_concurrent: usize,
    },
    /// Synthesize a narration and print its path
    Audio {
        #[arg(long)]
        text: String,
    },
    /// Create the database tables
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = GeneratorConfig::from_env().context("invalid configuration")?;

    if let Command::InitDb = cli.command {
        let store = PgPostStore::new(&config.database_url)
            .await
            .context("failed to connect to the database")?;
        store.setup_schema().await?;
        return Ok(());
    }

    let service = Arc::new(ContentService::from_config(&config).map_err(|e| {
        error!("Failed to initialize the content service: {}", e);
        e
    })?);

    match cli.command {
        Command::Run {
            interval_minutes,
            trending,
            max_runs,
        } => {
            let pipeline = build_pipeline(&config, service, cli.dry_run).await?;
            let every = Duration::from_secs(interval_minutes.max(1) * 60);
            info!("Publishing every {} minute(s)", interval_minutes.max(1));
            pipeline.run_scheduled(every, post_kind(trending), max_runs).await;
        }
        Command::Publish { trending } => {
            let pipeline = build_pipeline(&config, service, cli.dry_run).await?;
            let post = pipeline.run_once(post_kind(trending)).await?;
            println!("{}", serde_json::to_string_pretty(&post)?);
        }
        Command::Generate { category } => {
            let content = service.generate_blog_post(&category).await?;
            println!("{}", serde_json::to_string_pretty(&content)?);
        }
        Command::Trending { category } => {
            let content = service.generate_trending_post(&category).await?;
            println!("{}", serde_json::to_string_pretty(&content)?);
        }
        Command::Batch {
            categories,
            max_concurrent,
        } => {
            let outcomes = service.generate_multiple_posts(&categories, max_concurrent).await;
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
        }
        Command::Audio { text } => match service.generate_audio_summary(&text).await {
            Some(path) => println!("{}", path),
            None => println!("no audio"),
        },
        Command::InitDb => {}
    }

    Ok(())
}

fn post_kind(trending: bool) -> PostKind {
    if trending {
        PostKind::Trending
    } else {
        PostKind::Blog
    }
}

async fn build_pipeline(
    config: &GeneratorConfig,
    service: Arc<ContentService>,
    dry_run: bool,
) -> anyhow::Result<PostPipeline> {
    if dry_run {
        info!("Dry run: posts stay in memory and nothing is announced");
        let pipeline = PostPipeline::new(service, Arc::new(MemoryPostStore::new()), config.categories.clone())?
            .with_announcer(Arc::new(RecordingAnnouncer::new()));
        return Ok(pipeline);
    }

    let store: Arc<dyn PostStore> = Arc::new(
        PgPostStore::new(&config.database_url)
            .await
            .context("failed to connect to the database")?,
    );
    let mut pipeline = PostPipeline::new(service, store, config.categories.clone())?;

    match &config.unsplash_access_key {
        Some(key) => {
            let images = UnsplashImages::new(key.clone(), config.request_timeout_seconds)?;
            pipeline = pipeline.with_images(Arc::new(images));
        }
        None => warn!("UNSPLASH_ACCESS_KEY not set, posts will have no image"),
    }

    match (&config.telegram_bot_token, &config.telegram_channel_id) {
        (Some(token), Some(channel)) => {
            let announcer = TelegramAnnouncer::new(AnnouncerConfig {
                bot_token: token.clone(),
                channel_id: channel.clone(),
                site_url: config.site_url.clone(),
                timeout_seconds: 30,
                max_retries: 3,
                retry_delay_seconds: 2,
            })?;
            pipeline = pipeline.with_announcer(Arc::new(announcer));
        }
        _ => warn!("Telegram not configured, new posts will not be announced"),
    }

    Ok(pipeline)
}
