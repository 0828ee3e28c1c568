//! CLI entry point for folio

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::index::SortOrder;
use folio::Site;

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Builds markdown posts into JSON artifacts and serves them", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build artifacts from the markdown sources
    #[command(alias = "b")]
    Build {
        /// Only build this collection
        #[arg(long)]
        collection: Option<String>,
    },

    /// Serve the JSON API and static files
    #[command(alias = "s")]
    Serve {
        /// Port to listen on (defaults to `server.port` in _config.yml)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to `server.ip` in _config.yml)
        #[arg(short, long)]
        ip: Option<String>,

        /// Serve existing artifacts without building first
        #[arg(long)]
        no_build: bool,
    },

    /// List built posts of a collection
    List {
        #[arg(default_value = "posts")]
        collection: String,

        /// Only show posts carrying this tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// newest or oldest
        #[arg(short, long, default_value = "newest")]
        sort: SortOrder,
    },

    /// List tags of a collection with post counts
    Tags {
        #[arg(default_value = "posts")]
        collection: String,
    },

    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        #[arg(long, default_value = "posts")]
        collection: String,
    },

    /// Remove built artifacts
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "folio=debug,info"
    } else {
        "folio=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Build { collection } => {
            let site = Site::new(&base_dir)?;
            build(&site, collection.as_deref()).await?;
        }

        Commands::Serve { port, ip, no_build } => {
            let site = Site::new(&base_dir)?;

            if !no_build {
                // A failed document keeps its previous artifact, so serving can go on
                let reports = site.build(None).await?;
                reports.iter().for_each(folio::commands::build::print_report);
            }

            let indices = site.load_indices()?;
            let ip = ip.unwrap_or_else(|| site.config.server.ip.clone());
            let port = port.unwrap_or(site.config.server.port);

            tracing::info!("Starting server at http://{}:{}", ip, port);
            folio::server::start(&site, indices, &ip, port).await?;
        }

        Commands::List {
            collection,
            tags,
            sort,
        } => {
            let site = Site::new(&base_dir)?;
            folio::commands::list::run(&site, &collection, &tags, sort)?;
        }

        Commands::Tags { collection } => {
            let site = Site::new(&base_dir)?;
            folio::commands::list::run_tags(&site, &collection)?;
        }

        Commands::New { title, collection } => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Creating new {} entry: {}", collection, title);
            let path = folio::commands::new::create_post(&site, &title, &collection)?;
            println!("Created {}", path.display());
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Cleaning {:?}...", site.output_dir);
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("folio version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

async fn build(site: &Site, only: Option<&str>) -> Result<()> {
    tracing::info!("Building artifacts...");
    let reports = site.build(only).await?;
    reports.iter().for_each(folio::commands::build::print_report);

    let failed: usize = reports.iter().map(|r| r.failed.len()).sum();
    if failed > 0 {
        anyhow::bail!("{} document(s) failed to build", failed);
    }
    println!("Built successfully!");
    Ok(())
}
