mod analyze;
mod asset_cache;
mod cache;
mod config;
mod content;
mod edge_color;
mod endpoints;
mod gallery;
mod imaging;
mod rsvp;
mod venue;

use actix_web::{App, HttpServer, middleware, web};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

use crate::asset_cache::cache::AssetCache;
use crate::cache::{CLEANUP_INTERVAL, cache_cleanup, directory_watcher};
use crate::config::AppConfig;
use crate::content::WeddingContent;
use crate::rsvp::notifier::SlackNotifier;

#[derive(Parser, Debug)]
#[command(name = "wedding-invitation", version)]
struct Cli {
    /// Server configuration file.
    #[arg(long, default_value = config::CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the invitation site (default).
    Serve,
    /// Report photo dimensions and optionally rebuild the gallery.
    Analyze {
        /// Folder with the source photos.
        source: PathBuf,

        /// Copy photos into the gallery directory and write the manifest.
        #[arg(long, default_value_t = false)]
        copy: bool,

        /// Crop copies to 1200x900 before writing them.
        #[arg(long, default_value_t = false)]
        resize: bool,
    },
    /// Print the effective wedding content as TOML.
    ShowContent,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let app_config = AppConfig::load(&cli.config)?;

    match cli.cmd.unwrap_or(Command::Serve) {
        Command::Serve => serve(app_config).await,
        Command::Analyze {
            source,
            copy,
            resize,
        } => {
            let options = analyze::AnalyzeOptions {
                copy,
                resize,
                gallery_dir: app_config.gallery_path(),
                url_prefix: app_config.gallery_url_prefix(),
            };
            analyze::run(&source, &options)?;
            Ok(())
        }
        Command::ShowContent => {
            let content = WeddingContent::load(&app_config.content)?;
            print!("{}", content.to_toml()?);
            Ok(())
        }
    }
}

async fn serve(app_config: AppConfig) -> anyhow::Result<()> {
    let content = WeddingContent::load(&app_config.content)?;
    let bind_address = app_config.address.clone();

    let ssl_enabled = app_config.ssl;
    let certificate_bundle = app_config.check();

    let mut cache = AssetCache::from(app_config.cache_age);
    cache.init(&app_config.public_dir).await?;

    let shared_cache = Arc::new(Mutex::new(cache));

    {
        let cache = Arc::clone(&shared_cache);
        tokio::spawn(async move {
            cache_cleanup(cache, CLEANUP_INTERVAL).await;
        });
    }

    {
        let cache = Arc::clone(&shared_cache);
        tokio::spawn(async move {
            directory_watcher(cache).await;
        });
    }

    let notifier = web::Data::new(SlackNotifier::new(&content.slack));
    if content.rsvp.enabled && !notifier.is_configured() {
        info!("RSVP is enabled but no Slack webhook is set, submissions will be refused.");
    }

    info!("Starting server at {}", bind_address);

    let app_config = web::Data::new(app_config);
    let content = web::Data::new(content);
    let shared_cache = web::Data::new(shared_cache);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(app_config.clone())
            .app_data(content.clone())
            .app_data(notifier.clone())
            .app_data(shared_cache.clone())
            .configure(endpoints::configure)
    });

    if ssl_enabled {
        match certificate_bundle {
            Ok((cert, key)) => {
                info!("Starting server with SSL enabled.");
                let builder = config::create_ssl_builder(&cert, &key).map_err(|e| {
                    error!("Error creating TLS instance: {}", e);
                    anyhow::anyhow!("Cannot access certificates!")
                })?;
                server.bind_openssl(bind_address, builder)?.run().await?;
            }
            Err(e) => {
                error!("Invalid certificate bundle: {}", e);
                return Err(e);
            }
        }
    } else {
        info!("Starting server without SSL.");
        server.bind(bind_address)?.run().await?;
    }

    Ok(())
}
