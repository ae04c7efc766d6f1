//! pumlpad - PlantUML Editor Backend
//!
//! Command-line front end: one-off render and export, or `serve` to act as the
//! backend of a UI over line-delimited JSON on stdio.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use pumlpad::app::runtime::serve;
use pumlpad::dialogs::{FileDialogs, PresetDialogs};
use pumlpad::{Application, Config};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `serve` keeps stdout for responses
    env_logger::init();

    let matches = cli().get_matches();

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    match matches.subcommand() {
        Some(("render", sub)) => render(&config, sub).await,
        Some(("export", sub)) => export(&config, sub).await,
        Some(("serve", _)) => run_server(&config).await,
        _ => unreachable!("subcommand is required"),
    }
}

fn cli() -> Command {
    let file_arg = Arg::new("file")
        .help("Diagram source file")
        .required(true)
        .index(1);
    let output_arg = Arg::new("output")
        .short('o')
        .long("output")
        .help("Destination file or directory");

    Command::new("pumlpad")
        .version(pumlpad::VERSION)
        .about("Backend for a PlantUML editor shell")
        .long_about(
            "pumlpad keeps a PlantUML engine running for fast previews, exports diagrams \
             to image files, and serves both to a UI over line-delimited JSON.",
        )
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .help("Path to a TOML configuration file"),
        )
        .subcommand(
            Command::new("render")
                .about("Render a diagram to SVG through the streaming engine")
                .arg(file_arg.clone())
                .arg(output_arg.clone().help("Write the SVG here instead of stdout")),
        )
        .subcommand(
            Command::new("export")
                .about("Export a diagram to an image file")
                .arg(file_arg)
                .arg(output_arg),
        )
        .subcommand(Command::new("serve").about("Answer bridge requests on stdin/stdout"))
}

async fn read_source(matches: &ArgMatches) -> Result<String> {
    let path = PathBuf::from(
        matches
            .get_one::<String>("file")
            .expect("file argument is required"),
    );
    tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn render(config: &Config, matches: &ArgMatches) -> Result<()> {
    let markup = read_source(matches).await?;
    let app = Application::new(config, Arc::new(PresetDialogs::canceling()));

    let rendered = app.renderer().render(&markup).await;
    app.shutdown().await;
    let svg = rendered.context("Render failed")?;

    match matches.get_one::<String>("output") {
        Some(output) => tokio::fs::write(output, svg)
            .await
            .with_context(|| format!("Failed to write {output}"))?,
        None => println!("{svg}"),
    }
    Ok(())
}

async fn export(config: &Config, matches: &ArgMatches) -> Result<()> {
    let markup = read_source(matches).await?;
    let dialogs: Arc<dyn FileDialogs> = match matches.get_one::<String>("output") {
        Some(output) => Arc::new(PresetDialogs::default().with_save(output)),
        None => interactive_dialogs(),
    };
    let app = Application::new(config, dialogs);

    let result = app.export_image(&markup).await;
    match (result.file_path, result.error) {
        (Some(path), _) if result.success => {
            println!("{}", path.display());
            Ok(())
        }
        (_, Some(error)) => anyhow::bail!(error),
        _ => anyhow::bail!("Export canceled"),
    }
}

async fn run_server(config: &Config) -> Result<()> {
    let app = Arc::new(Application::new(config, interactive_dialogs()));
    let served = serve(Arc::clone(&app), tokio::io::stdin(), tokio::io::stdout()).await;
    app.shutdown().await;
    served.context("Bridge transport failed")?;
    Ok(())
}

#[cfg(feature = "native-dialogs")]
fn interactive_dialogs() -> Arc<dyn FileDialogs> {
    Arc::new(pumlpad::dialogs::NativeDialogs)
}

#[cfg(not(feature = "native-dialogs"))]
fn interactive_dialogs() -> Arc<dyn FileDialogs> {
    log::warn!("Built without native dialogs; open and save dialogs will cancel");
    Arc::new(PresetDialogs::canceling())
}
