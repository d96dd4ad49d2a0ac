//! Pagesmith command-line shell.
//!
//! Inspects and exports template files locally and moves templates to and
//! from the remote store.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pagesmith_core::export::JsonRenderer;
use pagesmith_core::remote::{HttpStore, TemplateSession, TemplateStore};
use pagesmith_core::{Editor, EditorConfig, LoadOptions, LoadReport, Template};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "pagesmith", version, about = "Print template layout tools")]
struct Cli {
    /// Base URL of the template API (e.g. http://localhost:8000/api).
    #[arg(long, env = "PAGESMITH_API_URL", global = true)]
    api: Option<String>,

    /// Editor configuration file (JSON).
    #[arg(long, env = "PAGESMITH_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a template file and summarize it.
    Inspect { file: PathBuf },
    /// Print the export snapshot of a template file as JSON.
    Export {
        file: PathBuf,
        #[arg(long)]
        compact: bool,
    },
    /// List remote templates.
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Download a remote template.
    Pull {
        id: String,
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Upload a template file, creating or updating the remote copy.
    Push {
        file: PathBuf,
        /// Template name; defaults to the name in the file.
        #[arg(long)]
        name: Option<String>,
        /// Owning client; defaults to the client in the file.
        #[arg(long)]
        client: Option<String>,
        /// Update this remote template instead of creating a new one.
        #[arg(long)]
        id: Option<String>,
    },
}

async fn read_template(path: &Path) -> Result<Template> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Template::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    match path {
        Some(path) => EditorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EditorConfig::default()),
    }
}

fn warn_report(report: &LoadReport) {
    for reason in &report.skipped {
        log::warn!("Skipped element: {reason}");
    }
    for id in &report.clamped {
        log::warn!("Moved {id} back onto the canvas");
    }
}

/// Resolve the API URL: flag, then config file, then whatever the server's
/// `config` endpoint advertises.
async fn connect(cli_api: Option<&str>, config: &mut EditorConfig) -> Result<HttpStore> {
    if let Some(url) = cli_api {
        return Ok(HttpStore::new(url)?);
    }
    let fallback = HttpStore::new(config.api_base_url())?;
    match fallback.fetch_config().await {
        Ok(remote) => {
            config.apply_remote(&remote);
            Ok(HttpStore::new(config.api_base_url())?)
        }
        Err(e) => {
            log::warn!("Could not fetch remote config, using {}: {e}", fallback.base_url());
            Ok(fallback)
        }
    }
}

fn inspect(editor: &Editor, template: &Template) {
    let canvas = editor.viewport().canvas_size();
    println!("{} ({}x{})", template.name, canvas.width, canvas.height);
    println!("{} elements, bottom to top:", editor.store().len());
    for id in editor.layers().ids() {
        let Some(element) = editor.element(id) else {
            continue;
        };
        let g = &element.geometry;
        let hidden = if editor.layers().is_visible(id) { "" } else { " [hidden]" };
        println!(
            "  {:<12} {:<10} {:<16} at ({}, {}) {}x{} rot {}{}",
            id.as_str(),
            element.element_type().as_str(),
            element.name,
            g.x,
            g.y,
            g.width,
            g.height,
            g.rotation,
            hidden
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Inspect { file } => {
            let template = read_template(&file).await?;
            let mut editor = Editor::new(config);
            let report = editor.load_template(&template, LoadOptions::default());
            warn_report(&report);
            inspect(&editor, &template);
        }
        Command::Export { file, compact } => {
            let template = read_template(&file).await?;
            let mut editor = Editor::new(config);
            warn_report(&editor.load_template(&template, LoadOptions::default()));
            let json = editor.export_with(&mut JsonRenderer { pretty: !compact })?;
            println!("{json}");
        }
        Command::List { search } => {
            let store = connect(cli.api.as_deref(), &mut config).await?;
            let templates = store.list(search.as_deref()).await?;
            if templates.is_empty() {
                println!("No templates found");
            }
            for t in templates {
                println!(
                    "{:>6}  {:<32} {} elements",
                    t.id,
                    t.name,
                    t.elements_count.unwrap_or_default()
                );
            }
        }
        Command::Pull { id, out } => {
            let store = connect(cli.api.as_deref(), &mut config).await?;
            let template = store
                .get(&id)
                .await
                .with_context(|| format!("fetching template {id}"))?;
            let json = template.to_json_pretty()?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, json)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    log::info!("Wrote template {id} to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Push {
            file,
            name,
            client,
            id,
        } => {
            let template = read_template(&file).await?;
            let name = name.unwrap_or_else(|| template.name.clone());
            let client = client.or_else(|| template.client_id.clone());
            if client.is_none() {
                bail!("no client in {} and none given with --client", file.display());
            }

            let store = connect(cli.api.as_deref(), &mut config).await?;
            let mut editor = Editor::new(config);
            warn_report(&editor.load_template(&template, LoadOptions::default()));

            let mut session = TemplateSession::new(Arc::new(store));
            session.set_client(client);
            if let Some(id) = id.or_else(|| template.id.clone()) {
                session.attach(id, template.name.clone());
            }
            let saved = session.save(&editor, &name).await?;
            println!(
                "{} template {}",
                saved.message.as_deref().unwrap_or("Saved"),
                saved.id
            );
        }
    }
    Ok(())
}
