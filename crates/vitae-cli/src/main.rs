//! Vitae command line front end.
//!
//! Edits resume documents offline with scripts and moves them to and from a
//! template store: a local directory or the HTTP template service.

mod script;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vitae_core::shortcuts::SHORTCUTS;
use vitae_core::storage::{FileTemplateStore, HttpTemplateStore};
use vitae_core::{
    AuthToken, Editor, EditorConfig, PushRequest, SceneDocument, Scope, Snapshot, SyncBridge, TemplateId,
    TemplateStore,
};

/// Resume template editing engine
#[derive(Debug, Parser)]
#[command(name = "vitae", version, about, long_about = None)]
struct Cli {
    /// Template store: an http(s) base URL or a directory
    #[arg(long, global = true, env = "VITAE_STORE", value_name = "URL|DIR")]
    store: Option<String>,

    /// Bearer token for the template store
    #[arg(long, global = true, env = "VITAE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Editor configuration file (JSON)
    #[arg(long, global = true, env = "VITAE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write an empty document.
    New {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Check that a document parses.
    Validate { file: PathBuf },

    /// List a document's objects and flag those outside the canvas.
    Inspect { file: PathBuf },

    /// Replay an edit script against a document.
    Apply {
        file: PathBuf,
        script: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the keyboard shortcut table.
    Shortcuts,

    /// Download a template's document.
    Pull {
        id: String,
        /// Read from the public gallery instead of your own templates
        #[arg(long)]
        public: bool,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Save a document to your own templates.
    Push {
        file: PathBuf,
        /// Update this template instead of creating one
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// PNG, JPEG or WebP preview image
        #[arg(long, value_name = "IMAGE")]
        thumbnail: Option<PathBuf>,
    },

    /// Publish a document to the public gallery.
    Publish {
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_name = "IMAGE")]
        thumbnail: Option<PathBuf>,
        /// Personal template to remove once published
        #[arg(long, value_name = "ID")]
        replace: Option<String>,
    },

    /// List templates.
    List {
        #[arg(long)]
        public: bool,
    },

    /// Rate a public template from 1 to 5.
    Rate { id: String, rating: u8 },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::New { out } => {
            let editor = Editor::new(config);
            write_output(out.as_deref(), &editor.snapshot().to_raw())
        }
        Commands::Validate { file } => {
            let snapshot = read_snapshot(&file)?;
            println!("{}: ok ({} objects)", file.display(), snapshot.len());
            Ok(())
        }
        Commands::Inspect { file } => {
            let snapshot = read_snapshot(&file)?;
            print!("{}", inspect(&snapshot, &config));
            Ok(())
        }
        Commands::Apply { file, script, out } => {
            let snapshot = read_snapshot(&file)?;
            let json = fs::read_to_string(&script)
                .with_context(|| format!("Failed to read script {}", script.display()))?;
            let steps = script::parse(&json)?;

            let mut editor = Editor::with_snapshot(&snapshot, config);
            let report = script::run(&mut editor, &steps, &script::CliResolver::default()).await?;
            for line in report {
                eprintln!("{line}");
            }
            write_output(out.as_deref(), &editor.snapshot().to_raw())
        }
        Commands::Shortcuts => {
            println!("\n=== Keyboard Shortcuts ===");
            for shortcut in SHORTCUTS {
                println!("  {:20} {}", shortcut.format(), shortcut.description);
            }
            println!();
            Ok(())
        }
        Commands::Pull { id, public, out } => {
            let bridge = bridge(cli.store.as_deref(), cli.token)?;
            let scope = if public { Scope::Public } else { Scope::Owner };
            let snapshot = bridge.pull(&TemplateId::new(id), scope).await?;
            write_output(out.as_deref(), &snapshot.to_raw())
        }
        Commands::Push {
            file,
            id,
            title,
            thumbnail,
        } => {
            let bridge = bridge(cli.store.as_deref(), cli.token)?;
            let request = push_request(&file, title, thumbnail.as_deref())?;
            let id = id.map(TemplateId::new);
            let saved = bridge.push(id.as_ref(), request).await?;
            println!("{saved}");
            Ok(())
        }
        Commands::Publish {
            file,
            title,
            thumbnail,
            replace,
        } => {
            let bridge = bridge(cli.store.as_deref(), cli.token)?;
            let request = push_request(&file, title, thumbnail.as_deref())?;
            let published = bridge.publish(request).await?;
            if let Some(personal) = replace {
                let personal = TemplateId::new(personal);
                if let Err(e) = bridge.delete(&personal).await {
                    log::warn!("Published, but could not remove personal template {personal}: {e}");
                }
            }
            println!("{published}");
            Ok(())
        }
        Commands::List { public } => {
            let bridge = bridge(cli.store.as_deref(), cli.token)?;
            let records = if public {
                bridge.list_public().await?
            } else {
                bridge.list_own().await?
            };
            for record in records {
                let rating = record
                    .average_rating()
                    .map(|r| format!("{r:.1}"))
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}", record.id, rating, record.title);
            }
            Ok(())
        }
        Commands::Rate { id, rating } => {
            let bridge = bridge(cli.store.as_deref(), cli.token)?;
            let record = bridge.rate(&TemplateId::new(id), rating).await?;
            let average = record.average_rating().unwrap_or(rating as f64);
            println!("{}: {average:.1} ({} ratings)", record.title, record.ratings.len());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    match path {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(EditorConfig::default()),
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read from {}", path.display()))?;
    Snapshot::from_raw(&raw).with_context(|| format!("Invalid document {}", path.display()))
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to save to {}", path.display()))
        }
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

/// Open the store named by `--store`, defaulting to the local data directory.
fn open_store(location: Option<&str>) -> Result<Arc<dyn TemplateStore>> {
    let store: Arc<dyn TemplateStore> = match location {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            Arc::new(HttpTemplateStore::new(url)?)
        }
        Some(dir) => Arc::new(FileTemplateStore::new(dir)?),
        None => Arc::new(FileTemplateStore::default_location()?),
    };
    Ok(store)
}

fn bridge(location: Option<&str>, token: Option<String>) -> Result<SyncBridge> {
    let mut bridge = SyncBridge::new(open_store(location)?);
    bridge.set_auth(token.map(AuthToken::new));
    Ok(bridge)
}

fn push_request(file: &Path, title: Option<String>, thumbnail: Option<&Path>) -> Result<PushRequest> {
    let snapshot = read_snapshot(file)?;
    let title = title.unwrap_or_else(|| {
        file.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled Resume".to_string())
    });
    let mut request = PushRequest::new(title, snapshot);
    if let Some(path) = thumbnail {
        let bytes = fs::read(path).with_context(|| format!("Failed to read from {}", path.display()))?;
        request = request.with_thumbnail(bytes);
    }
    Ok(request)
}

fn inspect(snapshot: &Snapshot, config: &EditorConfig) -> String {
    let document = SceneDocument::from_snapshot(snapshot);
    let overflowing = document.overflowing(config.canvas_rect());

    let mut out = format!(
        "version {}  background {}  {} objects\n",
        snapshot.version(),
        snapshot.background(),
        snapshot.len()
    );
    for (index, object) in document.objects().iter().enumerate() {
        let b = object.bounds();
        let flag = if overflowing.contains(object.id()) {
            "  (outside canvas)"
        } else {
            ""
        };
        out.push_str(&format!(
            "{index:>3}  {:<10} {}  [{:.0}, {:.0}, {:.0} x {:.0}]{flag}\n",
            object.kind().tag(),
            object.id(),
            b.x0,
            b.y0,
            b.width(),
            b.height()
        ));
    }
    out
}
