//! camdex CLI - Local search index for a camera inventory.

mod output;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use camdex_core::{
    index_path, index_path_in, resolve_config_path, ConfigFile, EffectiveConfig, IndexError,
    Overrides, Profile, Provenance, Result, DEFAULT_PAGE_SIZE, DEFAULT_PROFILE,
    DEFAULT_SEARCH_LIMIT, DEFAULT_TIMEOUT_SECS,
};
use camdex_fetch::{fetch_all_cameras, HttpPageFetcher};
use camdex_query::QueryEngine;
use camdex_store::{build_index, patch_label, read_status};

/// camdex - Offline search over your camera inventory
#[derive(Parser)]
#[command(name = "camdex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config_dir>/camdex/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Profile to use
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// API base URL override
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Organization ID override
    #[arg(long, global = true)]
    org_id: Option<String>,

    /// API key override
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true, alias = "debug")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and inspect the local camera index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Search the local camera index
    Search {
        /// Free-text query
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum number of results
        #[arg(
            short = 'n',
            long,
            default_value_t = DEFAULT_SEARCH_LIMIT as i64,
            allow_negative_numbers = true
        )]
        limit: i64,

        /// Include the timezone column
        #[arg(long)]
        wide: bool,
    },

    /// Manage local camera labels
    Label {
        #[command(subcommand)]
        action: LabelAction,
    },

    /// Query cameras from the API
    Cameras {
        #[command(subcommand)]
        action: CamerasAction,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Inspect profiles
    Profiles {
        #[command(subcommand)]
        action: ProfilesAction,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// Fetch all cameras and rebuild the index
    Build {
        /// HTTP timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// Cameras per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },

    /// Show index metadata
    Status,

    /// Print the index file path
    Path,
}

#[derive(Subcommand)]
enum LabelAction {
    /// Set a label on a camera
    Set {
        /// Camera ID
        camera_id: String,

        /// Label text
        #[arg(required = true)]
        label: Vec<String>,
    },

    /// Remove a camera's label
    Rm {
        /// Camera ID
        camera_id: String,
    },

    /// List labels in the active profile
    List,
}

#[derive(Subcommand)]
enum CamerasAction {
    /// Fetch all cameras live
    List {
        /// Cameras per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,

        /// HTTP timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// Include the timezone column
        #[arg(long)]
        wide: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Create a config file with one profile
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Print the config with secrets redacted
    View,

    /// Make a profile current
    Use {
        /// Profile name
        profile: String,
    },
}

#[derive(Subcommand)]
enum ProfilesAction {
    /// List profiles
    List,
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        match &e {
            IndexError::IndexNotFound { .. } => eprintln!("run: camdex index build"),
            IndexError::ProfileNotFound { .. } => eprintln!("run: camdex config init"),
            _ => {}
        }
        debug!("error code: {}", e.error_code());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = resolve_config_path(cli.config.as_deref());
    let ctx = Context {
        overrides: Overrides {
            profile: cli.profile.clone(),
            base_url: cli.base_url.clone(),
            org_id: cli.org_id.clone(),
            api_key: cli.api_key.clone(),
            token: None,
        },
        config_path,
        output: cli.output,
        cache_root: None,
    };

    match cli.command {
        Commands::Index { action } => match action {
            IndexAction::Build { timeout, page_size } => {
                index_build(&ctx, timeout, page_size).await
            }
            IndexAction::Status => index_status(&ctx),
            IndexAction::Path => {
                let (_, path) = ctx.index()?;
                println!("{}", path.display());
                Ok(())
            }
        },
        Commands::Search { query, limit, wide } => search(&ctx, &query.join(" "), limit, wide),
        Commands::Label { action } => match action {
            LabelAction::Set { camera_id, label } => label_set(&ctx, &camera_id, &label.join(" ")),
            LabelAction::Rm { camera_id } => label_rm(&ctx, &camera_id),
            LabelAction::List => label_list(&ctx),
        },
        Commands::Cameras { action } => match action {
            CamerasAction::List {
                page_size,
                timeout,
                wide,
            } => cameras_list(&ctx, page_size, timeout, wide).await,
        },
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => config_init(&ctx, force),
            ConfigAction::View => config_view(&ctx),
            ConfigAction::Use { profile } => config_use(&ctx, &profile),
        },
        Commands::Profiles { action } => match action {
            ProfilesAction::List => profiles_list(&ctx),
        },
    }
}

/// Per-invocation settings shared by every command.
struct Context {
    overrides: Overrides,
    config_path: PathBuf,
    output: OutputFormat,

    /// Cache root for index files; the user cache directory when unset.
    cache_root: Option<PathBuf>,
}

impl Context {
    fn load(&self) -> Result<ConfigFile> {
        let mut file = ConfigFile::load_or_default(&self.config_path)?;
        file.normalize();
        Ok(file)
    }

    fn effective(&self) -> Result<EffectiveConfig> {
        self.load()?.effective(&self.overrides, &self.config_path)
    }

    /// Effective settings plus the tenant's index path.
    fn index(&self) -> Result<(EffectiveConfig, PathBuf)> {
        let config = self.effective()?;
        let profile = &config.profile;
        let path = match &self.cache_root {
            Some(root) => index_path_in(
                root,
                &profile.base_url,
                &profile.org_id,
                &config.profile_name,
            ),
            None => index_path(&profile.base_url, &profile.org_id, &config.profile_name)?,
        };
        Ok((config, path))
    }

    fn json(&self) -> bool {
        self.output == OutputFormat::Json
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fetcher_for(config: &EffectiveConfig, timeout: u64) -> Result<HttpPageFetcher> {
    let profile = &config.profile;
    let timeout = if timeout == 0 { DEFAULT_TIMEOUT_SECS } else { timeout };
    HttpPageFetcher::new(
        &profile.base_url,
        &profile.auth.api_key,
        &profile.auth.token,
        &profile.headers,
        Duration::from_secs(timeout),
    )
}

async fn index_build(ctx: &Context, timeout: u64, page_size: u32) -> Result<()> {
    let (config, path) = ctx.index()?;
    let fetcher = fetcher_for(&config, timeout)?;

    let records = fetch_all_cameras(&fetcher, page_size).await?;
    let provenance = Provenance::new(
        &config.profile.base_url,
        &config.profile.org_id,
        &config.profile_name,
    );

    let summary = build_index(&path, &records, &config.profile.labels, &provenance)?;
    info!("Index build finished for profile {}", config.profile_name);

    eprintln!("indexed {} cameras at {}", summary.indexed, path.display());
    if ctx.json() {
        print_json(&json!({
            "path": path,
            "indexed": summary.indexed,
            "skipped": summary.skipped,
            "labeled": summary.labeled,
            "built_at": summary.built_at,
        }))?;
    }
    Ok(())
}

fn index_status(ctx: &Context) -> Result<()> {
    let (_, path) = ctx.index()?;

    match read_status(&path) {
        Ok(status) => {
            if ctx.json() {
                print_json(&serde_json::to_value(&status)?)
            } else {
                print!("{}", output::status_text(&status));
                Ok(())
            }
        }
        Err(e) if e.is_not_found() && ctx.json() => {
            print_json(&json!({ "exists": false, "path": path }))
        }
        Err(e) => Err(e),
    }
}

fn search(ctx: &Context, query: &str, limit: i64, wide: bool) -> Result<()> {
    let (config, path) = ctx.index()?;
    let results = QueryEngine::new(&path).search(query, limit)?;

    if ctx.json() {
        return print_json(&json!({
            "query": query,
            "index_path": path,
            "result_count": results.hits.len(),
            "results": results.hits,
        }));
    }

    if results.hits.is_empty() {
        eprintln!("no cameras matched {:?}", query);
        return Ok(());
    }

    let cameras: Vec<_> = results.hits.iter().map(|hit| &hit.camera).collect();
    print!("{}", output::camera_table(&cameras, &config.profile.labels, wide));
    Ok(())
}

/// Patch the current tenant's index if it can be located; never fails.
fn refresh_index_label(ctx: &Context, camera_id: &str, label: Option<&str>) {
    match ctx.index() {
        Ok((_, path)) => patch_label(&path, camera_id, label),
        Err(e) => debug!("Skipping index label patch: {}", e),
    }
}

fn selected_profile(ctx: &Context, file: &ConfigFile) -> String {
    file.selected_profile_name(ctx.overrides.profile.as_deref(), &env_var)
}

fn label_set(ctx: &Context, camera_id: &str, label: &str) -> Result<()> {
    let mut file = ctx.load()?;
    let name = selected_profile(ctx, &file);
    let stored = file.profile_mut(&name, &ctx.config_path)?.set_label(camera_id, label)?;
    file.save(&ctx.config_path)?;

    refresh_index_label(ctx, camera_id.trim(), Some(&stored));

    if ctx.json() {
        print_json(&json!({ "camera_id": camera_id.trim(), "label": stored }))
    } else {
        println!("{}\t{}", camera_id.trim(), stored);
        Ok(())
    }
}

fn label_rm(ctx: &Context, camera_id: &str) -> Result<()> {
    let mut file = ctx.load()?;
    let name = selected_profile(ctx, &file);
    let removed = file.profile_mut(&name, &ctx.config_path)?.remove_label(camera_id);
    if removed {
        file.save(&ctx.config_path)?;
    }

    refresh_index_label(ctx, camera_id.trim(), None);

    if ctx.json() {
        print_json(&json!({ "camera_id": camera_id.trim(), "removed": removed }))
    } else {
        if !removed {
            eprintln!("no label set for {}", camera_id.trim());
        }
        Ok(())
    }
}

fn label_list(ctx: &Context) -> Result<()> {
    let file = ctx.load()?;
    let name = selected_profile(ctx, &file);
    let profile = file.profiles.get(&name).ok_or_else(|| IndexError::ProfileNotFound {
        name: name.clone(),
        path: ctx.config_path.clone(),
    })?;

    if ctx.json() {
        return print_json(&serde_json::to_value(&profile.labels)?);
    }

    let rows: Vec<Vec<String>> = profile
        .labels
        .iter()
        .map(|(id, label)| vec![id.clone(), label.clone()])
        .collect();
    print!("{}", output::render_table(&["camera_id", "label"], &rows));
    Ok(())
}

async fn cameras_list(ctx: &Context, page_size: u32, timeout: u64, wide: bool) -> Result<()> {
    let config = ctx.effective()?;
    let fetcher = fetcher_for(&config, timeout)?;
    let records = fetch_all_cameras(&fetcher, page_size).await?;

    if ctx.json() {
        return print_json(&serde_json::to_value(&records)?);
    }

    let cameras: Vec<_> = records.iter().collect();
    print!("{}", output::camera_table(&cameras, &config.profile.labels, wide));
    Ok(())
}

fn config_init(ctx: &Context, force: bool) -> Result<()> {
    let existing = ConfigFile::load_or_default(&ctx.config_path)?;
    if !existing.profiles.is_empty() && !force {
        return Err(IndexError::invalid_argument(format!(
            "config already exists at {} (use --force to overwrite)",
            ctx.config_path.display()
        )));
    }

    let name = ctx
        .overrides
        .profile
        .clone()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

    let mut profile = Profile::initial(&env_var);
    if let Some(base_url) = &ctx.overrides.base_url {
        profile.base_url = base_url.clone();
    }
    if let Some(org_id) = &ctx.overrides.org_id {
        profile.org_id = org_id.clone();
    }
    if let Some(api_key) = &ctx.overrides.api_key {
        profile.auth.api_key = api_key.clone();
    }

    let mut file = ConfigFile::default();
    file.current_profile = name.clone();
    file.profiles.insert(name.clone(), profile);
    file.save(&ctx.config_path)?;

    eprintln!("wrote profile {} to {}", name, ctx.config_path.display());
    Ok(())
}

fn redacted(file: &ConfigFile) -> ConfigFile {
    let mut file = file.clone();
    for profile in file.profiles.values_mut() {
        for secret in [&mut profile.auth.api_key, &mut profile.auth.token] {
            if !secret.is_empty() {
                *secret = "****".to_string();
            }
        }
    }
    file
}

fn config_view(ctx: &Context) -> Result<()> {
    let file = redacted(&ctx.load()?);

    if ctx.json() {
        return print_json(&serde_json::to_value(&file)?);
    }

    let text = toml::to_string_pretty(&file)
        .map_err(|e| IndexError::config(format!("Failed to render config: {}", e)))?;
    println!("# {}", ctx.config_path.display());
    print!("{}", text);
    Ok(())
}

fn config_use(ctx: &Context, profile: &str) -> Result<()> {
    let mut file = ctx.load()?;
    let name = profile.trim();
    file.profile_mut(name, &ctx.config_path)?;
    file.current_profile = name.to_string();
    file.save(&ctx.config_path)?;

    eprintln!("current profile: {}", name);
    Ok(())
}

fn profiles_list(ctx: &Context) -> Result<()> {
    let file = ctx.load()?;
    let current = selected_profile(ctx, &file);

    if ctx.json() {
        let names: Vec<&String> = file.profiles.keys().collect();
        return print_json(&json!({ "current": current, "profiles": names }));
    }

    for (name, profile) in &file.profiles {
        let marker = if *name == current { "*" } else { " " };
        println!("{} {}\t{}", marker, name, profile.base_url);
    }
    Ok(())
}
