//! listing-recorder CLI
//!
//! Plays a recording script against a real browser and writes the exported
//! artifacts to disk. After every navigation the page agent is rebuilt from
//! the on-disk store, the same way a reloaded page picks its session back up.

use anyhow::{Context, bail};
use clap::Parser;
use listing_recorder::protocol::{LogPanel, PanelMessage};
use listing_recorder::{AgentOutcome, Artifact, BrowserSession, DomTree, Environment, FileStore, LaunchOptions,
                       PageAgent, RecorderConfig, RecordingScript};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "listing-recorder")]
#[command(version)]
#[command(about = "Record a results listing once, extract it across every page", long_about = None)]
struct Cli {
    /// Recording script (JSON)
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<PathBuf>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Disable the Chrome sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Recorder configuration (JSON); defaults apply to missing fields
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the artifacts are written to
    #[arg(long, short = 'o', value_name = "DIR", default_value = "recordings")]
    out_dir: PathBuf,

    /// Directory holding the per-origin session stores
    #[arg(long, value_name = "DIR", default_value = ".listing-recorder")]
    store_dir: PathBuf,

    /// Table delimiter (default: tab)
    #[arg(long, value_name = "CHAR")]
    delimiter: Option<char>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let raw = fs::read_to_string(&cli.script).with_context(|| format!("Failed to read {}", cli.script.display()))?;
    let script = RecordingScript::from_json(&raw).context("Invalid recording script")?;
    let config = load_config(&cli, &script)?;

    let mut options = LaunchOptions::new().headless(!cli.headed).sandbox(!cli.no_sandbox);
    if let Some(path) = &cli.executable_path {
        options = options.chrome_path(path);
    }
    if let Some(dir) = &cli.user_data_dir {
        options = options.user_data_dir(dir);
    }

    let browser = BrowserSession::launch(options).context("Failed to launch browser")?;
    let environment = browser.environment();
    log::info!(
        "Browser mode: {} ({} {})",
        if cli.headed { "headed" } else { "headless" },
        environment.browser_name,
        environment.browser_version
    );

    browser.navigate(&script.start_url)?;
    let mut dom = browser.snapshot()?;
    let mut agent = page_agent(&cli, &config, &dom, &environment)?;
    let mut outcome = script.play(&mut agent, &mut dom)?;

    loop {
        match outcome {
            AgentOutcome::Navigate(url) => {
                browser.navigate(&url)?;
                let mut dom = browser.snapshot()?;
                let mut agent = page_agent(&cli, &config, &dom, &environment)?;
                outcome = agent.handle_message(&mut dom, PanelMessage::RecordingContinue)?;
            }
            AgentOutcome::Exported(artifacts) => {
                write_artifacts(&cli.out_dir, &artifacts)?;
                break;
            }
            AgentOutcome::Inert { expected, actual } => {
                bail!("Landed on '{}' instead of '{}'; the stored session was kept", actual, expected)
            }
            AgentOutcome::Closed => bail!("Recording was cancelled"),
            AgentOutcome::Idle | AgentOutcome::PromptTitle(_) => bail!("Recording stalled before collecting results"),
        }
    }

    browser.close()?;
    Ok(())
}

fn load_config(cli: &Cli, script: &RecordingScript) -> anyhow::Result<RecorderConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&raw).context("Invalid recorder configuration")?
        }
        None => RecorderConfig::default(),
    };

    if script.pager.is_none() && config.pagination {
        log::info!("Script has no pager target; recording a single page");
        config = config.pagination(false);
    }
    if let Some(delimiter) = cli.delimiter {
        if !delimiter.is_ascii() {
            bail!("Delimiter must be a single ASCII character");
        }
        config = config.table_delimiter(delimiter as u8);
    }

    Ok(config)
}

/// Fresh agent for the page in `dom`, backed by that origin's store
fn page_agent(
    cli: &Cli,
    config: &RecorderConfig,
    dom: &DomTree,
    environment: &Environment,
) -> anyhow::Result<PageAgent<FileStore, LogPanel>> {
    let store = FileStore::for_origin(&cli.store_dir, dom.location())?;
    log::debug!("Session store: {}", store.path().display());
    Ok(PageAgent::new(config.clone(), store, LogPanel).with_environment(environment.clone()))
}

fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    for artifact in artifacts {
        let path = dir.join(artifact.name.replace('/', "-"));
        fs::write(&path, &artifact.bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{}", path.display());
    }
    Ok(())
}
