//! Runs a workspace session against headless collaborators, driven by a
//! script of JSON lines on stdin:
//!
//! ```text
//! {"spawn": {"title": "term", "workspace": 2, "focus": true}}
//! {"command": {"go_to_desktop": {"to": "right"}}}
//! {"modifiers": "LOGO"}
//! {"focus": "term"}
//! {"sleep": 1500}
//! "state"
//! ```
//!
//! Every `"state"` line and the end of input print a session snapshot as
//! one JSON line on stdout.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use rift_workspaces::actor::reactor::{self, Desktop, Event, Reactor, WorkspaceCommand};
use rift_workspaces::actor::{self, WeakSender};
use rift_workspaces::common::config::{Config, config_file};
use rift_workspaces::common::log::init_logging;
use rift_workspaces::model::server::SessionData;
use rift_workspaces::model::view::{ViewInfo, ViewStore};
use rift_workspaces::sys::cursor::NotifyCounter;
use rift_workspaces::sys::event::{KeyboardState, Modifiers};
use rift_workspaces::sys::scene::HeadlessScene;
use rift_workspaces::sys::screen::{OutputId, OutputSpec, StaticOutputs};
use rift_workspaces::sys::timer::TokioTimers;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "rift-workspaces", about = "Headless workspace session driver", version)]
struct Cli {
    /// Config file; defaults to the user config directory.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output geometry, repeatable.
    #[arg(long = "output", value_name = "WxH[+X+Y][@SCALE]")]
    outputs: Vec<OutputSpec>,

    /// More logging; repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
enum Step {
    Command(WorkspaceCommand),
    Spawn(Spawn),
    /// Focuses the first view with this title.
    Focus(String),
    Modifiers(Modifiers),
    /// Milliseconds.
    Sleep(u64),
    State,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct Spawn {
    title: String,
    /// 1-based; the current workspace when absent.
    workspace: Option<usize>,
    #[serde(default)]
    omnipresent: bool,
    #[serde(default)]
    always_on_top: bool,
    #[serde(default)]
    fullscreen: bool,
    #[serde(default)]
    focus: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = cli.config.unwrap_or_else(config_file);
    let config = Config::load_or_default(&path)
        .with_context(|| format!("loading config from {}", path.display()))?;
    let outputs = if cli.outputs.is_empty() {
        vec!["1920x1080".parse::<OutputSpec>()?]
    } else {
        cli.outputs
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("starting runtime")?;
    runtime.block_on(session(config, outputs))
}

async fn session(config: Config, outputs: Vec<OutputSpec>) -> anyhow::Result<()> {
    let outputs = StaticOutputs::new(
        outputs
            .into_iter()
            .zip(1..)
            .map(|(spec, id)| {
                let mut output = spec.into_descriptor(OutputId::new(id));
                output.name = Some(format!("HEADLESS-{id}"));
                output
            })
            .collect(),
    );
    let views = ViewStore::new();
    let keyboard = KeyboardState::new();
    let (tx, rx) = actor::channel();
    let timer_tx: WeakSender<Event> = tx.downgrade();
    let timers = TokioTimers::new(move |ticket| {
        if let Some(tx) = timer_tx.upgrade() {
            tx.send(Event::TimerExpired(ticket));
        }
    });
    let desktop = Desktop {
        scene: Box::new(HeadlessScene::new()),
        outputs: Box::new(outputs),
        views: Box::new(views.clone()),
        cursor: Box::new(NotifyCounter::new()),
        stacking: None,
    };
    let reactor = Reactor::new(&config, desktop, Box::new(keyboard.clone()), Box::new(timers));
    info!(workspaces = reactor.workspaces().len(), "session started");

    let ((), result) = tokio::join!(reactor.run(rx), drive(tx, views, keyboard));
    result
}

async fn query(tx: &reactor::Sender) -> anyhow::Result<SessionData> {
    let (reply, rx) = oneshot::channel();
    tx.send(Event::QuerySession(reply));
    rx.await.context("reactor stopped")
}

fn print(state: &SessionData) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(state)?);
    Ok(())
}

/// Feeds script steps to the reactor one at a time. Each step is fully
/// handled before the next one is read.
async fn drive(tx: reactor::Sender, views: ViewStore, keyboard: KeyboardState) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut state = query(&tx).await?;
    while let Some(line) = lines.next_line().await.context("reading script")? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step: Step =
            serde_json::from_str(line).with_context(|| format!("invalid script line {line:?}"))?;
        match step {
            Step::Command(cmd) => tx.send(Event::Command(cmd)),
            Step::Spawn(spawn) => {
                let ws = match spawn.workspace {
                    Some(index) => state.workspaces.iter().find(|ws| ws.index == index),
                    None => state.active_workspace(),
                };
                let Some(ws) = ws else {
                    bail!("no workspace {:?} to spawn {:?} on", spawn.workspace, spawn.title);
                };
                let view = views.spawn(ViewInfo {
                    omnipresent: spawn.omnipresent,
                    always_on_top: spawn.always_on_top,
                    fullscreen: spawn.fullscreen,
                    ..ViewInfo::new(spawn.title, ws.id)
                });
                if spawn.focus {
                    tx.send(Event::FocusView(view));
                }
            }
            Step::Focus(title) => {
                let view = state
                    .workspaces
                    .iter()
                    .flat_map(|ws| &ws.windows)
                    .find(|w| w.title == title)
                    .map(|w| w.id);
                match view {
                    Some(view) => tx.send(Event::FocusView(view)),
                    None => warn!(%title, "no view with that title"),
                }
            }
            Step::Modifiers(mods) => {
                keyboard.set_modifiers(mods);
                tx.send(Event::ModifiersChanged(mods));
            }
            Step::Sleep(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            Step::State => print(&query(&tx).await?)?,
        }
        state = query(&tx).await?;
    }
    print(&state)
}
