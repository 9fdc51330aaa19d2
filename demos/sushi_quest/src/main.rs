//! Quest 4 Sushi on the console
//!
//! Runs one session in real time. Commands are read from stdin, one per
//! line; notifications are printed to stdout as JSON lines.
//!
//! ```text
//! start                 start the game
//! move <rank> <file>    move the player
//! {"type": ...}         any inbound signal as JSON
//! quit                  leave
//! ```
//!
//! Usage: `sushi_quest [content.ron] [config.ron]`. Logging is controlled by
//! `RUST_LOG` and goes to stderr.

use questflow_session::{
    GameContent, Inbound, Lobby, Notification, SessionConfig, SessionId,
};
use std::error::Error;
use std::rc::Rc;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::{self, LocalSet};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "commands: start | move <rank> <file> | {json signal} | quit";

enum Command {
    Signal(Inbound),
    Quit,
    Empty,
    Unknown,
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.starts_with('{') {
        return match Inbound::from_json(line) {
            Ok(inbound) => Command::Signal(inbound),
            Err(err) => {
                warn!(error = %err, "unreadable signal");
                Command::Unknown
            }
        };
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        [] => Command::Empty,
        ["start"] => Command::Signal(Inbound::StartSession),
        ["move", rank, file] => Command::Signal(Inbound::RequestMoveTo {
            rank: (*rank).into(),
            file: (*file).into(),
        }),
        ["quit"] | ["exit"] => Command::Quit,
        _ => Command::Unknown,
    }
}

fn load_content(path: Option<String>) -> Result<GameContent, Box<dyn Error>> {
    if let Some(path) = path {
        info!(%path, "loading content");
        return Ok(GameContent::load(path)?);
    }
    // Try the bundled board, then fall back to the built-in one
    let paths = ["demos/sushi_quest/data/quest.ron", "data/quest.ron"];
    for path in paths {
        if std::path::Path::new(path).exists() {
            info!(%path, "loading content");
            return Ok(GameContent::load(path)?);
        }
    }
    info!("using built-in content");
    Ok(GameContent::default())
}

async fn run(content: GameContent, config: SessionConfig) -> Result<(), Box<dyn Error>> {
    let id = SessionId::from("/game1_console");
    let (outbox, mut notifications) = mpsc::unbounded_channel::<Notification>();

    // Ends once the session is gone and its outbox sender dropped
    let mut printer = task::spawn_local(async move {
        while let Some(notification) = notifications.recv().await {
            match serde_json::to_string(&notification) {
                Ok(line) => println!("{}", line),
                Err(err) => warn!(error = %err, "could not encode notification"),
            }
        }
    });

    let mut lobby = Lobby::new();
    lobby.open(id.clone(), &content, config, Rc::new(outbox))?;
    eprintln!("{}", HELP);

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut printer_done = false;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Command::Signal(inbound) => {
                        if let Err(err) = lobby.send(&id, inbound) {
                            eprintln!("{}", err);
                            break;
                        }
                    }
                    Command::Quit => break,
                    Command::Empty => {}
                    Command::Unknown => eprintln!("{}", HELP),
                }
            }
            result = &mut printer => {
                printer_done = true;
                result?;
                break;
            }
        }
    }

    lobby.close(&id);
    drop(lobby);
    if !printer_done {
        printer.await?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let content = load_content(args.next())?;
    let config = match args.next() {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    LocalSet::new().block_on(&runtime, run(content, config))
}
