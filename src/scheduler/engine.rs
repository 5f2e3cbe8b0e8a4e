use crate::config::Config;
use crate::scheduler::{AutoCheck, AutoCheckTimer, PollController};
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// How long quitting waits for in-flight cycles.
pub const QUIT_GRACE: Duration = Duration::from_millis(500);

/// User actions delivered to the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CheckNow,
    ToggleAutoCheck,
    OpenWeb,
    OpenSettings,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "check" | "c" => Ok(Command::CheckNow),
            "toggle" | "t" => Ok(Command::ToggleAutoCheck),
            "web" | "w" => Ok(Command::OpenWeb),
            "settings" | "s" => Ok(Command::OpenSettings),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(format!(
                "unknown command '{}' (expected check, toggle, web, settings, quit)",
                other
            )),
        }
    }
}

/// Forward one command per input line until EOF or the loop goes away.
/// Unrecognized lines are logged and skipped.
pub async fn read_commands<R>(reader: R, tx: mpsc::Sender<Command>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Error reading commands");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(cmd) => {
                if tx.send(cmd).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("{}", e),
        }
    }
}

fn spawn_check(cycles: &mut JoinSet<()>, controller: &PollController) {
    let controller = controller.clone();
    cycles.spawn(async move {
        controller.check_and_notify().await;
    });
}

/// Interval from the current config, falling back to the default when the
/// config can't be read.
async fn current_interval(controller: &PollController) -> Duration {
    controller.check_interval().await.unwrap_or_else(|e| {
        warn!(error = %e, "Error loading configuration, using default interval");
        Config::default().check_interval()
    })
}

/// Main event loop: an immediate check, then automatic checks on the timer
/// and user commands until `Quit` or the command channel closes.
///
/// Returns the auto-check state at exit.
pub async fn run_event_loop(
    controller: PollController,
    mut commands: mpsc::Receiver<Command>,
) -> AutoCheck {
    let mut timer = AutoCheckTimer::new(current_interval(&controller).await);
    let mut cycles = JoinSet::new();
    info!(interval = ?timer.period(), "Event loop started");

    spawn_check(&mut cycles, &controller);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                info!("Automatically checking chores");
                match controller.check_interval().await {
                    Ok(period) => timer.reset(period),
                    Err(e) => warn!(error = %e, "Error loading configuration"),
                }
                spawn_check(&mut cycles, &controller);
            }

            Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                if let Err(e) = joined {
                    error!(error = %e, "Cycle task failed");
                }
            }

            cmd = commands.recv() => {
                let Some(cmd) = cmd else {
                    info!("Command channel closed");
                    break;
                };
                match cmd {
                    Command::CheckNow => {
                        info!("Manually checking chores");
                        spawn_check(&mut cycles, &controller);
                    }
                    Command::ToggleAutoCheck => {
                        let state = timer.toggle(current_interval(&controller).await);
                        info!(interval = ?timer.period(), "Auto Check: {}", state);
                    }
                    Command::OpenWeb => open_web(&controller).await,
                    Command::OpenSettings => open_settings(&controller).await,
                    Command::Quit => {
                        info!("Quit requested");
                        break;
                    }
                }
            }
        }
    }

    let drain = async { while cycles.join_next().await.is_some() {} };
    if tokio::time::timeout(QUIT_GRACE, drain).await.is_err() {
        warn!(pending = cycles.len(), "Abandoning in-flight cycles");
        cycles.abort_all();
    }

    timer.state()
}

async fn open_web(controller: &PollController) {
    let url = match controller.web_link().await {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "Error loading configuration");
            return;
        }
    };
    info!(%url, "Opening Grocy web interface");
    if let Err(e) = controller.presenter().open_url(&url).await {
        warn!(error = %e, "Error opening browser");
    }
}

async fn open_settings(controller: &PollController) {
    let Some(path) = controller.config_source().path() else {
        info!("Configuration is not file-backed");
        return;
    };
    if let Err(e) = controller.presenter().open_path(path).await {
        warn!(error = %e, "Error opening file browser");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("check".parse::<Command>().unwrap(), Command::CheckNow);
        assert_eq!(" T \n".parse::<Command>().unwrap(), Command::ToggleAutoCheck);
        assert_eq!("web".parse::<Command>().unwrap(), Command::OpenWeb);
        assert_eq!("s".parse::<Command>().unwrap(), Command::OpenSettings);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn test_unknown_command() {
        let err = "dance".parse::<Command>().unwrap_err();
        assert!(err.contains("dance"));
    }

    #[tokio::test]
    async fn test_read_commands_skips_junk() {
        let (tx, mut rx) = mpsc::channel(8);
        let input: &[u8] = b"check\n\nfoo\ntoggle\nquit\n";
        read_commands(input, tx).await;

        let mut got = Vec::new();
        while let Some(cmd) = rx.recv().await {
            got.push(cmd);
        }
        assert_eq!(
            got,
            vec![Command::CheckNow, Command::ToggleAutoCheck, Command::Quit]
        );
    }
}
