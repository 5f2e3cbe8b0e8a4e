use super::{status_glyph, PresentError, Presenter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;
use tracing::{debug, info};

/// Native desktop notifications via the platform's notifier command, and
/// the system handler for URLs and folders.
#[derive(Debug, Default)]
pub struct DesktopPresenter {
    warning: AtomicBool,
}

impl DesktopPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Escape a string for an AppleScript string literal.
fn applescript_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

async fn run(program: &'static str, cmd: &mut Command) -> Result<(), PresentError> {
    let status = cmd
        .status()
        .await
        .map_err(|source| PresentError::Launch { program, source })?;
    if !status.success() {
        return Err(PresentError::Exit { program, status });
    }
    Ok(())
}

#[async_trait::async_trait]
impl Presenter for DesktopPresenter {
    async fn notify(&self, title: &str, message: &str) -> Result<(), PresentError> {
        debug!(%title, "Sending desktop notification");
        match std::env::consts::OS {
            "linux" | "freebsd" | "openbsd" | "netbsd" => {
                let mut cmd = Command::new("notify-send");
                cmd.arg("--app-name=chorewatch").arg(title).arg(message);
                run("notify-send", &mut cmd).await
            }
            "macos" => {
                let script = format!(
                    "display notification {} with title {}",
                    applescript_quote(message),
                    applescript_quote(title)
                );
                let mut cmd = Command::new("osascript");
                cmd.arg("-e").arg(script);
                run("osascript", &mut cmd).await
            }
            other => Err(PresentError::Unsupported(other)),
        }
    }

    fn set_icon(&self, warning: bool) {
        let previous = self.warning.swap(warning, Ordering::Relaxed);
        if previous != warning {
            info!(warning, "Status {}", status_glyph(warning));
        }
    }

    async fn open_url(&self, url: &str) -> Result<(), PresentError> {
        open::that_detached(url).map_err(|source| PresentError::Launch {
            program: "browser",
            source,
        })
    }

    async fn open_path(&self, path: &Path) -> Result<(), PresentError> {
        open::that_detached(path).map_err(|source| PresentError::Launch {
            program: "file browser",
            source,
        })
    }
}
