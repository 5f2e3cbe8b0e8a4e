//! Presentation sink: notifications, status icon, and opening links.
//!
//! The polling core only produces a message and an overdue flag; how those
//! reach the user is up to the [`Presenter`] implementation.

pub mod console;
pub mod desktop;

pub use self::console::ConsolePresenter;
pub use self::desktop::DesktopPresenter;

use std::path::Path;
use thiserror::Error;

/// Title used for every notification.
pub const NOTIFICATION_TITLE: &str = "Chorewatch";

/// At most this many chore names are listed in a notification.
pub const MAX_LISTED: usize = 3;

#[derive(Debug, Error)]
pub enum PresentError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit {
        program: &'static str,
        status: std::process::ExitStatus,
    },

    #[error("desktop notifications are not supported on {0}")]
    Unsupported(&'static str),
}

/// Where the user sees the outcome of a cycle.
#[async_trait::async_trait]
pub trait Presenter: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<(), PresentError>;

    /// Switch the status indicator between normal and warning.
    fn set_icon(&self, warning: bool);

    async fn open_url(&self, url: &str) -> Result<(), PresentError>;

    async fn open_path(&self, path: &Path) -> Result<(), PresentError>;
}

/// Build the notification body for a set of overdue chores, or `None` when
/// there is nothing overdue.
///
/// ```
/// let names = vec!["Dishes".to_string()];
/// assert_eq!(
///     chorewatch::notify::summary_message(&names).unwrap(),
///     "You have 1 overdue chores!\n\n- Dishes"
/// );
/// ```
pub fn summary_message(overdue: &[String]) -> Option<String> {
    if overdue.is_empty() {
        return None;
    }

    let mut message = format!("You have {} overdue chores!\n", overdue.len());
    for name in overdue.iter().take(MAX_LISTED) {
        message.push_str("\n- ");
        message.push_str(name);
    }
    if overdue.len() > MAX_LISTED {
        message.push_str(&format!("\n...and {} more", overdue.len() - MAX_LISTED));
    }
    Some(message)
}

/// Single-character status glyph for terminals.
pub fn status_glyph(warning: bool) -> &'static str {
    if warning {
        "⚠"
    } else {
        "✓"
    }
}
