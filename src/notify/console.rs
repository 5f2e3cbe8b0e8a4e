use super::{status_glyph, PresentError, Presenter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Prints notifications to stdout. Used for headless hosts and `--notifier console`.
#[derive(Debug, Default)]
pub struct ConsolePresenter {
    warning: AtomicBool,
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Presenter for ConsolePresenter {
    async fn notify(&self, title: &str, message: &str) -> Result<(), PresentError> {
        println!("[{}] {}", title, message.replace('\n', "\n    "));
        Ok(())
    }

    fn set_icon(&self, warning: bool) {
        let previous = self.warning.swap(warning, Ordering::Relaxed);
        if previous != warning {
            info!(warning, "Status {}", status_glyph(warning));
        }
    }

    async fn open_url(&self, url: &str) -> Result<(), PresentError> {
        println!("{}", url);
        Ok(())
    }

    async fn open_path(&self, path: &Path) -> Result<(), PresentError> {
        println!("{}", path.display());
        Ok(())
    }
}
