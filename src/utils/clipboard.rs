use anyhow::Result;

/// System clipboard, if one is reachable
pub struct Clipboard {
    clipboard: Option<arboard::Clipboard>,
}

impl Clipboard {
    pub fn new() -> Self {
        let clipboard = match arboard::Clipboard::new() {
            Ok(cb) => Some(cb),
            Err(e) => {
                log::warn!("Clipboard unavailable: {}", e);
                None
            }
        };
        Self { clipboard }
    }

    /// A clipboard that always fails, for headless runs
    pub fn unavailable() -> Self {
        Self { clipboard: None }
    }

    pub fn is_available(&self) -> bool {
        self.clipboard.is_some()
    }

    /// Set text to clipboard
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        match &mut self.clipboard {
            Some(cb) => {
                cb.set_text(text)?;
                Ok(())
            }
            None => anyhow::bail!("Clipboard not available"),
        }
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}
