//! System clipboard access.
//!
//! The game's "copy nickname" button writes to the emulator clipboard,
//! which the emulator mirrors to the host clipboard.

use anyhow::{Result, anyhow};

pub trait Clipboard {
    fn write(&mut self, text: &str) -> Result<()>;
    fn read(&mut self) -> Result<String>;
}

/// Host clipboard backed by arboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let inner =
            arboard::Clipboard::new().map_err(|e| anyhow!("Failed to open clipboard: {}", e))?;
        Ok(Self { inner })
    }
}

impl Clipboard for SystemClipboard {
    fn write(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| anyhow!("Failed to write clipboard: {}", e))
    }

    fn read(&mut self) -> Result<String> {
        match self.inner.get_text() {
            Ok(text) => Ok(text),
            // An empty clipboard is a missing nickname, not a session error
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(anyhow!("Failed to read clipboard: {}", e)),
        }
    }
}
