//! Terminal stand-ins for browser services: alerts, confirmation prompts,
//! clipboard and desktop notifications.

use std::io::{self, Write};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

const BELL: char = '\u{7}';
const ESC: char = '\u{1b}';

pub struct Terminal<W: Write> {
    out: W,
    system_notifications: bool,
}

impl<W: Write> Terminal<W> {
    pub fn new(out: W, system_notifications: bool) -> Self {
        Self {
            out,
            system_notifications,
        }
    }

    pub fn print(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    pub fn alert(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{BELL}{ESC}[1;7m ! {message} {ESC}[0m")?;
        self.out.flush()
    }

    pub fn prompt(&mut self, question: &str) -> io::Result<()> {
        write!(self.out, "{question} [y/N] ")?;
        self.out.flush()
    }

    /// Hands `text` to the terminal's clipboard through OSC 52.
    pub fn copy_to_clipboard(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{ESC}]52;c;{}{BELL}", BASE64.encode(text))?;
        self.out.flush()
    }

    /// OSC 9 desktop notification; skipped unless enabled in the config.
    pub fn notify(&mut self, title: &str, body: &str) -> io::Result<()> {
        if !self.system_notifications {
            return Ok(());
        }
        let clean = |text: &str| text.replace([ESC, BELL], "");
        write!(self.out, "{ESC}]9;{}: {}{BELL}", clean(title), clean(body))?;
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
