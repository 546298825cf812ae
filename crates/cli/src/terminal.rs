//! Terminal presentation layer

use colored::Colorize;
use vcall_client_core::{Notice, NoticeLevel, TrackRenderer, TrackTile};

/// Prints the session view as indented text
#[derive(Default)]
pub struct TerminalRenderer {
    lines: Vec<String>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the buffered view to stdout
    pub fn flush(&mut self) {
        for line in self.lines.drain(..) {
            println!("{}", line);
        }
    }
}

impl TrackRenderer for TerminalRenderer {
    fn section(&mut self, title: &str) {
        self.lines.push(title.bold().to_string());
    }

    fn line(&mut self, text: &str) {
        self.lines.push(format!("  {}", text));
    }

    fn tile(&mut self, tile: &TrackTile) {
        let video = tile.video.as_ref().map_or("-".to_string(), |t| t.id.clone());
        let audio = tile.audio.as_ref().map_or("-".to_string(), |t| t.id.clone());
        let label = tile.label.as_deref().unwrap_or("local");
        self.lines
            .push(format!("  [{}] video: {}  audio: {}", label.cyan(), video, audio));
    }
}

/// Print a user-visible message
pub fn show_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Success => println!("{} {}", "✔".green(), notice.text),
        NoticeLevel::Error => eprintln!("{} {}", "✘".red(), notice.text.red()),
    }
}
