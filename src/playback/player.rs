use log::info;

use crate::error::PlaybackError;

/// Something that can stream a url on this computer.
pub trait AudioOutput: Send {
    fn play(&mut self, url: &str) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn is_playing(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackChange {
    Started,
    Paused,
}

/// Plays stations locally, next to (not through) the radio.
pub struct LocalPlayer {
    output: Box<dyn AudioOutput>,
    current_url: Option<String>,
}

impl LocalPlayer {
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        LocalPlayer { output, current_url: None }
    }

    /// Pressing play on the url that is currently playing pauses it, anything else switches to
    /// `url` and plays it.
    pub fn toggle(&mut self, url: &str) -> Result<PlaybackChange, PlaybackError> {
        if self.current_url.as_deref() == Some(url) && self.output.is_playing() {
            info!("Pausing local playback of {}", url);
            self.output.pause();
            return Ok(PlaybackChange::Paused);
        }

        info!("Playing {} locally", url);
        self.output.play(url)?;
        self.current_url = Some(url.to_string());
        Ok(PlaybackChange::Started)
    }

    pub fn stop(&mut self) {
        if self.output.is_playing() {
            self.output.pause();
        }
    }
}
