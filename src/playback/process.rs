use std::process::Stdio;
use log::{debug, warn};
use tokio::process::{Child, Command};

use crate::config::types::PlayerConfig;
use crate::error::PlaybackError;
use crate::playback::player::AudioOutput;

/// Streams by running an external player (mpv by default) with the url as its last argument.
/// Pausing stops the process; the stream is live, there is nothing to resume.
pub struct ProcessOutput {
    config: PlayerConfig,
    child: Option<Child>,
}

impl ProcessOutput {
    pub fn new(config: PlayerConfig) -> Self {
        ProcessOutput { config, child: None }
    }
}

fn check_url(url: &str) -> Result<(), PlaybackError> {
    // anything else could be read by the player as an option or a local file
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(PlaybackError::NotHttp { url: url.to_string() })
    }
}

impl AudioOutput for ProcessOutput {
    fn play(&mut self, url: &str) -> Result<(), PlaybackError> {
        check_url(url)?;
        self.pause();

        debug!("Starting {} {:?} {}", self.config.program, self.config.args, url);
        let child = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        self.child = Some(child);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.start_kill() {
                warn!("Failed to stop the audio player: {}", err);
            }
        }
    }

    fn is_playing(&mut self) -> bool {
        match self.child.as_mut().map(|child| child.try_wait()) {
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                debug!("Audio player exited: {}", status);
                self.child = None;
                false
            },
            Some(Err(err)) => {
                warn!("Failed to query the audio player: {}", err);
                false
            },
            None => false,
        }
    }
}
