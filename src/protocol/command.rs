use std::fmt;

/// A single line of the radio's command language.
///
/// Names, urls and credentials are sent verbatim. The radio splits on `|` and `:` without any
/// escaping, so a value containing those characters will be misread on the other side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    VolumeUp,
    VolumeDown,
    Name(String),
    PlayUrl(String),
    Delete(usize),
    Add { name: String, url: String },
    Buffer(String),
    Wifi { ssid: String, password: String },
}

impl Command {
    /// Selecting a station is two lines: NAME sets the context the following PLAY_URL plays in.
    pub fn select_station(name: &str, url: &str) -> [Command; 2] {
        [Command::Name(name.to_string()), Command::PlayUrl(url.to_string())]
    }

    /// Wire form: the command text followed by a single newline.
    pub fn encode(&self) -> Vec<u8> {
        let mut line = self.to_string();
        line.push('\n');
        line.into_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::List => write!(f, "LIST"),
            Command::VolumeUp => write!(f, "VOL_UP"),
            Command::VolumeDown => write!(f, "VOL_DN"),
            Command::Name(name) => write!(f, "NAME:{}", name),
            Command::PlayUrl(url) => write!(f, "PLAY_URL:{}", url),
            Command::Delete(index) => write!(f, "DEL:{}", index),
            Command::Add { name, url } => write!(f, "ADD:{}|{}", name, url),
            Command::Buffer(value) => write!(f, "BUFFER:{}", value),
            Command::Wifi { ssid, password } => write!(f, "WIFI:{}|{}", ssid, password),
        }
    }
}
