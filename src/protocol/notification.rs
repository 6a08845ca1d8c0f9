const NOW_PREFIX: &str = "NOW:";

/// One station as reported by the radio in reply to LIST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    /// Assigned by the radio, used for DEL. None when the radio sent something that is not a
    /// number; such a station is still listed but cannot be deleted.
    pub index: Option<usize>,
    pub name: String,
    pub url: String,
}

impl Station {
    /// The name as the dial shows it.
    pub fn label(&self) -> String {
        self.name.to_uppercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    NowPlaying { name: String },
    Station(Station),
    /// Anything the client does not understand. Newer firmware may send more.
    Unknown(String),
}

impl Notification {
    /// Rules are tried in order, the first one that matches wins.
    pub fn decode(frame: &[u8]) -> Notification {
        let text = String::from_utf8_lossy(frame);
        let text = text.trim();

        if let Some(name) = text.strip_prefix(NOW_PREFIX) {
            return Notification::NowPlaying { name: name.to_string() };
        }

        if text.contains('|') {
            let mut fields = text.split('|');
            if let (Some(index), Some(name), Some(url)) = (fields.next(), fields.next(), fields.next()) {
                return Notification::Station(Station {
                    index: index.trim().parse().ok(),
                    name: name.to_string(),
                    url: url.to_string(),
                });
            }
        }

        Notification::Unknown(text.to_string())
    }
}
