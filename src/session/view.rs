use crate::protocol::Station;
use crate::session::state::LinkStatus;

/// Horizontal distance (pixels) between two entries of the tuning dial.
pub const DIAL_ITEM_WIDTH: f32 = 120.0;

/// Text shown in place of the now playing station while there is no link.
pub const OFFLINE_TEXT: &str = "OFFLINE";

/// What the session may change on screen. The session never reads presentation state back except
/// through `sync_dial`, which does its own lookup.
pub trait RadioView {
    fn set_status(&mut self, status: LinkStatus);
    fn set_connect_visible(&mut self, visible: bool);
    /// Empties both the station list and the dial.
    fn clear_stations(&mut self);
    fn render_station(&mut self, station: &Station);
    fn render_dial_entry(&mut self, label: &str);
    fn set_now_playing(&mut self, text: &str);
    /// Mark the first dial entry whose label equals `name` (ignoring case) as the only active one
    /// and scroll it into view. Leaves the dial alone when nothing matches.
    fn sync_dial(&mut self, name: &str);
    fn clear_active_markers(&mut self);
    /// A message the user has to acknowledge.
    fn show_notice(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct DialEntry {
    pub label: String,
    pub active: bool,
}

/// Everything the window shows about the radio.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayModel {
    pub status: LinkStatus,
    pub connect_visible: bool,
    pub stations: Vec<Station>,
    pub dial: Vec<DialEntry>,
    /// Horizontal translation of the dial strip, zero or negative.
    pub dial_offset: f32,
    pub now_playing: String,
    pub notices: Vec<String>,
}

impl DisplayModel {
    pub fn new() -> Self {
        DisplayModel {
            status: LinkStatus::Offline,
            connect_visible: true,
            stations: Vec::new(),
            dial: Vec::new(),
            dial_offset: 0.0,
            now_playing: String::new(),
            notices: Vec::new(),
        }
    }

    pub fn active_dial_index(&self) -> Option<usize> {
        self.dial.iter().position(|entry| entry.active)
    }

    /// The dial entry the strip is scrolled to.
    pub fn dial_position(&self) -> usize {
        (-self.dial_offset / DIAL_ITEM_WIDTH).round().max(0.0) as usize
    }
}

impl Default for DisplayModel {
    fn default() -> Self {
        DisplayModel::new()
    }
}

impl RadioView for DisplayModel {
    fn set_status(&mut self, status: LinkStatus) {
        self.status = status;
    }

    fn set_connect_visible(&mut self, visible: bool) {
        self.connect_visible = visible;
    }

    fn clear_stations(&mut self) {
        self.stations.clear();
        self.dial.clear();
    }

    fn render_station(&mut self, station: &Station) {
        self.stations.push(station.clone());
    }

    fn render_dial_entry(&mut self, label: &str) {
        self.dial.push(DialEntry { label: label.to_string(), active: false });
    }

    fn set_now_playing(&mut self, text: &str) {
        self.now_playing = text.to_string();
    }

    fn sync_dial(&mut self, name: &str) {
        let name = name.to_uppercase();
        let Some(found) = self.dial.iter().position(|entry| entry.label.to_uppercase() == name) else {
            return;
        };

        self.dial_offset = found as f32 * -DIAL_ITEM_WIDTH;
        for (index, entry) in self.dial.iter_mut().enumerate() {
            entry.active = index == found;
        }
    }

    fn clear_active_markers(&mut self) {
        for entry in &mut self.dial {
            entry.active = false;
        }
    }

    fn show_notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

/// A recorded `RadioView` call, so view changes can travel over a channel to the window.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    Status(LinkStatus),
    ConnectVisible(bool),
    ClearStations,
    Station(Station),
    DialEntry(String),
    NowPlaying(String),
    SyncDial(String),
    ClearActiveMarkers,
    Notice(String),
}

impl ViewUpdate {
    pub fn apply<V: RadioView + ?Sized>(self, view: &mut V) {
        match self {
            ViewUpdate::Status(status) => view.set_status(status),
            ViewUpdate::ConnectVisible(visible) => view.set_connect_visible(visible),
            ViewUpdate::ClearStations => view.clear_stations(),
            ViewUpdate::Station(station) => view.render_station(&station),
            ViewUpdate::DialEntry(label) => view.render_dial_entry(&label),
            ViewUpdate::NowPlaying(text) => view.set_now_playing(&text),
            ViewUpdate::SyncDial(name) => view.sync_dial(&name),
            ViewUpdate::ClearActiveMarkers => view.clear_active_markers(),
            ViewUpdate::Notice(message) => view.show_notice(&message),
        }
    }
}

#[derive(Debug, Default)]
pub struct UpdateBuffer {
    updates: Vec<ViewUpdate>,
}

impl UpdateBuffer {
    pub fn drain(&mut self) -> Vec<ViewUpdate> {
        std::mem::take(&mut self.updates)
    }
}

impl RadioView for UpdateBuffer {
    fn set_status(&mut self, status: LinkStatus) {
        self.updates.push(ViewUpdate::Status(status));
    }

    fn set_connect_visible(&mut self, visible: bool) {
        self.updates.push(ViewUpdate::ConnectVisible(visible));
    }

    fn clear_stations(&mut self) {
        self.updates.push(ViewUpdate::ClearStations);
    }

    fn render_station(&mut self, station: &Station) {
        self.updates.push(ViewUpdate::Station(station.clone()));
    }

    fn render_dial_entry(&mut self, label: &str) {
        self.updates.push(ViewUpdate::DialEntry(label.to_string()));
    }

    fn set_now_playing(&mut self, text: &str) {
        self.updates.push(ViewUpdate::NowPlaying(text.to_string()));
    }

    fn sync_dial(&mut self, name: &str) {
        self.updates.push(ViewUpdate::SyncDial(name.to_string()));
    }

    fn clear_active_markers(&mut self) {
        self.updates.push(ViewUpdate::ClearActiveMarkers);
    }

    fn show_notice(&mut self, message: &str) {
        self.updates.push(ViewUpdate::Notice(message.to_string()));
    }
}
