use iced::Event;

use crate::config::types::Config;
use crate::session::driver::SessionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Radio,
    Stations,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Radio, Tab::Stations, Tab::Settings];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Radio => "RADIO",
            Tab::Stations => "STATIONS",
            Tab::Settings => "SETTINGS",
        }
    }
}

#[derive(Debug, Clone)]
pub enum FormChange {
    NewStationName(String),
    NewStationUrl(String),
    BufferSize(String),
    WifiSsid(String),
    WifiPassword(String),
}

#[derive(Debug, Clone)]
pub enum Message {
    EventOccurred(Event),
    ConfigLoadComplete((Config, Option<String>)),
    ConfigSaveComplete(Option<String>),
    Session(SessionEvent),
    NoticeConfirmed,
    TabSelected(Tab),
    ConnectPress,
    UnlinkPress,
    // the usize is the position in the displayed station list
    StationPress(usize),
    PlayLocallyPress(usize),
    DeletePress(usize),
    DeleteConfirmed,
    DeleteCancelled,
    FormChange(FormChange),
    AddStationPress,
    SaveBufferPress,
    SendWifiPress,
    KnobTurned { dx: f32, dy: f32 },
}
