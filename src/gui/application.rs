use futures::channel::mpsc::UnboundedSender;
use iced::{Alignment, Application, Command, Element, Length, Settings, Size, Subscription, window};
use iced::event::{self, Event};
use iced::executor;
use iced::theme::{self, Theme};
use iced::widget::{
    Canvas, Column, Row, Space, button, column, container, horizontal_rule, row, scrollable, text, text_input,
};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::io::ConfigIO;
use crate::config::types::{Config, LogLevel};
use crate::error::AppRunError;
use crate::gui::knob::Knob;
use crate::gui::style::{DialItemStyleSheet, TextButtonStyleSheet, AMBER, DIM, NEEDLE_RED};
use crate::gui::types::{FormChange, Message, Tab};
use crate::protocol::Station;
use crate::session::driver::{remote_subscription, SessionEvent};
use crate::session::state::LinkStatus;
use crate::session::view::DisplayModel;
use crate::session::Intent;

/// How many dial entries are visible around the one the dial is scrolled to.
const DIAL_WINDOW: usize = 2;

/// Settings given on the command line, they win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub device_name: Option<String>,
    pub log_level: Option<LogLevel>,
}

pub struct ApplicationFlags {
    pub config_io: ConfigIO,
    pub overrides: Overrides,
}

#[derive(Debug, Clone, Default)]
struct Forms {
    new_station_name: String,
    new_station_url: String,
    buffer_size: String,
    wifi_ssid: String,
    wifi_password: String,
}

pub struct RemoteApplication {
    // this token is cancelled upon exit
    app_cancel: CancellationToken,

    // messages that the user must click away
    notices: Vec<String>,

    config_io: ConfigIO,
    overrides: Overrides,
    // None until loaded; the session only starts once we know which radio to look for
    config: Option<Config>,
    // this flag is used to make sure that a user is not spammed with save configuration errors
    displayed_config_save_error: bool,

    intents: Option<UnboundedSender<Intent>>,
    display: DisplayModel,
    knob_angle: f32,
    tab: Tab,
    pending_delete: Option<Station>,
    forms: Forms,
}

impl RemoteApplication {
    fn before_close(&mut self) {
        self.app_cancel.cancel();
    }

    fn load_config(&self) -> Command<Message> {
        let config_io = self.config_io.clone();

        let fut = async move {
            match config_io.read().await {
                Ok(config) => (config, None),
                Err(err) => {
                    if err.is_file_not_found_error() {
                        info!("Config file not found, using defaults");
                        (Config::default(), None)
                    } else {
                        error!("Failed to load config: {:?}", &err);
                        (Config::default(), Some(format!("Failed to load config: {}", &err)))
                    }
                }
            }
        };

        Command::perform(fut, Message::ConfigLoadComplete)
    }

    fn save_config(&self) -> Command<Message> {
        let Some(config) = self.config.clone() else {
            return Command::none();
        };
        let config_io = self.config_io.clone();

        let fut = async move {
            match config_io.save(config).await {
                Ok(_) => None,
                Err(err) => {
                    error!("Failed to save config: {:?}", &err);
                    Some(format!("Failed to save config: {}", &err))
                },
            }
        };

        Command::perform(fut, Message::ConfigSaveComplete)
    }

    fn send_intent(&self, intent: Intent) {
        match &self.intents {
            Some(sender) => {
                if let Err(err) = sender.unbounded_send(intent) {
                    warn!("Session is not running, dropping {:?}", err.into_inner());
                }
            },
            None => warn!("Session not started yet, dropping {:?}", intent),
        }
    }

    fn apply_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Ready(sender) => {
                info!("Session ready");
                self.intents = Some(sender);
            },
            SessionEvent::View(updates) => {
                for update in updates {
                    update.apply(&mut self.display);
                }
                self.notices.append(&mut self.display.notices);
            },
            SessionEvent::KnobAngle(angle) => {
                self.knob_angle = angle;
            },
        }
    }

    fn station_at(&self, position: usize) -> Option<Station> {
        self.display.stations.get(position).cloned()
    }

    fn header(&self) -> Element<Message> {
        let status_color = match self.display.status {
            LinkStatus::Online => AMBER,
            LinkStatus::LinkLost | LinkStatus::CommandFailed => NEEDLE_RED,
            LinkStatus::Linking | LinkStatus::Offline => DIM,
        };

        let link_button = if self.display.connect_visible {
            button(text("CONNECT")).style(theme::Button::Primary).on_press(Message::ConnectPress)
        } else {
            button(text("UNLINK")).style(theme::Button::Secondary).on_press(Message::UnlinkPress)
        };

        let tabs = Row::with_children(
            Tab::ALL
                .iter()
                .map(|tab| {
                    button(text(tab.title()))
                        .style(if *tab == self.tab { theme::Button::Primary } else { theme::Button::Secondary })
                        .on_press(Message::TabSelected(*tab))
                })
                .map(Element::from)
        ).spacing(10);

        column![
            row![
                text(self.display.status.text()).style(status_color).size(18),
                Space::with_width(Length::Fill),
                link_button,
            ].align_items(Alignment::Center),
            tabs,
            horizontal_rule(10),
        ]
        .spacing(10)
        .into()
    }

    fn radio_tab(&self) -> Element<Message> {
        let position = self.display.dial_position();
        let first = position.saturating_sub(DIAL_WINDOW);

        let dial = Row::with_children(
            self.display.dial
                .iter()
                .skip(first)
                .take(DIAL_WINDOW * 2 + 1)
                .map(|entry| {
                    container(text(&entry.label).size(14))
                        .padding(8)
                        .width(Length::Fixed(110.0))
                        .style(theme::Container::Custom(Box::new(DialItemStyleSheet { active: entry.active })))
                })
                .map(Element::from)
        ).spacing(10);

        column![
            text(&self.display.now_playing).size(24).style(AMBER),
            dial,
            Canvas::new(Knob { angle: self.knob_angle })
                .width(Length::Fixed(200.0))
                .height(Length::Fixed(200.0)),
            text("VOLUME").size(12).style(DIM),
        ]
        .spacing(30)
        .align_items(Alignment::Center)
        .width(Length::Fill)
        .into()
    }

    fn stations_tab(&self) -> Element<Message> {
        let station_row = |position: usize, station: &Station| -> Element<Message> {
            row![
                button(
                    column![
                        text(&station.name),
                        text(&station.url).size(11).style(DIM),
                    ]
                )
                .style(theme::Button::Custom(Box::new(TextButtonStyleSheet)))
                .width(Length::Fill)
                .on_press(Message::StationPress(position)),

                button(text("PLAY HERE").size(12))
                    .style(theme::Button::Secondary)
                    .on_press(Message::PlayLocallyPress(position)),

                // the radio deletes by index, a station without one cannot be deleted
                button(text("X").size(12))
                    .style(theme::Button::Destructive)
                    .on_press_maybe(station.index.map(|_| Message::DeletePress(position))),
            ]
            .align_items(Alignment::Center)
            .spacing(10)
            .into()
        };

        let list = Column::with_children(
            self.display.stations
                .iter()
                .enumerate()
                .map(|(position, station)| station_row(position, station))
        ).spacing(8);

        let mut add_button = button(text("ADD STATION")).style(theme::Button::Positive);
        if !self.forms.new_station_name.is_empty() && !self.forms.new_station_url.is_empty() {
            add_button = add_button.on_press(Message::AddStationPress);
        }

        column![
            scrollable(list).height(Length::Fill),
            horizontal_rule(10),
            text_input("Station name", &self.forms.new_station_name)
                .on_input(|value| Message::FormChange(FormChange::NewStationName(value))),
            text_input("Stream url", &self.forms.new_station_url)
                .on_input(|value| Message::FormChange(FormChange::NewStationUrl(value))),
            add_button,
        ]
        .spacing(10)
        .into()
    }

    fn settings_tab(&self) -> Element<Message> {
        column![
            text("BUFFER SIZE").size(12).style(DIM),
            row![
                text_input("bytes", &self.forms.buffer_size)
                    .on_input(|value| Message::FormChange(FormChange::BufferSize(value))),
                button(text("SAVE")).on_press(Message::SaveBufferPress),
            ].spacing(10),

            horizontal_rule(10),

            text("WIFI").size(12).style(DIM),
            text_input("SSID", &self.forms.wifi_ssid)
                .on_input(|value| Message::FormChange(FormChange::WifiSsid(value))),
            text_input("Password", &self.forms.wifi_password)
                .secure(true)
                .on_input(|value| Message::FormChange(FormChange::WifiPassword(value))),
            button(text("SEND TO RADIO")).on_press(Message::SendWifiPress),
        ]
        .spacing(10)
        .into()
    }
}

impl Application for RemoteApplication {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = ApplicationFlags;

    fn new(flags: ApplicationFlags) -> (RemoteApplication, Command<Self::Message>) {
        let app = RemoteApplication {
            app_cancel: CancellationToken::new(),
            notices: Vec::new(),
            config_io: flags.config_io,
            overrides: flags.overrides,
            config: None,
            displayed_config_save_error: false,
            intents: None,
            display: DisplayModel::new(),
            knob_angle: 0.0,
            tab: Tab::Radio,
            pending_delete: None,
            forms: Forms::default(),
        };

        let command = app.load_config();
        (app, command)
    }

    fn title(&self) -> String {
        String::from(concat!("DexRadio Remote ", env!("CARGO_PKG_VERSION")))
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn update(&mut self, message: Message) -> Command<Self::Message> {
        match message {
            Message::ConfigLoadComplete((config, error_message)) => {
                info!("Config load complete");
                if let Some(error_message) = error_message {
                    self.notices.push(error_message);
                }

                let level = self.overrides.log_level.unwrap_or(config.log_level);
                log::set_max_level(level.to_filter());

                self.forms.buffer_size = config.buffer_size.map(|size| size.to_string()).unwrap_or_default();
                self.forms.wifi_ssid = config.wifi_ssid.clone().unwrap_or_default();
                self.config = Some(config);
            },
            Message::ConfigSaveComplete(error_message) => {
                if !self.displayed_config_save_error {
                    if let Some(error_message) = error_message {
                        self.displayed_config_save_error = true;
                        self.notices.push(error_message);
                    }
                }
            },
            Message::Session(event) => {
                self.apply_session_event(event);
            },
            Message::NoticeConfirmed => {
                if !self.notices.is_empty() {
                    self.notices.remove(0);
                }
            },
            Message::EventOccurred(Event::Window(id, window::Event::CloseRequested)) => {
                info!("Close requested");
                self.before_close();
                return window::close(id);
            },
            Message::EventOccurred(_) => {},
            Message::TabSelected(tab) => {
                self.tab = tab;
            },
            Message::ConnectPress => {
                self.send_intent(Intent::Connect);
            },
            Message::UnlinkPress => {
                self.send_intent(Intent::Unlink);
            },
            Message::StationPress(position) => {
                if let Some(station) = self.station_at(position) {
                    self.send_intent(Intent::SelectStation { name: station.name, url: station.url });
                }
            },
            Message::PlayLocallyPress(position) => {
                if let Some(station) = self.station_at(position) {
                    self.send_intent(Intent::PlayLocally { name: station.name, url: station.url });
                }
            },
            Message::DeletePress(position) => {
                self.pending_delete = self.station_at(position);
            },
            Message::DeleteConfirmed => {
                if let Some(index) = self.pending_delete.take().and_then(|station| station.index) {
                    self.send_intent(Intent::DeleteStation(index));
                }
            },
            Message::DeleteCancelled => {
                self.pending_delete = None;
            },
            Message::FormChange(change) => match change {
                FormChange::NewStationName(value) => self.forms.new_station_name = value,
                FormChange::NewStationUrl(value) => self.forms.new_station_url = value,
                FormChange::BufferSize(value) => self.forms.buffer_size = value,
                FormChange::WifiSsid(value) => self.forms.wifi_ssid = value,
                FormChange::WifiPassword(value) => self.forms.wifi_password = value,
            },
            Message::AddStationPress => {
                let name = std::mem::take(&mut self.forms.new_station_name);
                let url = std::mem::take(&mut self.forms.new_station_url);
                self.send_intent(Intent::AddStation { name, url });
            },
            Message::SaveBufferPress => {
                let value = self.forms.buffer_size.trim().to_string();
                self.send_intent(Intent::SetBuffer(value.clone()));

                if let Some(config) = &mut self.config {
                    config.buffer_size = value.parse().ok();
                }
                return self.save_config();
            },
            Message::SendWifiPress => {
                let ssid = self.forms.wifi_ssid.clone();
                let password = std::mem::take(&mut self.forms.wifi_password);
                self.send_intent(Intent::SetWifi { ssid: ssid.clone(), password });

                if let Some(config) = &mut self.config {
                    config.wifi_ssid = Some(ssid);
                }
                return self.save_config();
            },
            Message::KnobTurned { dx, dy } => {
                self.send_intent(Intent::VolumeGesture { dx, dy });
            },
        }

        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![event::listen().map(Message::EventOccurred)];

        if let Some(config) = &self.config {
            // the override only applies to this run, it is never written to the config file
            let mut config = config.clone();
            if let Some(device_name) = &self.overrides.device_name {
                config.device_name = device_name.clone();
            }

            subscriptions.push(
                remote_subscription(config, self.app_cancel.clone()).map(Message::Session)
            );
        }

        Subscription::batch(subscriptions)
    }

    fn view(&self) -> Element<Message> {
        if let Some(notice) = self.notices.first() {
            return container(
                column![
                    text(notice),

                    button(text("Okay"))
                        .on_press(Message::NoticeConfirmed),

                ].align_items(Alignment::Center).spacing(20),
            )
            .width(Length::Fill)
            .padding(20)
            .into()
        }

        if let Some(station) = &self.pending_delete {
            return container(
                column![
                    text(format!("ERASE {}?", station.name.to_uppercase())),
                    row![
                        button(text("ERASE"))
                            .style(theme::Button::Destructive)
                            .on_press(Message::DeleteConfirmed),
                        button(text("CANCEL"))
                            .style(theme::Button::Secondary)
                            .on_press(Message::DeleteCancelled),
                    ].spacing(20),
                ].align_items(Alignment::Center).spacing(20),
            )
            .width(Length::Fill)
            .padding(20)
            .into()
        }

        let body = match self.tab {
            Tab::Radio => self.radio_tab(),
            Tab::Stations => self.stations_tab(),
            Tab::Settings => self.settings_tab(),
        };

        container(
            column![
                self.header(),
                body,
            ].spacing(20),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(20)
        .into()
    }
}

pub fn run_application(overrides: Overrides) -> Result<(), AppRunError> {
    let mut config_io = ConfigIO::new_sync()?;
    let mut config_locker = config_io.locker()?;
    let _lock_guard = config_locker.lock()?;

    let flags = ApplicationFlags { config_io, overrides };
    let mut settings = Settings::with_flags(flags);

    // handle exits ourselves (Event::CloseRequested)
    settings.id = Some("dexradio-remote".to_string());
    settings.window.exit_on_close_request = false;
    settings.window.size = Size::new(480.0, 720.0);
    settings.window.min_size = Some(Size::new(360.0, 560.0));

    // this function will call process::exit() unless there was a startup error
    RemoteApplication::run(settings)?;
    Ok(())
}
