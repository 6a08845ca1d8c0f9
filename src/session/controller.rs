use log::{debug, info, warn};

use crate::device::link::LinkHandle;
use crate::device::types::{AttemptId, LinkEvent};
use crate::error::LinkError;
use crate::playback::player::{LocalPlayer, PlaybackChange};
use crate::protocol::{Command, Notification};
use crate::session::state::{LinkStatus, SessionState};
use crate::session::view::{RadioView, OFFLINE_TEXT};
use crate::session::volume::VolumeKnob;

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Connect,
    Unlink,
    RefreshList,
    SelectStation { name: String, url: String },
    PlayLocally { name: String, url: String },
    DeleteStation(usize),
    AddStation { name: String, url: String },
    SetBuffer(String),
    SetWifi { ssid: String, password: String },
    /// Pointer position relative to the volume knob's center.
    VolumeGesture { dx: f32, dy: f32 },
}

/// Work the session cannot do itself because it has to happen outside of the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    /// Run linking attempt `AttemptId` and report its outcome as a `LinkEvent`.
    Link(AttemptId),
    /// Send `Intent::RefreshList` once the radio had time to update its station store.
    RefreshLater,
}

/// Owns the link to the radio and keeps the view consistent with it.
///
/// All methods run to completion before the next intent or link event is looked at, so the only
/// surprises are events that arrive in a state their sender did not expect. Those are checked
/// against `state` and the attempt they belong to.
pub struct Session<V: RadioView> {
    state: SessionState,
    attempt: AttemptId,
    link: Option<Box<dyn LinkHandle>>,
    // the radio went away while the current attempt was still running
    attempt_lost: bool,
    view: V,
    knob: VolumeKnob,
    player: LocalPlayer,
}

impl<V: RadioView> Session<V> {
    pub fn new(view: V, knob: VolumeKnob, player: LocalPlayer) -> Self {
        Session {
            state: SessionState::Disconnected,
            attempt: 0,
            link: None,
            attempt_lost: false,
            view,
            knob,
            player,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn knob_angle(&self) -> f32 {
        self.knob.angle()
    }

    /// Disconnected/LinkLost -> Linking. Returns the id of the new attempt, or None when a link
    /// exists or is already being set up.
    pub fn begin_linking(&mut self) -> Option<AttemptId> {
        if !self.state.can_link() {
            debug!("Ignoring connect request while {:?}", self.state);
            return None;
        }

        self.attempt += 1;
        self.state = SessionState::Linking;
        self.attempt_lost = false;
        self.view.set_status(LinkStatus::Linking);
        info!("Linking (attempt {})", self.attempt);
        Some(self.attempt)
    }

    pub async fn handle_intent(&mut self, intent: Intent) -> Option<Followup> {
        match intent {
            Intent::Connect => {
                return self.begin_linking().map(Followup::Link);
            },
            Intent::Unlink => {
                if self.state == SessionState::Online {
                    info!("Unlinking on request");
                    self.enter_link_lost(LinkStatus::Offline).await;
                }
            },
            Intent::RefreshList => {
                self.refresh_list().await;
            },
            Intent::SelectStation { name, url } => {
                for command in Command::select_station(&name, &url) {
                    self.send_command(command).await;
                }
            },
            Intent::PlayLocally { name, url } => {
                self.play_locally(&name, &url);
            },
            Intent::DeleteStation(index) => {
                self.send_command(Command::Delete(index)).await;
                return Some(Followup::RefreshLater);
            },
            Intent::AddStation { name, url } => {
                if name.is_empty() || url.is_empty() {
                    debug!("Not adding a station without both name and url");
                    return None;
                }
                self.send_command(Command::Add { name, url }).await;
                return Some(Followup::RefreshLater);
            },
            Intent::SetBuffer(value) => {
                self.send_command(Command::Buffer(value)).await;
            },
            Intent::SetWifi { ssid, password } => {
                self.send_command(Command::Wifi { ssid, password }).await;
            },
            Intent::VolumeGesture { dx, dy } => {
                for command in self.knob.sample(dx, dy) {
                    self.send_command(command).await;
                }
            },
        }

        None
    }

    pub async fn handle_link_event(&mut self, event: LinkEvent) {
        if event.attempt() != self.attempt {
            debug!("Ignoring {:?}, current attempt is {}", event, self.attempt);
            if let LinkEvent::Established { link, .. } = event {
                release_link(link).await;
            }
            return;
        }

        match event {
            LinkEvent::Established { link, .. } => {
                if self.state == SessionState::Linking && self.attempt_lost {
                    info!("Radio was lost while linking, dropping the new link");
                    release_link(link).await;
                    self.reset_to_disconnected();
                } else if self.state == SessionState::Linking {
                    self.link = Some(link);
                    self.enter_online().await;
                } else {
                    // lost while it was still being set up
                    info!("Link established while {:?}, dropping it", self.state);
                    release_link(link).await;
                }
            },
            LinkEvent::Failed { error, .. } => {
                if self.state == SessionState::Linking {
                    self.linking_failed(error);
                } else {
                    debug!("Linking failed while {:?}: {}", self.state, error);
                }
            },
            LinkEvent::Frame { data, .. } => {
                if self.state == SessionState::Online {
                    self.handle_frame(&data);
                } else {
                    debug!("Ignoring frame while {:?}", self.state);
                }
            },
            LinkEvent::Disconnected { .. } => match self.state {
                SessionState::Online => {
                    warn!("Lost the link to the radio");
                    self.enter_link_lost(LinkStatus::LinkLost).await;
                },
                SessionState::Linking => {
                    // the attempt is still running and will report back, until then no new
                    // attempt may start
                    warn!("Lost the radio while linking");
                    self.attempt_lost = true;
                },
                _ => debug!("Disconnect reported while {:?}", self.state),
            },
        }
    }

    /// Best effort: without a link the command is dropped, the radio has no queue either.
    pub async fn send_command(&mut self, command: Command) {
        let Some(link) = &self.link else {
            debug!("Dropping {}: {}", command, LinkError::NotConnected);
            return;
        };

        let result = link.write(&command.encode()).await;
        match result {
            Ok(()) => debug!("Sent {}", command),
            Err(err) => {
                warn!("Command {} failed: {}", command, err);
                if self.state == SessionState::Online {
                    self.enter_link_lost(LinkStatus::CommandFailed).await;
                }
            },
        }
    }

    /// Applies one notification frame from the radio to the view.
    pub fn handle_frame(&mut self, frame: &[u8]) {
        match Notification::decode(frame) {
            Notification::NowPlaying { name } => {
                self.view.set_now_playing(&name.to_uppercase());
                self.view.sync_dial(&name);
            },
            Notification::Station(station) => {
                self.view.render_station(&station);
                self.view.render_dial_entry(&station.label());
            },
            Notification::Unknown(text) => {
                debug!("Ignoring frame {:?}", text);
            },
        }
    }

    /// Drop the link and stop local playback; used when the application quits.
    pub async fn shutdown(&mut self) {
        if let Some(link) = self.link.take() {
            release_link(link).await;
        }
        self.state = SessionState::Disconnected;
        self.player.stop();
    }

    async fn refresh_list(&mut self) {
        self.view.clear_stations();
        self.send_command(Command::List).await;
    }

    async fn enter_online(&mut self) {
        info!("Radio online");
        self.state = SessionState::Online;
        self.view.set_status(LinkStatus::Online);
        self.view.set_connect_visible(false);
        // the station list always comes from the radio, never from what we showed before
        self.refresh_list().await;
    }

    async fn enter_link_lost(&mut self, status: LinkStatus) {
        if let Some(link) = self.link.take() {
            release_link(link).await;
        }

        self.state = SessionState::LinkLost;
        self.view.set_status(status);
        self.view.set_connect_visible(true);
        self.view.set_now_playing(OFFLINE_TEXT);
        self.view.clear_active_markers();
    }

    fn reset_to_disconnected(&mut self) {
        self.state = SessionState::Disconnected;
        self.attempt_lost = false;
        self.view.set_status(LinkStatus::Offline);
        self.view.set_connect_visible(true);
    }

    fn linking_failed(&mut self, error: LinkError) {
        warn!("Linking failed: {}", error);
        self.reset_to_disconnected();

        if matches!(error, LinkError::EnvironmentUnsupported) {
            self.view.show_notice(&error.to_string());
        }
    }

    fn play_locally(&mut self, name: &str, url: &str) {
        match self.player.toggle(url) {
            Ok(PlaybackChange::Started) => {
                self.view.set_now_playing(&format!("MOBILE: {}", name.to_uppercase()));
            },
            Ok(PlaybackChange::Paused) => {},
            Err(err) => {
                warn!("Local playback failed: {}", err);
                self.view.show_notice(&err.to_string());
            },
        }
    }
}

async fn release_link(link: Box<dyn LinkHandle>) {
    if let Err(err) = link.disconnect().await {
        debug!("Disconnecting a released link failed: {}", err);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};
    use async_trait::async_trait;
    use futures::channel::mpsc::unbounded;

    use super::*;
    use crate::device::types::LinkObserver;
    use crate::playback::player::tests::FakeOutput;
    use crate::session::view::DisplayModel;

    /// In-memory radio link: remembers every line written to it.
    #[derive(Clone, Default)]
    pub struct FakeLink {
        pub written: Arc<Mutex<Vec<String>>>,
        pub disconnects: Arc<Mutex<usize>>,
        pub fail_writes: Arc<Mutex<bool>>,
    }

    impl FakeLink {
        pub fn lines(&self) -> Vec<String> {
            self.written.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LinkHandle for FakeLink {
        async fn write(&self, bytes: &[u8]) -> Result<(), LinkError> {
            if *self.fail_writes.lock().unwrap() {
                return Err(LinkError::WriteFailed { reason: "radio gone".to_string() });
            }
            let line = String::from_utf8(bytes.to_vec()).unwrap();
            assert!(line.ends_with('\n'));
            self.written.lock().unwrap().push(line.trim_end_matches('\n').to_string());
            Ok(())
        }

        async fn subscribe(&mut self, _observer: LinkObserver) -> Result<(), LinkError> {
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), LinkError> {
            *self.disconnects.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn session() -> Session<DisplayModel> {
        Session::new(
            DisplayModel::new(),
            VolumeKnob::new(30),
            LocalPlayer::new(Box::new(FakeOutput::default())),
        )
    }

    async fn online_session() -> (Session<DisplayModel>, FakeLink) {
        let mut session = session();
        let link = FakeLink::default();
        let attempt = session.begin_linking().unwrap();
        session.handle_link_event(LinkEvent::Established { attempt, link: Box::new(link.clone()) }).await;
        (session, link)
    }

    async fn frame(session: &mut Session<DisplayModel>, text: &str) {
        let attempt = session.attempt();
        session.handle_link_event(LinkEvent::Frame { attempt, data: text.as_bytes().to_vec() }).await;
    }

    #[tokio::test]
    async fn test_online_requests_station_list() {
        let (session, link) = online_session().await;
        assert_eq!(session.state(), SessionState::Online);
        assert_eq!(session.view().status, LinkStatus::Online);
        assert!(!session.view().connect_visible);
        assert_eq!(link.lines(), vec!["LIST"]);
    }

    #[tokio::test]
    async fn test_connect_ignored_while_linking_or_online() {
        let mut session = session();
        assert_eq!(session.handle_intent(Intent::Connect).await, Some(Followup::Link(1)));
        assert_eq!(session.handle_intent(Intent::Connect).await, None);

        let link = FakeLink::default();
        session.handle_link_event(LinkEvent::Established { attempt: 1, link: Box::new(link) }).await;
        assert_eq!(session.handle_intent(Intent::Connect).await, None);
        assert_eq!(session.attempt(), 1);
    }

    #[tokio::test]
    async fn test_linking_failure_resets() {
        let mut session = session();
        let attempt = session.begin_linking().unwrap();
        assert_eq!(session.view().status, LinkStatus::Linking);

        session.handle_link_event(LinkEvent::Failed {
            attempt,
            error: LinkError::ConnectionFailed { reason: "timeout".to_string() },
        }).await;
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.view().status, LinkStatus::Offline);
        assert!(session.view().connect_visible);
        assert!(session.view().notices.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_environment_is_reported() {
        let mut session = session();
        let attempt = session.begin_linking().unwrap();
        session.handle_link_event(LinkEvent::Failed { attempt, error: LinkError::EnvironmentUnsupported }).await;
        assert_eq!(session.view().notices, vec!["Bluetooth is not available on this system"]);
        // no automatic retry
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_station_records_render_in_order() {
        let (mut session, _link) = online_session().await;
        frame(&mut session, "0|Jazz FM|http://x/jazz").await;
        frame(&mut session, "1|Rock|http://x/rock|extra").await;
        frame(&mut session, "garbage").await;
        frame(&mut session, "1|Rock|http://x/rock").await;

        let view = session.view();
        let names: Vec<_> = view.stations.iter().map(|station| station.name.as_str()).collect();
        assert_eq!(names, vec!["Jazz FM", "Rock", "Rock"]);
        let labels: Vec<_> = view.dial.iter().map(|entry| entry.label.as_str()).collect();
        assert_eq!(labels, vec!["JAZZ FM", "ROCK", "ROCK"]);
    }

    #[tokio::test]
    async fn test_station_with_unparsable_index_is_listed() {
        let (mut session, _link) = online_session().await;
        frame(&mut session, "A1|Jazz FM|http://x/stream").await;
        frame(&mut session, "NOW:Jazz FM").await;

        let view = session.view();
        assert_eq!(view.stations.len(), 1);
        assert_eq!(view.stations[0].index, None);
        assert_eq!(view.stations[0].name, "Jazz FM");
        assert_eq!(view.dial.len(), 1);
        assert_eq!(view.active_dial_index(), Some(0));
    }

    #[tokio::test]
    async fn test_now_playing_before_and_after_station() {
        let (mut session, _link) = online_session().await;

        frame(&mut session, "NOW:Jazz FM").await;
        assert_eq!(session.view().now_playing, "JAZZ FM");
        assert_eq!(session.view().active_dial_index(), None);

        frame(&mut session, "0|Jazz FM|http://x/stream").await;
        assert_eq!(session.view().active_dial_index(), None);

        frame(&mut session, "NOW:Jazz FM").await;
        assert_eq!(session.view().dial.len(), 1);
        assert_eq!(session.view().dial[0].label, "JAZZ FM");
        assert_eq!(session.view().active_dial_index(), Some(0));
    }

    #[tokio::test]
    async fn test_now_playing_switches_active_station() {
        let (mut session, _link) = online_session().await;
        frame(&mut session, "0|Jazz FM|http://x/jazz").await;
        frame(&mut session, "1|Rock|http://x/rock").await;
        frame(&mut session, "NOW:JAZZ fm").await;
        frame(&mut session, "NOW:rock").await;

        let active: Vec<_> = session.view().dial.iter().map(|entry| entry.active).collect();
        assert_eq!(active, vec![false, true]);

        frame(&mut session, "NOW:Unknown").await;
        assert_eq!(session.view().active_dial_index(), Some(1));
        assert_eq!(session.view().now_playing, "UNKNOWN");
    }

    #[tokio::test]
    async fn test_link_lost_clears_live_state() {
        let (mut session, link) = online_session().await;
        frame(&mut session, "0|Jazz FM|http://x/jazz").await;
        frame(&mut session, "NOW:Jazz FM").await;

        session.handle_link_event(LinkEvent::Disconnected { attempt: 1 }).await;
        let view = session.view();
        assert_eq!(session.state(), SessionState::LinkLost);
        assert_eq!(view.status, LinkStatus::LinkLost);
        assert!(view.connect_visible);
        assert_eq!(view.now_playing, "OFFLINE");
        assert_eq!(view.active_dial_index(), None);
        assert_eq!(*link.disconnects.lock().unwrap(), 1);

        // reconnecting asks for the list again
        let relink = FakeLink::default();
        let attempt = session.begin_linking().unwrap();
        session.handle_link_event(LinkEvent::Established { attempt, link: Box::new(relink.clone()) }).await;
        assert_eq!(relink.lines(), vec!["LIST"]);
        assert!(session.view().stations.is_empty());
        assert!(session.view().dial.is_empty());
    }

    #[tokio::test]
    async fn test_commands_dropped_while_offline() {
        let mut session = session();
        session.send_command(Command::VolumeUp).await;
        assert_eq!(session.handle_intent(Intent::SetBuffer("8192".to_string())).await, None);
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_intents_encode_commands() {
        let (mut session, link) = online_session().await;
        session.handle_intent(Intent::SelectStation { name: "Jazz FM".to_string(), url: "http://x/jazz".to_string() }).await;
        assert_eq!(session.handle_intent(Intent::DeleteStation(3)).await, Some(Followup::RefreshLater));
        assert_eq!(
            session.handle_intent(Intent::AddStation { name: "New".to_string(), url: "http://n".to_string() }).await,
            Some(Followup::RefreshLater),
        );
        assert_eq!(session.handle_intent(Intent::AddStation { name: "".to_string(), url: "http://n".to_string() }).await, None);
        session.handle_intent(Intent::SetBuffer("16384".to_string())).await;
        session.handle_intent(Intent::SetWifi { ssid: "home".to_string(), password: "pw".to_string() }).await;
        session.handle_intent(Intent::RefreshList).await;

        assert_eq!(link.lines(), vec![
            "LIST",
            "NAME:Jazz FM",
            "PLAY_URL:http://x/jazz",
            "DEL:3",
            "ADD:New|http://n",
            "BUFFER:16384",
            "WIFI:home|pw",
            "LIST",
        ]);
    }

    #[tokio::test]
    async fn test_volume_gesture_sends_steps() {
        let (mut session, link) = online_session().await;
        // 100 degrees: three 30 degree boundaries from the resting position
        let radians = 100f32.to_radians();
        session.handle_intent(Intent::VolumeGesture { dx: radians.cos(), dy: radians.sin() }).await;
        session.handle_intent(Intent::VolumeGesture { dx: radians.cos(), dy: radians.sin() }).await;
        assert_eq!(link.lines(), vec!["LIST", "VOL_UP", "VOL_UP", "VOL_UP"]);
    }

    #[tokio::test]
    async fn test_write_failure_moves_to_link_lost() {
        let (mut session, link) = online_session().await;
        *link.fail_writes.lock().unwrap() = true;

        session.handle_intent(Intent::SelectStation { name: "A".to_string(), url: "http://a".to_string() }).await;
        assert_eq!(session.state(), SessionState::LinkLost);
        assert_eq!(session.view().status, LinkStatus::CommandFailed);
        assert!(session.view().connect_visible);
        assert_eq!(*link.disconnects.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_during_linking() {
        let mut session = session();
        let attempt = session.begin_linking().unwrap();
        session.handle_link_event(LinkEvent::Disconnected { attempt }).await;
        assert_eq!(session.state(), SessionState::Linking);

        // the first attempt is still running, a second one must wait for it
        assert_eq!(session.handle_intent(Intent::Connect).await, None);
        assert_eq!(session.attempt(), 1);

        // the attempt finishing afterwards must not bring a dead link online
        let late = FakeLink::default();
        session.handle_link_event(LinkEvent::Established { attempt, link: Box::new(late.clone()) }).await;
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.view().status, LinkStatus::Offline);
        assert!(session.view().connect_visible);
        assert!(late.lines().is_empty());
        assert_eq!(*late.disconnects.lock().unwrap(), 1);

        assert_eq!(session.handle_intent(Intent::Connect).await, Some(Followup::Link(2)));
    }

    #[tokio::test]
    async fn test_disconnect_during_linking_then_failure() {
        let mut session = session();
        let attempt = session.begin_linking().unwrap();
        session.handle_link_event(LinkEvent::Disconnected { attempt }).await;
        session.handle_link_event(LinkEvent::Failed {
            attempt,
            error: LinkError::ConnectionFailed { reason: "gone".to_string() },
        }).await;
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.begin_linking(), Some(2));
    }

    #[tokio::test]
    async fn test_stale_attempt_events_ignored() {
        let (mut session, _link) = online_session().await;
        session.handle_link_event(LinkEvent::Disconnected { attempt: 1 }).await;
        let attempt = session.begin_linking().unwrap();
        assert_eq!(attempt, 2);

        // leftovers of the first link
        session.handle_link_event(LinkEvent::Frame { attempt: 1, data: b"0|Old|http://o".to_vec() }).await;
        session.handle_link_event(LinkEvent::Disconnected { attempt: 1 }).await;
        assert_eq!(session.state(), SessionState::Linking);
        assert!(session.view().stations.is_empty());
    }

    #[tokio::test]
    async fn test_unlink() {
        let (mut session, link) = online_session().await;
        session.handle_intent(Intent::Unlink).await;
        assert_eq!(session.state(), SessionState::LinkLost);
        assert_eq!(session.view().status, LinkStatus::Offline);
        assert_eq!(*link.disconnects.lock().unwrap(), 1);

        // the transport's own disconnect report arrives afterwards and changes nothing
        session.handle_link_event(LinkEvent::Disconnected { attempt: 1 }).await;
        assert_eq!(session.view().status, LinkStatus::Offline);
    }

    #[tokio::test]
    async fn test_play_locally() {
        let mut session = session();
        session.handle_intent(Intent::PlayLocally { name: "Jazz FM".to_string(), url: "http://x/jazz".to_string() }).await;
        assert_eq!(session.view().now_playing, "MOBILE: JAZZ FM");

        session.handle_intent(Intent::PlayLocally { name: "Bad".to_string(), url: "ftp://x".to_string() }).await;
        assert_eq!(session.view().notices.len(), 1);
    }

    #[test]
    fn test_observer_reports_attempt() {
        let (sender, mut receiver) = unbounded();
        let observer = LinkObserver::new(7, sender);
        observer.frame(b"NOW:x".to_vec());
        observer.disconnected();

        let first = receiver.try_next().unwrap().unwrap();
        assert!(matches!(first, LinkEvent::Frame { attempt: 7, .. }));
        let second = receiver.try_next().unwrap().unwrap();
        assert!(matches!(second, LinkEvent::Disconnected { attempt: 7 }));
    }
}
