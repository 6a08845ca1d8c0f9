use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use futures::channel::mpsc::{unbounded, Sender, UnboundedReceiver, UnboundedSender};
use futures::{SinkExt, StreamExt};
use iced::subscription::{self, Subscription};
use log::{debug, info, warn};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::types::Config;
use crate::device::connection::BtleTransport;
use crate::device::link::Transport;
use crate::device::types::{LinkEvent, LinkObserver};
use crate::error::LinkError;
use crate::playback::player::LocalPlayer;
use crate::playback::process::ProcessOutput;
use crate::session::controller::{Followup, Intent, Session};
use crate::session::view::{UpdateBuffer, ViewUpdate};
use crate::session::volume::VolumeKnob;

/// What the session tells the window.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session is running, intents go here.
    Ready(UnboundedSender<Intent>),
    View(Vec<ViewUpdate>),
    KnobAngle(f32),
}

fn spawn_link_attempt<T: Transport>(transport: Arc<T>, device_name: String, observer: LinkObserver) -> JoinHandle<()> {
    spawn(async move {
        let result = async {
            let mut link = transport.discover_and_connect(&device_name, observer.clone()).await?;
            if let Err(err) = link.subscribe(observer.clone()).await {
                if let Err(err) = link.disconnect().await {
                    debug!("Disconnect after failed subscribe: {}", err);
                }
                return Err(LinkError::ConnectionFailed { reason: err.to_string() });
            }
            Ok(link)
        }.await;

        match result {
            Ok(link) => observer.established(link),
            Err(err) => observer.failed(err),
        }
    })
}

fn schedule_refresh(intents: UnboundedSender<Intent>, delay: Duration, cancel: CancellationToken) {
    spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {},
            _ = sleep(delay) => {
                if intents.unbounded_send(Intent::RefreshList).is_err() {
                    debug!("Session stopped before the station list refresh");
                }
            },
        }
    });
}

/// Runs `session` until `cancel` fires or the window stops listening. Intents and link events are
/// handled one at a time; linking itself happens in a spawned task so the loop stays responsive
/// while it is in flight.
pub async fn run_session<T: Transport>(
    transport: Arc<T>,
    mut session: Session<UpdateBuffer>,
    device_name: String,
    refresh_delay: Duration,
    intents: (UnboundedSender<Intent>, UnboundedReceiver<Intent>),
    mut output: Sender<SessionEvent>,
    cancel: CancellationToken,
) {
    let (intent_sender, mut intent_receiver) = intents;
    let (link_sender, mut link_receiver) = unbounded::<LinkEvent>();
    let mut knob_angle = session.knob_angle();

    'mainloop: loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break 'mainloop;
            },
            Some(intent) = intent_receiver.next() => {
                match session.handle_intent(intent).await {
                    Some(Followup::Link(attempt)) => {
                        let observer = LinkObserver::new(attempt, link_sender.clone());
                        spawn_link_attempt(transport.clone(), device_name.clone(), observer);
                    },
                    Some(Followup::RefreshLater) => {
                        schedule_refresh(intent_sender.clone(), refresh_delay, cancel.clone());
                    },
                    None => {},
                }
            },
            Some(event) = link_receiver.next() => {
                session.handle_link_event(event).await;
            },
        }

        let updates = session.view_mut().drain();
        if !updates.is_empty() && output.send(SessionEvent::View(updates)).await.is_err() {
            warn!("Window stopped listening to the session");
            break 'mainloop;
        }

        if session.knob_angle() != knob_angle {
            knob_angle = session.knob_angle();
            if output.send(SessionEvent::KnobAngle(knob_angle)).await.is_err() {
                break 'mainloop;
            }
        }
    }

    info!("Stopping session");
    session.shutdown().await;
}

pub fn remote_subscription(config: Config, cancel: CancellationToken) -> Subscription<SessionEvent> {
    struct Remote;

    subscription::channel(
        std::any::TypeId::of::<Remote>(),
        64,
        move |mut output| async move {
            let (intent_sender, intent_receiver) = unbounded::<Intent>();

            if output.send(SessionEvent::Ready(intent_sender.clone())).await.is_ok() {
                let transport = Arc::new(BtleTransport::new(cancel.clone(), config.write_deadline()));
                let session = Session::new(
                    UpdateBuffer::default(),
                    VolumeKnob::new(config.volume_step_degrees),
                    LocalPlayer::new(Box::new(ProcessOutput::new(config.player.clone()))),
                );

                run_session(
                    transport,
                    session,
                    config.device_name.clone(),
                    config.refresh_delay(),
                    (intent_sender, intent_receiver),
                    output,
                    cancel,
                ).await;
            }

            // subscription::channel expects the future to never resolve
            futures::future::pending::<Infallible>().await
        },
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use async_trait::async_trait;
    use futures::channel::mpsc::channel;

    use super::*;
    use crate::device::link::LinkHandle;
    use crate::playback::player::tests::FakeOutput;
    use crate::session::controller::tests::FakeLink;
    use crate::session::state::LinkStatus;
    use crate::session::view::DisplayModel;

    /// Hands out one prepared link per attempt and keeps the observers so tests can play radio.
    #[derive(Default)]
    struct FakeTransport {
        link: FakeLink,
        observers: Mutex<Vec<LinkObserver>>,
        unsupported: bool,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn discover_and_connect(&self, name_filter: &str, observer: LinkObserver) -> Result<Box<dyn LinkHandle>, LinkError> {
            assert_eq!(name_filter, "DexRadio_Remote");
            if self.unsupported {
                return Err(LinkError::EnvironmentUnsupported);
            }
            self.observers.lock().unwrap().push(observer);
            Ok(Box::new(self.link.clone()))
        }
    }

    struct Harness {
        transport: Arc<FakeTransport>,
        intents: UnboundedSender<Intent>,
        events: futures::channel::mpsc::Receiver<SessionEvent>,
        model: DisplayModel,
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    }

    impl Harness {
        fn start(transport: FakeTransport) -> Harness {
            let transport = Arc::new(transport);
            let (intent_sender, intent_receiver) = unbounded();
            let (output, events) = channel(64);
            let cancel = CancellationToken::new();
            let session = Session::new(
                UpdateBuffer::default(),
                VolumeKnob::new(30),
                LocalPlayer::new(Box::new(FakeOutput::default())),
            );

            let handle = spawn(run_session(
                transport.clone(),
                session,
                "DexRadio_Remote".to_string(),
                Duration::from_millis(1000),
                (intent_sender.clone(), intent_receiver),
                output,
                cancel.clone(),
            ));

            Harness { transport, intents: intent_sender, events, model: DisplayModel::new(), cancel, handle }
        }

        // applies view batches until `done` holds
        async fn until(&mut self, done: impl Fn(&DisplayModel) -> bool) {
            while !done(&self.model) {
                match self.events.next().await.expect("session stopped") {
                    SessionEvent::View(updates) => {
                        for update in updates {
                            update.apply(&mut self.model);
                        }
                    },
                    _ => {},
                }
            }
        }

        fn observer(&self) -> LinkObserver {
            self.transport.observers.lock().unwrap().last().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_connect_list_and_lose_link() {
        let mut harness = Harness::start(FakeTransport::default());
        harness.intents.unbounded_send(Intent::Connect).unwrap();
        harness.until(|model| model.status == LinkStatus::Online).await;
        assert_eq!(harness.transport.link.lines(), vec!["LIST"]);

        harness.observer().frame(b"0|Jazz FM|http://x/jazz\n".to_vec());
        harness.observer().frame(b"NOW:Jazz FM".to_vec());
        harness.until(|model| model.active_dial_index() == Some(0)).await;
        assert_eq!(harness.model.now_playing, "JAZZ FM");

        harness.observer().disconnected();
        harness.until(|model| model.status == LinkStatus::LinkLost).await;
        assert!(harness.model.connect_visible);
        assert_eq!(harness.model.now_playing, "OFFLINE");
        assert_eq!(harness.model.active_dial_index(), None);

        harness.cancel.cancel();
        harness.handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_unsupported_environment() {
        let mut harness = Harness::start(FakeTransport { unsupported: true, ..FakeTransport::default() });
        harness.intents.unbounded_send(Intent::Connect).unwrap();
        harness.until(|model| !model.notices.is_empty()).await;
        assert_eq!(harness.model.status, LinkStatus::Offline);
        assert!(harness.model.connect_visible);

        harness.cancel.cancel();
        harness.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_refreshes_list_later() {
        let mut harness = Harness::start(FakeTransport::default());
        harness.intents.unbounded_send(Intent::Connect).unwrap();
        harness.until(|model| model.status == LinkStatus::Online).await;

        harness.observer().frame(b"0|Jazz FM|http://x/jazz".to_vec());
        harness.until(|model| model.stations.len() == 1).await;

        harness.intents.unbounded_send(Intent::DeleteStation(0)).unwrap();
        // the refresh clears the list before asking for it again
        harness.until(|model| model.stations.is_empty()).await;
        assert_eq!(harness.transport.link.lines(), vec!["LIST", "DEL:0", "LIST"]);

        harness.cancel.cancel();
        harness.handle.await.unwrap();
    }
}
