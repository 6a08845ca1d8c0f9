use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use btleplug::api::{Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter, ValueNotification, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use log::{debug, info, warn};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio::time::sleep;

use crate::device::constants::{make_radio_command_uuid, make_radio_notify_uuid, make_radio_service_uuid, SCAN_POLL_DELAY};
use crate::device::link::{LinkHandle, Transport};
use crate::device::types::LinkObserver;
use crate::error::LinkError;

/// btleplug backed transport. Cancelling `cancel` aborts a running discovery and tears down every
/// link that was opened through this transport.
pub struct BtleTransport {
    cancel: CancellationToken,
    write_deadline: Duration,
}

impl BtleTransport {
    pub fn new(cancel: CancellationToken, write_deadline: Duration) -> Self {
        BtleTransport { cancel, write_deadline }
    }
}

fn environment_error(err: LinkError) -> LinkError {
    if err.is_environment_error() {
        LinkError::EnvironmentUnsupported
    } else {
        err
    }
}

async fn start_scanning(manager: &Manager) -> Result<Vec<Adapter>, LinkError> {
    let adapters = manager.adapters().await?;
    if adapters.is_empty() {
        return Err(LinkError::EnvironmentUnsupported);
    }

    // the radio does not advertise its service uuid, so we can only filter by name afterwards
    for adapter in &adapters {
        info!("Scanning using adapter {}...", adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
        adapter.start_scan(ScanFilter::default()).await?;
    }

    Ok(adapters)
}

async fn stop_scanning(adapters: &[Adapter]) {
    for adapter in adapters {
        if let Err(err) = adapter.stop_scan().await {
            warn!("Failed to stop scanning: {}", err);
        }
    }
}

async fn find_peripheral(adapters: &[Adapter], name_filter: &str) -> Option<(Adapter, Peripheral)> {
    for adapter in adapters {
        let peripherals = match adapter.peripherals().await {
            Ok(v) => v,
            Err(err) => {
                warn!("Failed to query BLE adapter for peripherals: {}", err);
                continue;
            },
        };

        for peripheral in peripherals {
            match peripheral.properties().await {
                Err(err) => {
                    warn!("Could not query peripheral for properties: {:?}", err);
                },
                Ok(None) => {},
                Ok(Some(properties)) => {
                    if properties.local_name.as_deref() == Some(name_filter) {
                        info!(
                            "Using peripheral {} {:?} {}",
                            properties.address,
                            properties.address_type,
                            name_filter,
                        );
                        return Some((adapter.clone(), peripheral));
                    }
                }
            }
        }
    }

    None
}

async fn discover(adapters: &[Adapter], name_filter: &str, cancel: &CancellationToken) -> Result<(Adapter, Peripheral), LinkError> {
    // no deadline: discovery runs until the radio shows up or the application quits
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Err(LinkError::UserCancelled),
            found = find_peripheral(adapters, name_filter) => {
                if let Some(found) = found {
                    return Ok(found);
                }
                debug!("No peripheral named {} yet", name_filter);
            },
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(LinkError::UserCancelled),
            _ = sleep(Duration::from_millis(SCAN_POLL_DELAY)) => {},
        }
    }
}

async fn watch_disconnect(
    adapter: &Adapter,
    peripheral_id: PeripheralId,
    observer: LinkObserver,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>, LinkError> {
    let mut events = adapter.events().await?;

    Ok(spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.next() => match event {
                    Some(CentralEvent::DeviceDisconnected(id)) if id == peripheral_id => {
                        info!("Radio disconnected");
                        observer.disconnected();
                        break;
                    },
                    Some(_) => {},
                    None => {
                        warn!("Adapter event stream ended, treating the radio as lost");
                        observer.disconnected();
                        break;
                    },
                },
            }
        }
    }))
}

async fn connect_peripheral(peripheral: &Peripheral) -> Result<(Characteristic, Characteristic), LinkError> {
    let service_uuid = make_radio_service_uuid();
    let command_uuid = make_radio_command_uuid();
    let notify_uuid = make_radio_notify_uuid();

    info!("Connecting to peripheral...");
    peripheral.connect().await?;

    info!("Connected; Discovering services...");
    peripheral.discover_services().await?;

    let service = peripheral.services()
        .into_iter()
        .find(|service| service.uuid == service_uuid)
        .ok_or(LinkError::MissingCharacteristic)?;

    let find = |uuid| service.characteristics
        .iter()
        .find(|characteristic| characteristic.uuid == uuid)
        .cloned()
        .ok_or(LinkError::MissingCharacteristic);

    Ok((find(command_uuid)?, find(notify_uuid)?))
}

#[async_trait]
impl Transport for BtleTransport {
    async fn discover_and_connect(
        &self,
        name_filter: &str,
        observer: LinkObserver,
    ) -> Result<Box<dyn LinkHandle>, LinkError> {
        let manager = Manager::new().await.map_err(|err| {
            warn!("Failed to create BLE manager: {}", err);
            LinkError::EnvironmentUnsupported
        })?;

        let adapters = start_scanning(&manager).await.map_err(environment_error)?;
        let found = discover(&adapters, name_filter, &self.cancel).await;
        stop_scanning(&adapters).await;
        let (adapter, peripheral) = found?;

        let link_cancel = self.cancel.child_token();
        watch_disconnect(&adapter, peripheral.id(), observer, link_cancel.clone())
            .await
            .map_err(environment_error)?;

        match connect_peripheral(&peripheral).await {
            Ok((command_char, notify_char)) => {
                info!("Radio ready");
                Ok(Box::new(BtleLink {
                    peripheral,
                    command_char,
                    notify_char,
                    write_deadline: self.write_deadline,
                    link_cancel,
                    subscription: None,
                }))
            },
            Err(err) => {
                warn!("Connecting to peripheral failed: {:?}", err);
                link_cancel.cancel();
                if let Err(err) = peripheral.disconnect().await {
                    debug!("Disconnect after failed connect: {}", err);
                }
                Err(LinkError::ConnectionFailed { reason: err.to_string() })
            },
        }
    }
}

pub struct BtleLink {
    peripheral: Peripheral,
    command_char: Characteristic,
    notify_char: Characteristic,
    write_deadline: Duration,
    // cancelled when the link is dropped, stops the disconnect watcher and the notification task
    link_cancel: CancellationToken,
    subscription: Option<CancellationToken>,
}

fn read_notifications_task(
    cancel: CancellationToken,
    mut notification_stream: Pin<Box<dyn Stream<Item = ValueNotification> + Send>>,
    observer: LinkObserver,
) -> JoinHandle<()> {
    let notify_uuid = make_radio_notify_uuid();

    spawn(async move {
        'mainloop: loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    break 'mainloop;
                },
                notification = notification_stream.next() => match notification {
                    Some(data) => {
                        if data.uuid == notify_uuid {
                            observer.frame(data.value);
                        }
                    },
                    None => {
                        debug!("Notification stream ended");
                        break 'mainloop;
                    },
                },
            }
        }
    })
}

async fn write_within<F>(deadline: Duration, write: F) -> Result<(), LinkError>
where
    F: Future<Output = Result<(), btleplug::Error>>,
{
    // a hung write would stall the session loop, which handles one event at a time
    tokio::select! {
        _ = sleep(deadline) => {
            Err(LinkError::WriteFailed { reason: "write took too long".to_string() })
        }
        result = write => {
            result.map_err(|err| LinkError::WriteFailed { reason: err.to_string() })
        }
    }
}

#[async_trait]
impl LinkHandle for BtleLink {
    async fn write(&self, bytes: &[u8]) -> Result<(), LinkError> {
        let write_type = if self.command_char.properties.contains(CharPropFlags::WRITE) {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };
        let fut = self.peripheral.write(&self.command_char, bytes, write_type);
        write_within(self.write_deadline, fut).await
    }

    async fn subscribe(&mut self, observer: LinkObserver) -> Result<(), LinkError> {
        if let Some(previous) = self.subscription.take() {
            debug!("Replacing notification subscription");
            previous.cancel();
        }

        info!("Subscribing to characteristic {:?}", self.notify_char.uuid);
        self.peripheral.subscribe(&self.notify_char).await?;
        let notification_stream = self.peripheral.notifications().await?;

        let cancel = self.link_cancel.child_token();
        read_notifications_task(cancel.clone(), notification_stream, observer);
        self.subscription = Some(cancel);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        self.link_cancel.cancel();
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

impl Drop for BtleLink {
    fn drop(&mut self) {
        self.link_cancel.cancel();
    }
}
