use super::codec::{self, PacketRequest};
use super::models::{CalendarRequest, TimeRange};
use super::query::QueryEngine;
use super::stats::DispatchStats;
use crate::error::{plugin_error, Error, PluginResult};
use crate::packet::NetworkPacket;
use crate::permissions::PermissionCheck;
use crate::transport::PacketTransport;
use crate::utils::time::{format_millis, window_from};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// What happened to one inbound packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A response packet was handed to the transport
    Responded,
    /// The packet type is not one this plugin answers
    NotHandled,
    /// Read access to the store was not granted; nothing was sent
    PermissionDenied,
    /// The request was ours but no response could be produced
    Failed,
}

impl DispatchOutcome {
    /// Whether the packet was claimed by this plugin
    pub fn is_handled(&self) -> bool {
        !matches!(self, DispatchOutcome::NotHandled)
    }
}

/// The calendar actor that answers request packets, one at a time
pub struct CalendarActor {
    engine: QueryEngine,
    permissions: Arc<dyn PermissionCheck>,
    transport: Arc<dyn PacketTransport>,
    event_window_days: i64,
    stats: Arc<DispatchStats>,
    command_rx: mpsc::Receiver<CalendarCommand>,
}

/// Commands that can be sent to the calendar actor
pub enum CalendarCommand {
    HandlePacket(NetworkPacket, mpsc::Sender<DispatchOutcome>),
    Shutdown,
}

/// Handle for communicating with the calendar actor
#[derive(Clone)]
pub struct CalendarActorHandle {
    command_tx: mpsc::Sender<CalendarCommand>,
}

impl CalendarActorHandle {
    /// Queue a packet and wait for it to be handled
    pub async fn dispatch(&self, packet: NetworkPacket) -> PluginResult<DispatchOutcome> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(CalendarCommand::HandlePacket(packet, response_tx))
            .await
            .map_err(|e| plugin_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| plugin_error("Response channel closed"))
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> PluginResult<()> {
        let _ = self.command_tx.send(CalendarCommand::Shutdown).await;
        Ok(())
    }

    /// Resolves once the actor has dropped its mailbox
    pub async fn stopped(&self) {
        self.command_tx.closed().await;
    }
}

impl CalendarActor {
    /// Create a new actor and return its handle
    pub fn new(
        engine: QueryEngine,
        permissions: Arc<dyn PermissionCheck>,
        transport: Arc<dyn PacketTransport>,
        event_window_days: i64,
        stats: Arc<DispatchStats>,
    ) -> (Self, CalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            engine,
            permissions,
            transport,
            event_window_days,
            stats,
            command_rx,
        };

        let handle = CalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Calendar actor started");

        // Packets are handled strictly one after another
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                CalendarCommand::HandlePacket(packet, response_tx) => {
                    let outcome = self.handle_packet(packet).await;
                    let _ = response_tx.send(outcome).await;
                }
                CalendarCommand::Shutdown => {
                    info!("Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Calendar actor shut down");
    }

    /// Decode, check permission, query, encode and send
    async fn handle_packet(&self, packet: NetworkPacket) -> DispatchOutcome {
        let request = match codec::decode_request(&packet) {
            Ok(request) => request,
            Err(Error::UnsupportedRequest(packet_type)) => {
                debug!("Ignoring unsupported packet type {}", packet_type);
                self.stats.record_not_handled();
                return DispatchOutcome::NotHandled;
            }
            Err(e) => {
                warn!("Dropping {} packet: {}", packet.packet_type(), e);
                self.stats.record_failed();
                return DispatchOutcome::Failed;
            }
        };

        if let Err(e) = self.check_read_access(&request) {
            warn!("{}", e);
            self.stats.record_permission_denied();
            return DispatchOutcome::PermissionDenied;
        }

        let response = match self.resolve(request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to answer {}: {}", packet.packet_type(), e);
                self.stats.record_failed();
                return DispatchOutcome::Failed;
            }
        };

        let response_type = response.packet_type.clone();
        match self.transport.send_packet(response).await {
            Ok(()) => {
                debug!("Sent {} in reply to {}", response_type, packet.packet_type());
                self.stats.record_responded();
                DispatchOutcome::Responded
            }
            Err(e) => {
                error!("Failed to send {}: {}", response_type, e);
                self.stats.record_failed();
                DispatchOutcome::Failed
            }
        }
    }

    /// Run the queries a request needs and build the response packet
    async fn resolve(&self, request: PacketRequest) -> PluginResult<NetworkPacket> {
        match request {
            PacketRequest::AllCalendars { account, range } => {
                let all_calendars = self
                    .engine
                    .execute(&CalendarRequest::ListAllCalendars)
                    .await?
                    .into_calendars()
                    .unwrap_or_default();

                let account_calendars = match account {
                    Some(filter) => self
                        .engine
                        .execute(&CalendarRequest::ListCalendarsByAccount(filter))
                        .await?
                        .into_calendars()
                        .unwrap_or_default(),
                    None => Vec::new(),
                };

                let range = self.range_or_default(range)?;
                let events = self
                    .engine
                    .execute(&CalendarRequest::ListEvents(range))
                    .await?
                    .into_events()
                    .unwrap_or_default();

                Ok(codec::encode_calendars_response(
                    &all_calendars,
                    &account_calendars,
                    &events,
                    &*self.stats,
                ))
            }
            PacketRequest::AllEvents { range } => {
                let range = self.range_or_default(range)?;
                let events = self
                    .engine
                    .execute(&CalendarRequest::ListEvents(range))
                    .await?
                    .into_events()
                    .unwrap_or_default();

                Ok(codec::encode_events_response(&events, &*self.stats))
            }
        }
    }

    /// Read access is checked on every packet, never cached
    fn check_read_access(&self, request: &PacketRequest) -> PluginResult<()> {
        if self.permissions.has_read_access() {
            return Ok(());
        }
        Err(Error::PermissionDenied(format!(
            "calendar read access not granted, ignoring {}",
            request.packet_type()
        )))
    }

    fn range_or_default(&self, range: Option<TimeRange>) -> PluginResult<TimeRange> {
        match range {
            Some(range) => Ok(range),
            None => {
                let range = window_from(Utc::now(), self.event_window_days)?;
                debug!(
                    "No range requested, using {} to {}",
                    format_millis(range.start()),
                    format_millis(range.end())
                );
                Ok(range)
            }
        }
    }
}
