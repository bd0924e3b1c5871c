mod common;

use calendar_plugin::config::Config;
use calendar_plugin::packet::NetworkPacket;
use calendar_plugin::permissions::Permission;
use calendar_plugin::plugins::calendar::codec::{
    PACKET_TYPE_REQUEST_ALL_CALENDARS, PACKET_TYPE_REQUEST_ALL_EVENTS,
    PACKET_TYPE_RESPONSE_CALENDARS,
};
use calendar_plugin::plugins::{CalendarPlugin, PluginManager};
use common::{sample_store, RecordingTransport, SwitchablePermission};
use std::sync::Arc;
use tokio::sync::RwLock;

fn manager_with(config: Config, granted: bool) -> (PluginManager, Arc<RecordingTransport>) {
    let transport = RecordingTransport::new();
    let mut manager = PluginManager::new(Arc::new(RwLock::new(config)), transport.clone());
    manager.register(CalendarPlugin::new(
        Arc::new(sample_store()),
        SwitchablePermission::new(granted),
    ));
    (manager, transport)
}

#[tokio::test]
async fn test_routes_request_to_calendar_plugin() {
    let (manager, transport) = manager_with(Config::default(), true);
    manager.init_all().await.unwrap();

    let handled = manager
        .on_packet_received(NetworkPacket::new(PACKET_TYPE_REQUEST_ALL_CALENDARS))
        .await;

    assert!(handled);
    let sent = transport.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].packet_type(), PACKET_TYPE_RESPONSE_CALENDARS);
}

#[tokio::test]
async fn test_unknown_packet_type_is_not_handled() {
    let (manager, transport) = manager_with(Config::default(), true);
    manager.init_all().await.unwrap();

    assert!(!manager.on_packet_received(NetworkPacket::new("kdeconnect.ping")).await);
    assert!(!manager
        .on_packet_received(NetworkPacket::new("kdeconnect.calendar.foo"))
        .await);
    assert!(transport.sent().await.is_empty());
}

#[tokio::test]
async fn test_denied_request_still_counts_as_handled() {
    let (manager, transport) = manager_with(Config::default(), false);
    manager.init_all().await.unwrap();

    assert!(manager
        .on_packet_received(NetworkPacket::new(PACKET_TYPE_REQUEST_ALL_EVENTS))
        .await);
    assert!(transport.sent().await.is_empty());
}

#[tokio::test]
async fn test_uninitialized_plugin_does_not_handle() {
    let (manager, transport) = manager_with(Config::default(), true);

    assert!(!manager
        .on_packet_received(NetworkPacket::new(PACKET_TYPE_REQUEST_ALL_EVENTS))
        .await);
    assert!(transport.sent().await.is_empty());
}

#[tokio::test]
async fn test_disabled_plugin_is_not_initialized() {
    let mut config = Config::default();
    config.plugins.insert("calendar".to_string(), false);
    let (manager, _transport) = manager_with(config, true);
    manager.init_all().await.unwrap();

    let plugin = manager
        .get_plugin_by_name("calendar")
        .and_then(|p| p.as_any().downcast_ref::<CalendarPlugin>())
        .unwrap();
    assert!(plugin.get_handle().await.is_none());
}

#[tokio::test]
async fn test_missing_write_permission_does_not_block_init() {
    let mut config = Config::default();
    config.granted_permissions = vec![Permission::ReadCalendar];
    let (manager, _transport) = manager_with(config, true);
    manager.init_all().await.unwrap();

    let plugin = manager
        .get_plugin_by_name("calendar")
        .and_then(|p| p.as_any().downcast_ref::<CalendarPlugin>())
        .unwrap();
    assert!(plugin.get_handle().await.is_some());
}

#[tokio::test]
async fn test_plugin_metadata() {
    let (manager, _transport) = manager_with(Config::default(), true);

    assert_eq!(
        manager.supported_packet_types(),
        vec![PACKET_TYPE_REQUEST_ALL_CALENDARS, PACKET_TYPE_REQUEST_ALL_EVENTS]
    );

    let plugin = manager.get_plugin_by_name("calendar").unwrap();
    assert_eq!(plugin.display_name(), "Calendar");
    assert_eq!(
        plugin.required_permissions(),
        &[Permission::ReadCalendar, Permission::WriteCalendar]
    );
    assert!(manager.get_plugin_by_name("battery").is_none());
}

#[tokio::test]
async fn test_shutdown_releases_handle() {
    let (manager, transport) = manager_with(Config::default(), true);
    manager.init_all().await.unwrap();
    manager.shutdown_all().await.unwrap();

    let plugin = manager
        .get_plugin_by_name("calendar")
        .and_then(|p| p.as_any().downcast_ref::<CalendarPlugin>())
        .unwrap();
    assert!(plugin.get_handle().await.is_none());

    assert!(!manager
        .on_packet_received(NetworkPacket::new(PACKET_TYPE_REQUEST_ALL_EVENTS))
        .await);
    assert!(transport.sent().await.is_empty());
}
