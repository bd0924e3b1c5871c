use crate::config::Config;
use crate::error::{Error, PluginResult};
use crate::permissions::GrantedPermissions;
use crate::plugins::calendar::{CalendarStore, JsonFileStore};
use crate::plugins::{CalendarPlugin, PluginManager};
use crate::shutdown;
use crate::transport::{LineTransport, PacketReader, PacketTransport};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::{oneshot, RwLock};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
///
/// Logs go to stderr; stdout carries packets.
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Build the plugin manager with the calendar plugin registered
pub async fn build_plugin_manager(
    config: Arc<RwLock<Config>>,
    store: Arc<dyn CalendarStore>,
    transport: Arc<dyn PacketTransport>,
) -> PluginManager {
    let permissions = {
        let config_read = config.read().await;
        GrantedPermissions::new(config_read.granted_permissions.iter().copied())
    };

    let mut plugin_manager = PluginManager::new(config, transport);
    plugin_manager.register(CalendarPlugin::new(store, Arc::new(permissions)));
    plugin_manager
}

/// Start the service on stdin/stdout
pub async fn start_service(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let store_path = {
        let config_read = config.read().await;
        config_read.store_path.clone()
    };
    info!("Using calendar store {}", store_path);

    let store: Arc<dyn CalendarStore> = Arc::new(JsonFileStore::new(store_path));
    let transport: Arc<dyn PacketTransport> = Arc::new(LineTransport::stdout());

    let plugin_manager = Arc::new(build_plugin_manager(config, store, transport).await);
    plugin_manager.init_all().await?;
    info!(
        "Accepting packet types: {}",
        plugin_manager.supported_packet_types().join(", ")
    );

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    // Spawn signal handler task
    let shutdown_plugins = Arc::clone(&plugin_manager);
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_plugins).await;
    });

    let reader = BufReader::new(tokio::io::stdin());

    // Wait for either the input to end or a shutdown signal
    tokio::select! {
        result = serve_packets(Arc::clone(&plugin_manager), reader) => {
            info!("Packet input ended");
            plugin_manager.shutdown_all().await?;
            result.map_err(Into::into)
        }
        _ = shutdown_recv => {
            info!("Received shutdown signal, stopping service...");
            Ok(())
        }
    }
}

/// Feed every packet read from `reader` to the plugin manager until end of input
pub async fn serve_packets<R>(plugin_manager: Arc<PluginManager>, reader: R) -> PluginResult<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut packets = PacketReader::new(reader);

    loop {
        match packets.next_packet().await {
            Ok(Some(packet)) => {
                let packet_type = packet.packet_type().to_string();
                if !plugin_manager.on_packet_received(packet).await {
                    debug!("Packet {} was not handled", packet_type);
                }
            }
            Ok(None) => return Ok(()),
            Err(Error::Serialization(e)) => {
                warn!("Skipping unreadable packet: {}", e);
            }
            Err(e) => return Err(e),
        }
    }
}
