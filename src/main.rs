use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chain::{ChainConfig, EmissionSchedule};
use clap::Parser;
use containers::{Block, BlockId, ResponseEntity};
use networking::sync::{
    BlockApplier, HeadersRepository, NodeContext, PeerManager, PendingEventQueue, RoundService,
    SyncService, run_sync_loop,
};
use networking::transport::ChannelTransport;
use networking::types::{OutboundSyncMessage, P2pRequestSource};
use parking_lot::Mutex;
use store::{BlockMemoryStore, BlockRepository, InMemoryBlockRepository, warm_up};
use tokio::sync::{mpsc, oneshot};
use tokio::task;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
struct Args {
    /// YAML chain config. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short, long)]
    address: Option<String>,
}

/// Applies blocks that extend the persisted chain by exactly one height.
struct LocalChainApplier {
    repository: Arc<InMemoryBlockRepository>,
}

#[async_trait]
impl BlockApplier for LocalChainApplier {
    async fn receive_block(&self, block: &Block) -> ResponseEntity<()> {
        let count = match self.repository.get_count().await {
            Ok(count) => count as u64,
            Err(err) => return ResponseEntity::failure([err.to_string()]),
        };

        if block.height != count + 1 {
            return ResponseEntity::failure([format!(
                "block {} at height {} does not extend local height {}",
                block.id, block.height, count
            )]);
        }

        self.repository.save(block.clone());
        ResponseEntity::ok(())
    }

    async fn undo_block(&self, block: &Block) -> ResponseEntity<()> {
        self.repository.truncate(block.height);
        ResponseEntity::ok(())
    }
}

struct LoggingRounds;

impl RoundService for LoggingRounds {
    fn restore_to_slot(&self, slot: u64) {
        debug!(slot = slot, "Restored forging round");
    }
}

fn genesis_block() -> Block {
    Block {
        id: BlockId::repeat_byte(1),
        height: 1,
        ..Default::default()
    }
}

/// Stand-in for the peer network: requests fail, notifications are logged.
async fn run_network(mut source: impl P2pRequestSource<OutboundSyncMessage>) {
    while let Some(message) = source.recv().await {
        debug!(message = %message, "Outbound sync message");
        match message {
            OutboundSyncMessage::RequestCommonBlocks { reply, .. } => {
                let _ = reply.send(ResponseEntity::failure(["no peer connection"]));
            }
            OutboundSyncMessage::RequestBlocks { reply, .. } => {
                let _ = reply.send(ResponseEntity::failure(["no peer connection"]));
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ChainConfig::load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ChainConfig::default(),
    };
    if let Some(port) = args.port {
        config.socket_port = port;
    }
    if let Some(address) = args.address {
        config.public_host = address;
    }
    let config = Arc::new(config);

    let repository = Arc::new(InMemoryBlockRepository::new());
    if repository.get_count().await? == 0 {
        repository.save(genesis_block());
    }

    let blocks = Arc::new(BlockMemoryStore::new(
        config.memory_blocks_limit,
        repository.clone(),
    ));
    let loaded = warm_up(&blocks, repository.as_ref(), config.warm_up_page_limit).await?;

    let events = Arc::new(PendingEventQueue::new());
    let headers = Arc::new(HeadersRepository::new(&config, events));
    let last_block = blocks.get_last().ok();
    headers.set_broadhash(last_block.as_ref());
    headers.set_height(last_block.as_ref());
    if let Some(block) = &last_block {
        headers.add_block_id_in_pool(block);
    }

    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<OutboundSyncMessage>();

    let ctx = NodeContext {
        emission: Arc::new(EmissionSchedule::new(&config.emission)),
        headers,
        blocks,
        peers: Arc::new(Mutex::new(PeerManager::new())),
        transport: Arc::new(ChannelTransport::new(outbound_sender)),
        applier: Arc::new(LocalChainApplier {
            repository: repository.clone(),
        }),
        rounds: Arc::new(LoggingRounds),
        config: config.clone(),
    };

    info!(
        loaded = loaded,
        height = ctx.headers.height(),
        port = config.socket_port,
        "Sync node started"
    );

    let service = Arc::new(SyncService::new(ctx));
    let (shutdown_sender, shutdown_receiver) = oneshot::channel();

    let network_handle = task::spawn(run_network(outbound_receiver));
    let sync_handle = task::spawn(run_sync_loop(
        service.clone(),
        Duration::from_secs(config.sync_tick_interval_secs.max(1)),
        shutdown_receiver,
    ));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
        _ = network_handle => {
            warn!("Network task finished");
        }
    }

    let _ = shutdown_sender.send(());
    sync_handle.await?;

    info!(stats = ?service.get_stats(), "Sync node stopped");
    Ok(())
}
