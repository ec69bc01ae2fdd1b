use tokio::signal;
use tracing::{error, warn};

use crate::runtime::expiry_sweeper::ExpirySweeper;

pub async fn listen_for_shutdown() {
    // 等待 Ctrl+C 信号
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    warn!("Shutdown signal received, initiating graceful shutdown...");
}

/// 停止后台任务
pub async fn stop_background_tasks(sweeper: Option<ExpirySweeper>) {
    if let Some(sweeper) = sweeper {
        sweeper.shutdown().await;
        warn!("Expiry sweeper stopped");
    }
}
