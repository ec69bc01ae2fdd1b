//! 过期会话扫描
//!
//! 定期强制提交已过截止时间仍为 Active 的会话，保证没有会话会在截止后无限期
//! 保持进行中。强制提交使用已保存的答案。

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::services::evaluations::ResponseEvaluator;
use crate::services::exam_sessions::SessionLifecycle;
use crate::services::exam_sessions::submit::spawn_pending_evaluation;

// 单次扫描最多处理的会话数
const SWEEP_BATCH: u64 = 100;

pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    /// 启动扫描任务；`evaluator` 不为空时对新提交的会话触发后台评阅
    pub fn spawn(
        lifecycle: SessionLifecycle,
        evaluator: Option<ResponseEvaluator>,
        interval: Duration,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }

                match lifecycle
                    .sweep_expired(chrono::Utc::now(), SWEEP_BATCH)
                    .await
                {
                    Ok(submitted) if submitted.is_empty() => {
                        debug!("Expiry sweep: no expired sessions");
                    }
                    Ok(submitted) => {
                        info!("Expiry sweep auto-submitted {} session(s)", submitted.len());
                        if let Some(evaluator) = &evaluator {
                            for session_id in submitted {
                                spawn_pending_evaluation(evaluator.clone(), session_id);
                            }
                        }
                    }
                    Err(e) => warn!("Expiry sweep failed: {}", e),
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// 通知任务退出并等待当前一轮扫描结束
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!("Expiry sweeper task ended abnormally: {}", e);
        }
    }
}
