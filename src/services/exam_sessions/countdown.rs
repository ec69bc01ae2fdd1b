//! 客户端倒计时
//!
//! 仅用于展示：本地每秒递减，定期以服务器返回的剩余时间校准，归零时只
//! 发起一次交卷请求，是否按时由服务器判定。

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

/// 一次计时的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Running { remaining: i64, resync_due: bool },
    Expired,
    Finished,
}

/// 倒计时状态机
#[derive(Debug, Clone)]
pub struct AdvisoryCountdown {
    remaining: i64,
    resync_every: u32,
    ticks_since_resync: u32,
    expired: bool,
}

impl AdvisoryCountdown {
    pub fn new(server_remaining: i64, resync_every: u32) -> Self {
        Self {
            remaining: server_remaining.max(0),
            resync_every: resync_every.max(1),
            ticks_since_resync: 0,
            expired: false,
        }
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    /// 前进一秒；归零时只返回一次 `Expired`
    pub fn tick(&mut self) -> CountdownTick {
        if self.expired {
            return CountdownTick::Finished;
        }
        self.remaining = (self.remaining - 1).max(0);
        if self.remaining == 0 {
            self.expired = true;
            return CountdownTick::Expired;
        }
        self.ticks_since_resync += 1;
        CountdownTick::Running {
            remaining: self.remaining,
            resync_due: self.ticks_since_resync >= self.resync_every,
        }
    }

    /// 以服务器剩余秒数校准
    pub fn resync(&mut self, server_remaining: i64) {
        self.remaining = server_remaining.max(0);
        self.ticks_since_resync = 0;
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }
}

/// 倒计时任务句柄；`cancel()` 或 drop 时停止计时
#[derive(Debug)]
pub struct CountdownHandle {
    task: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// 启动倒计时
///
/// 每 `resync_every` 秒调用一次 `resync` 获取服务器剩余秒数（返回 `None`
/// 时沿用本地值）；服务器报告为 0 或本地归零时调用一次 `on_expire` 后结束。
pub fn spawn_countdown<R, RF, E, EF>(
    server_remaining: i64,
    resync_every: u32,
    mut resync: R,
    on_expire: E,
) -> CountdownHandle
where
    R: FnMut() -> RF + Send + 'static,
    RF: Future<Output = Option<i64>> + Send,
    E: FnOnce() -> EF + Send + 'static,
    EF: Future<Output = ()> + Send,
{
    let task = tokio::spawn(async move {
        let mut countdown = AdvisoryCountdown::new(server_remaining, resync_every);
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 首次 tick 立即完成
        ticker.tick().await;

        if countdown.remaining() == 0 {
            on_expire().await;
            return;
        }

        loop {
            ticker.tick().await;
            match countdown.tick() {
                CountdownTick::Running {
                    resync_due: true, ..
                } => {
                    if let Some(server_remaining) = resync().await {
                        debug!("Countdown resynced to {}s", server_remaining);
                        countdown.resync(server_remaining);
                        if countdown.remaining() == 0 {
                            break;
                        }
                    }
                }
                CountdownTick::Running { .. } => {}
                CountdownTick::Expired | CountdownTick::Finished => break,
            }
        }
        on_expire().await;
    });

    CountdownHandle { task }
}
