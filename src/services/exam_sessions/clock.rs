use chrono::{DateTime, Duration, Utc};

use crate::models::sessions::entities::ExamSession;

/// 会话计时
///
/// `expires_at` 只在开始作答时由服务器时钟确定，其余判断都以传入的服务器
/// 当前时刻为准，从不接受客户端声明的时间。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    started_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionClock {
    /// 以服务器当前时刻开始计时
    pub fn start(now: DateTime<Utc>, duration: Duration) -> Self {
        // 持久化精度为秒
        let started_at = DateTime::<Utc>::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        Self {
            started_at,
            expires_at: started_at + duration,
        }
    }

    pub fn for_session(session: &ExamSession) -> Self {
        Self {
            started_at: session.started_at,
            expires_at: session.expires_at,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// `expires_at - now`，到期后为负
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// 剩余秒数，最小为 0
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.remaining(now).num_seconds().max(0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now) <= Duration::zero()
    }

    /// 交卷时间：`min(now, expires_at)`
    pub fn effective_submitted_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.min(self.expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_expiry_fixed_at_start() {
        let clock = SessionClock::start(at(1_000), Duration::minutes(30));
        assert_eq!(clock.expires_at(), at(1_000 + 30 * 60));
        assert_eq!(clock.remaining_seconds(at(1_060)), 30 * 60 - 60);
    }

    #[test]
    fn test_expired_at_deadline() {
        let clock = SessionClock::start(at(0), Duration::minutes(1));
        assert!(!clock.is_expired(at(59)));
        assert!(clock.is_expired(at(60)));
        assert_eq!(clock.remaining_seconds(at(120)), 0);
    }

    #[test]
    fn test_submitted_at_never_exceeds_deadline() {
        let clock = SessionClock::start(at(0), Duration::minutes(1));
        assert_eq!(clock.effective_submitted_at(at(30)), at(30));
        assert_eq!(clock.effective_submitted_at(at(500)), at(60));
    }

    #[test]
    fn test_subsecond_start_truncated() {
        let now = at(10) + Duration::milliseconds(900);
        let clock = SessionClock::start(now, Duration::minutes(1));
        assert_eq!(clock.started_at(), at(10));
        assert_eq!(clock.expires_at(), at(70));
    }
}
