use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// 操作节奏控制
///
/// 在界面操作之间插入随机停顿，只影响节奏，不影响流程正确性。
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    enabled: bool,
}

impl Pacer {
    /// 模拟人工操作的随机停顿
    pub fn human() -> Self {
        Self { enabled: true }
    }

    /// 不停顿（测试和调试用）
    pub fn instant() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 随机停顿 `min_ms..=max_ms` 毫秒
    pub async fn pause(&self, min_ms: u64, max_ms: u64) {
        if !self.enabled {
            return;
        }
        let ms = if min_ms >= max_ms {
            min_ms
        } else {
            OsRng.gen_range(min_ms..=max_ms)
        };
        sleep(Duration::from_millis(ms)).await;
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::human()
    }
}
