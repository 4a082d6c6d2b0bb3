//! 不活跃参与者清理任务
//!
//! 固定周期扫描 `last_seen` 过期的参与者：先为每人落一条离场
//! 状态消息，再删除参与者记录。两步写入不原子，消息先行，
//! 崩溃最多留下孤儿离场消息，绝不会无声删人。
//!
//! 单次 tick 出错只记日志并放弃，下一个 tick 会重新评估同样的
//! 过期条件，清理天然自愈，不需要重试队列。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{error, info};

use domain::{display_time, MessageRepository, NewMessage, ParticipantRepository};

use crate::{clock::Clock, error::ApplicationError};

/// 离场状态消息正文。
pub const LEAVE_TEXT: &str = "sai da sala...";

/// 清理任务配置。阈值是参数而非常量，测试可以缩短。
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// 扫描周期
    pub interval: Duration,
    /// 不活跃阈值
    pub threshold: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            threshold: Duration::from_secs(10),
        }
    }
}

#[derive(Clone)]
pub struct SweeperDependencies {
    pub participants: Arc<dyn ParticipantRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 周期性清理任务，生命周期跟随进程。
///
/// `start`/`stop` 控制后台循环；`tick` 单独公开，测试配合
/// `ManualClock` 可以确定性地单步执行。
#[derive(Clone)]
pub struct PresenceSweeper {
    deps: SweeperDependencies,
    config: SweeperConfig,
    is_running: Arc<RwLock<bool>>,
}

impl PresenceSweeper {
    pub fn new(deps: SweeperDependencies, config: SweeperConfig) -> Self {
        Self {
            deps,
            config,
            is_running: Arc::new(RwLock::new(false)),
        }
    }

    /// 启动后台循环；重复调用是空操作。
    pub async fn start(&self) {
        {
            let mut running = self.is_running.write().await;
            if *running {
                return;
            }
            *running = true;
        }

        let sweeper = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweeper.config.interval);
            loop {
                interval.tick().await;
                if !*sweeper.is_running.read().await {
                    break;
                }
                if let Err(err) = sweeper.tick().await {
                    error!(error = %err, "清理 tick 失败，放弃本轮等待下一轮");
                }
            }
        });
    }

    /// 停止后台循环，进行中的 tick 允许部分生效。
    pub async fn stop(&self) {
        let mut running = self.is_running.write().await;
        *running = false;
    }

    /// 执行一轮清理，返回被移除的参与者数量。
    ///
    /// 没有过期参与者时不产生任何写入。查出批次和删除之间的
    /// 心跳会让删除少删，多出来的离场消息按孤儿处理。
    pub async fn tick(&self) -> Result<usize, ApplicationError> {
        let now = self.deps.clock.now();
        let cutoff = now - self.config.threshold;

        let stale = self.deps.participants.find_stale(cutoff).await?;
        if stale.is_empty() {
            return Ok(0);
        }

        let time = display_time(now);
        let departures: Vec<NewMessage> = stale
            .iter()
            .map(|participant| {
                NewMessage::status(participant.name.clone(), LEAVE_TEXT, time.clone())
            })
            .collect();

        // 离场消息必须先于删除落库
        self.deps.messages.insert_many(departures).await?;
        let removed = self.deps.participants.delete_stale(cutoff).await?;

        info!(removed, "移除不活跃参与者");
        Ok(removed as usize)
    }
}
