//! 单调计时器

/// 单调计时器接口
///
/// 返回任意固定频率的 tick 计数。绝对刻度不重要，同一次运行内保持
/// 一致即可；测量代码在操作前后各读一次取差值。
pub trait Monotonic {
    /// 读取当前 tick 计数
    fn now(&mut self) -> u64;
}

/// 手动推进的计时器
///
/// 每次读取前进固定 tick 数，测试用：一次操作（两次读取）的耗时
/// 恒等于 `step`。
pub struct ManualTimer {
    ticks: u64,
    step: u64,
}

impl ManualTimer {
    /// 创建计时器
    ///
    /// # 参数
    ///
    /// * `step` - 每次读取前进的 tick 数
    pub fn new(step: u64) -> Self {
        Self { ticks: 0, step }
    }
}

impl Monotonic for ManualTimer {
    fn now(&mut self) -> u64 {
        self.ticks += self.step;
        self.ticks
    }
}

/// 基于 `std::time::Instant` 的计时器（纳秒 tick）
#[cfg(feature = "std")]
pub struct StdTimer {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdTimer {
    /// 创建计时器，tick 频率为 1 GHz（纳秒）
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Monotonic for StdTimer {
    fn now(&mut self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
}
