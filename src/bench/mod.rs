//! 吞吐量与完整性测量
//!
//! 这个模块把下层组件编排成完整的测量循环：一次分配、多批次计时
//! 传输、批内最小/最大/平均吞吐统计，以及回读路径上对确定性序列的
//! 逐字校验。
//!
//! - bench/timer.rs 提供单调计时器接口
//! - bench/stats.rs 提供计时样本和吞吐统计
//! - bench/runner.rs 提供每个方向一个的入口函数

mod runner;
mod stats;
mod timer;

pub use runner::{run_read_verify, run_stream_write, BenchConfig, RunReport};
pub use stats::{rate_kib_per_sec, ThroughputStats, TimingSample};
pub use timer::{ManualTimer, Monotonic};

#[cfg(feature = "std")]
pub use timer::StdTimer;
