//! contig_core: 连续分配与流式写入子系统
//!
//! 这是一个面向块结构存储卷的高吞吐顺序写入子系统，提供：
//! - **连续区段分配**：绕开常规链式分配，为文件一次圈出整段连续簇
//! - **流式扇区写入**：生产者数据直接按扇区升序下盘，无逐块簿记
//! - **确定性校验序列**：CRC32 迭代生成可重放的测试数据流，回读
//!   校验不需要保存期望值
//! - **吞吐量测量**：分批计时，最小/最大/平均统计
//!
//! # 示例
//!
//! ```rust,ignore
//! use contig_core::{
//!     bench::{run_read_verify, run_stream_write, BenchConfig, ManualTimer},
//!     BlockDev, FileHandle, MemDevice, OpenFlags, Result, Volume, VolumeGeometry,
//! };
//!
//! fn main() -> Result<()> {
//!     let dev = MemDevice::new(512, 34_048);
//!     let bdev = BlockDev::new(dev)?;
//!     let mut vol = Volume::mount(bdev, VolumeGeometry::new(8, 0, 34, 4096))?;
//!
//!     let mut file = FileHandle::new(OpenFlags::READ | OpenFlags::WRITE);
//!     let cfg = BenchConfig::default();
//!     let mut timer = ManualTimer::new(1000);
//!
//!     // 分配 + 流式写入，然后回读校验
//!     let wr = run_stream_write(&mut vol, &mut file, &cfg, &mut timer)?;
//!     let rd = run_read_verify(&mut vol, &mut file, &cfg, &mut timer)?;
//!     assert_eq!(wr.bytes, rd.bytes);
//!     Ok(())
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`block`] - 块设备抽象和扇区 I/O
//! - [`consts`] - 常量定义
//! - [`table`] - 分配表能力接口和链操作
//! - [`volume`] - 卷、几何参数和文件句柄
//! - [`contig`] - 连续区段分配器
//! - [`seq`] - 确定性校验序列
//! - [`stream`] - 流式扇区写入
//! - [`bench`] - 吞吐量与完整性测量

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 块设备抽象
pub mod block;

/// 常量定义
pub mod consts;

/// 分配表抽象
pub mod table;

/// 卷和文件句柄
pub mod volume;

/// 连续区段分配
pub mod contig;

/// 确定性校验序列
pub mod seq;

/// 流式扇区写入
pub mod stream;

/// 吞吐量与完整性测量
pub mod bench;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 块设备
pub use block::{BlockDev, BlockDevice, MemDevice};

// 分配表
pub use table::{AllocTable, TableEntry};

// 卷
pub use volume::{FileHandle, OpenFlags, Volume, VolumeGeometry};

// 连续区段
pub use contig::{allocate_contiguous, Extent};

// 校验序列
pub use seq::{Mismatch, SequenceCursor};

// 流式写入
pub use stream::{stream_write, ChunkSource, SequenceSource};

// 测量
pub use bench::{
    run_read_verify, run_stream_write, BenchConfig, ManualTimer, Monotonic, RunReport,
    ThroughputStats, TimingSample,
};
