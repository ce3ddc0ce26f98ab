//! 常量定义
//!
//! 这个模块包含连续分配与流式写入子系统的常量定义，包括：
//! - 扇区/簇几何相关常量
//! - 分配表表项标记（FAT32 约定）
//! - 确定性校验序列参数
//! - 吞吐量测量默认参数

//=============================================================================
// 基础常量
//=============================================================================

/// 默认物理扇区大小（512 字节）
pub const DEFAULT_SECTOR_SIZE: u32 = 512;

/// 默认每簇扇区数（8 x 512 = 4096 字节/簇）
pub const DEFAULT_SECTORS_PER_CLUSTER: u32 = 8;

/// 最小扇区大小（512 字节）
pub const MIN_SECTOR_SIZE: u32 = 512;

/// 最大扇区大小（4096 字节）
pub const MAX_SECTOR_SIZE: u32 = 4096;

//=============================================================================
// 分配表表项（FAT32 约定：32 位表项，低 28 位有效）
//=============================================================================

/// 表项有效位掩码
pub const ENTRY_MASK: u32 = 0x0FFF_FFFF;

/// 空闲簇标记
pub const ENTRY_FREE: u32 = 0;

/// 坏簇标记
pub const ENTRY_BAD: u32 = 0x0FFF_FFF7;

/// 链尾标记下界（大于等于此值的表项表示链结束）
pub const ENTRY_EOC_MIN: u32 = 0x0FFF_FFF8;

/// 写入链尾时使用的标准值
pub const ENTRY_EOC: u32 = 0x0FFF_FFFF;

/// 约定上的第一个数据簇编号（簇 0/1 保留）
pub const DEFAULT_FIRST_DATA_CLUSTER: u32 = 2;

//=============================================================================
// 确定性校验序列
//=============================================================================

/// CRC32 反射多项式（以太网多项式的反射形式）
pub const CRC32_REV_POLY: u32 = 0xEDB8_8320;

/// CRC32 累加器初始值（全 1）
pub const CRC32_INIT: u32 = !0u32;

/// 序列字宽（字节）
pub const SEQ_WORD_BYTES: usize = 4;

//=============================================================================
// 吞吐量测量默认参数
//=============================================================================

/// 默认单次传输块大小（32 个扇区，16 KiB）
pub const DEFAULT_CHUNK_BYTES: usize = 512 * 32;

/// 默认每批次操作数
pub const DEFAULT_RUNS_PER_BATCH: u32 = 512;

/// 默认批次数
pub const DEFAULT_ITERATIONS: u32 = 1;

/// 默认计时器频率（100 MHz 参考计时器）
pub const DEFAULT_TICKS_PER_SEC: u64 = 100_000_000;
