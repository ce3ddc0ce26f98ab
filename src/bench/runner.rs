//! 测量循环入口

use super::stats::{rate_kib_per_sec, ThroughputStats, TimingSample};
use super::timer::Monotonic;
use crate::block::BlockDevice;
use crate::consts::{
    DEFAULT_CHUNK_BYTES, DEFAULT_ITERATIONS, DEFAULT_RUNS_PER_BATCH, DEFAULT_TICKS_PER_SEC,
};
use crate::contig::allocate_contiguous;
use crate::error::{Error, ErrorKind, Result};
use crate::seq::SequenceCursor;
use crate::stream::{stream_write, SequenceSource};
use crate::volume::{FileHandle, Volume};
use alloc::vec;
use alloc::vec::Vec;
use log::*;

/// 测量配置
///
/// 总传输量为 `iterations * runs * chunk_bytes`，必须是整簇——
/// 这样分配的区段不带取整尾巴，写入、文件大小和回读三者逐字节对齐。
#[derive(Debug, Clone, Copy)]
pub struct BenchConfig {
    /// 批次数
    pub iterations: u32,
    /// 每批次操作数（也是计时样本序列的容量）
    pub runs: u32,
    /// 单次操作传输的字节数（整扇区）
    pub chunk_bytes: usize,
    /// 计时器频率（tick/秒）
    pub ticks_per_sec: u64,
    /// 是否逐操作输出明细（默认关，避免输出路径干扰计时）
    pub verbose: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            runs: DEFAULT_RUNS_PER_BATCH,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            ticks_per_sec: DEFAULT_TICKS_PER_SEC,
            verbose: false,
        }
    }
}

impl BenchConfig {
    /// 总传输字节数
    pub fn total_bytes(&self) -> u64 {
        self.iterations as u64 * self.runs as u64 * self.chunk_bytes as u64
    }

    /// 校验配置与卷几何的一致性
    fn validate<D: BlockDevice>(&self, vol: &Volume<D>) -> Result<u32> {
        if self.iterations == 0 || self.runs == 0 {
            return Err(Error::new(ErrorKind::InvalidInput, "Batch counts must be non-zero"));
        }
        let sector_size = vol.sector_size() as usize;
        if self.chunk_bytes == 0 || self.chunk_bytes % sector_size != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Chunk must be a whole number of sectors",
            ));
        }
        let cluster_bytes = vol.geometry().sectors_per_cluster as u64 * sector_size as u64;
        if self.total_bytes() % cluster_bytes != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Total transfer must be a whole number of clusters",
            ));
        }
        Ok((self.chunk_bytes / sector_size) as u32)
    }
}

/// 一次测量运行的汇总结果
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    /// 实际传输的总字节数
    pub bytes: u64,
    /// 操作总数
    pub runs: u32,
    /// 最小吞吐率（KiB/s）
    pub min_kib_s: u64,
    /// 最大吞吐率（KiB/s）
    pub max_kib_s: u64,
    /// 平均吞吐率（KiB/s）
    pub avg_kib_s: u64,
}

/// 批内统计：尺寸核对在计时循环之外做，任何不符都立刻致命
fn close_batch(
    samples: &[TimingSample],
    cfg: &BenchConfig,
    overall: &mut ThroughputStats,
    direction: &str,
    batch: u32,
) -> Result<()> {
    let mut stats = ThroughputStats::new();

    for (i, sample) in samples.iter().enumerate() {
        // 完成的操作字节数必须恰好等于请求的传输量；不等说明有一层
        // 静默丢了数据，与设备错误同级致命
        if sample.bytes != cfg.chunk_bytes as u64 {
            error!(
                "[BENCH] {} run {}: {} bytes transferred, expected {}",
                direction, i, sample.bytes, cfg.chunk_bytes
            );
            return Err(Error::new(
                ErrorKind::SizeMismatch,
                "Transfer size does not match request",
            ));
        }
        let rate = rate_kib_per_sec(sample.bytes, sample.ticks, cfg.ticks_per_sec);
        stats.record(rate);
        overall.record(rate);
    }

    info!(
        "[BENCH] {} batch {}/{}: {} runs x {} bytes: min {} max {} avg {} KiB/s",
        direction,
        batch,
        cfg.iterations,
        samples.len(),
        cfg.chunk_bytes,
        stats.min(),
        stats.max(),
        stats.avg()
    );

    if cfg.verbose {
        for (i, sample) in samples.iter().enumerate() {
            debug!(
                "[BENCH] {} run {}: {} bytes in {} ticks ({} KiB/s)",
                direction,
                i,
                sample.bytes,
                sample.ticks,
                rate_kib_per_sec(sample.bytes, sample.ticks, cfg.ticks_per_sec)
            );
        }
    }

    Ok(())
}

fn report(overall: &ThroughputStats, bytes: u64) -> RunReport {
    RunReport {
        bytes,
        runs: overall.count(),
        min_kib_s: overall.min(),
        max_kib_s: overall.max(),
        avg_kib_s: overall.avg(),
    }
}

/// 分配并流式写入：一个方向的完整测量运行
///
/// 先为总传输量分配一段连续区段（整个运行只分配一次），然后把区段
/// 切成 chunk 大小的片逐次计时写入，数据来自确定性序列生产者。
/// 成功返回后文件的逻辑大小已更新为实际写入的字节数。
///
/// # 参数
///
/// * `vol` - 卷
/// * `file` - 文件句柄
/// * `cfg` - 测量配置
/// * `timer` - 单调计时器
pub fn run_stream_write<D: BlockDevice, M: Monotonic>(
    vol: &mut Volume<D>,
    file: &mut FileHandle,
    cfg: &BenchConfig,
    timer: &mut M,
) -> Result<RunReport> {
    let chunk_sectors = cfg.validate(vol)?;
    let total = cfg.total_bytes();

    let extent = allocate_contiguous(vol, file, total)?;
    info!(
        "[BENCH] write: {} bytes into sectors {}..{}",
        total,
        extent.first_sector,
        extent.first_sector + extent.sector_count()
    );

    let mut source = SequenceSource::new();
    let mut samples: Vec<TimingSample> = Vec::with_capacity(cfg.runs as usize);
    let mut overall = ThroughputStats::new();
    let mut written = 0u64;
    let mut sector_offset = 0u64;

    for batch in 1..=cfg.iterations {
        samples.clear();
        for _ in 0..cfg.runs {
            let sub = extent
                .slice(sector_offset, chunk_sectors as u64)
                .ok_or(Error::new(ErrorKind::InvalidState, "Extent exhausted"))?;

            let t0 = timer.now();
            let bytes = stream_write(vol.bdev_mut(), &sub, &mut source, chunk_sectors)?;
            let ticks = timer.now() - t0;

            samples.push(TimingSample { bytes, ticks });
            written += bytes;
            sector_offset += chunk_sectors as u64;
        }
        close_batch(&samples, cfg, &mut overall, "write", batch)?;
    }

    // 写入器不碰元数据，完成后在这里把逻辑大小改成实际写入量
    file.set_size(written);

    Ok(report(&overall, written))
}

/// 回读并校验：另一个方向的完整测量运行
///
/// 通过分配器的快速路径确认文件的连续区段（零表修改，只读句柄
/// 可用），然后逐 chunk 计时读回，并用独立复位的游标重放序列逐字
/// 比对。第一处不一致即致命：报告文件内字节偏移和两个值，立刻停止。
///
/// # 参数
///
/// * `vol` - 卷
/// * `file` - 文件句柄
/// * `cfg` - 测量配置
/// * `timer` - 单调计时器
pub fn run_read_verify<D: BlockDevice, M: Monotonic>(
    vol: &mut Volume<D>,
    file: &mut FileHandle,
    cfg: &BenchConfig,
    timer: &mut M,
) -> Result<RunReport> {
    let chunk_sectors = cfg.validate(vol)?;
    let total = cfg.total_bytes();

    if file.size() != total {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "File size does not match configured transfer",
        ));
    }

    // 快速路径确认：不连续或链损坏在这里就失败
    let extent = allocate_contiguous(vol, file, total)?;
    info!(
        "[BENCH] read: {} bytes from sectors {}..{}",
        total,
        extent.first_sector,
        extent.first_sector + extent.sector_count()
    );

    let mut cursor = SequenceCursor::new();
    let mut buf = vec![0u8; cfg.chunk_bytes];
    let mut samples: Vec<TimingSample> = Vec::with_capacity(cfg.runs as usize);
    let mut overall = ThroughputStats::new();
    let mut read_back = 0u64;
    let mut lba = extent.first_sector;

    for batch in 1..=cfg.iterations {
        samples.clear();
        for _ in 0..cfg.runs {
            buf.fill(0);

            let t0 = timer.now();
            let bytes = vol.bdev_mut().read_sectors(lba, chunk_sectors, &mut buf)? as u64;
            let ticks = timer.now() - t0;

            // 校验在计时区间之外做
            if let Some(mismatch) = cursor.verify(&buf)? {
                let offset = read_back + mismatch.offset as u64;
                error!(
                    "[BENCH] integrity error at file offset {:#x}: expected {:#010x}, got {:#010x}",
                    offset, mismatch.expected, mismatch.actual
                );
                return Err(Error::new(
                    ErrorKind::IntegrityMismatch,
                    "Read-back does not match deterministic sequence",
                ));
            }

            samples.push(TimingSample { bytes, ticks });
            read_back += bytes;
            lba += chunk_sectors as u64;
        }
        close_batch(&samples, cfg, &mut overall, "read", batch)?;
    }

    Ok(report(&overall, read_back))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::ManualTimer;
    use crate::block::{BlockDev, MemDevice};
    use crate::volume::{OpenFlags, VolumeGeometry};

    /// 4 KiB 簇的测试卷，容量按需
    fn volume(clusters: u32) -> Volume<MemDevice> {
        let table_sectors = (((2 + clusters) * 4) as u64 + 511) / 512;
        let total_sectors = table_sectors + clusters as u64 * 8;
        let dev = MemDevice::new(512, total_sectors);
        let bdev = BlockDev::new(dev).unwrap();
        Volume::mount(bdev, VolumeGeometry::new(8, 0, table_sectors, clusters)).unwrap()
    }

    fn small_cfg() -> BenchConfig {
        BenchConfig {
            iterations: 2,
            runs: 4,
            chunk_bytes: 4096,
            ticks_per_sec: 100_000_000,
            verbose: false,
        }
    }

    #[test]
    fn test_default_config() {
        let cfg = BenchConfig::default();
        assert!(!cfg.verbose);
        assert_eq!(cfg.chunk_bytes, 512 * 32);
    }

    #[cfg(feature = "write")]
    #[test]
    fn test_write_then_read_roundtrip() {
        let mut vol = volume(64);
        let mut file = FileHandle::new(OpenFlags::READ | OpenFlags::WRITE);
        let cfg = small_cfg();
        let mut timer = ManualTimer::new(1000);

        let wr = run_stream_write(&mut vol, &mut file, &cfg, &mut timer).unwrap();
        assert_eq!(wr.bytes, cfg.total_bytes());
        assert_eq!(wr.runs, 8);
        // 固定步长计时器下各次速率一致
        assert_eq!(wr.min_kib_s, wr.max_kib_s);
        assert_eq!(file.size(), cfg.total_bytes());

        let rd = run_read_verify(&mut vol, &mut file, &cfg, &mut timer).unwrap();
        assert_eq!(rd.bytes, cfg.total_bytes());
        assert_eq!(rd.runs, 8);
    }

    #[cfg(feature = "write")]
    #[test]
    fn test_read_only_handle_verifies() {
        let mut vol = volume(64);
        let mut writer = FileHandle::new(OpenFlags::READ | OpenFlags::WRITE);
        let cfg = small_cfg();
        let mut timer = ManualTimer::new(1000);

        run_stream_write(&mut vol, &mut writer, &cfg, &mut timer).unwrap();

        let mut reader = FileHandle::from_chain(
            writer.first_cluster(),
            writer.size(),
            OpenFlags::READ,
        );
        let writes = vol.table_writes();
        run_read_verify(&mut vol, &mut reader, &cfg, &mut timer).unwrap();
        // 回读路径零表修改
        assert_eq!(vol.table_writes(), writes);
    }

    #[cfg(feature = "write")]
    #[test]
    fn test_corruption_is_fatal() {
        let mut vol = volume(64);
        let mut file = FileHandle::new(OpenFlags::READ | OpenFlags::WRITE);
        let cfg = small_cfg();
        let mut timer = ManualTimer::new(1000);

        run_stream_write(&mut vol, &mut file, &cfg, &mut timer).unwrap();

        // 在数据区中段翻转一位
        let data_start = vol.geometry().data_start_sector as usize * 512;
        vol.bdev_mut().device_mut().raw_mut()[data_start + 10000] ^= 0x01;

        let err = run_read_verify(&mut vol, &mut file, &cfg, &mut timer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntegrityMismatch);
    }

    #[cfg(feature = "write")]
    #[test]
    fn test_read_rejects_size_drift() {
        let mut vol = volume(64);
        let mut file = FileHandle::new(OpenFlags::READ | OpenFlags::WRITE);
        let cfg = small_cfg();
        let mut timer = ManualTimer::new(1000);

        run_stream_write(&mut vol, &mut file, &cfg, &mut timer).unwrap();
        file.set_size(cfg.total_bytes() - 1);

        let err = run_read_verify(&mut vol, &mut file, &cfg, &mut timer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_config_validation() {
        let mut vol = volume(16);
        let mut file = FileHandle::new(OpenFlags::READ | OpenFlags::WRITE);
        let mut timer = ManualTimer::new(1000);

        // chunk 不是整扇区
        let cfg = BenchConfig {
            chunk_bytes: 1000,
            ..small_cfg()
        };
        let err = run_stream_write(&mut vol, &mut file, &cfg, &mut timer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        // 总量不是整簇
        let cfg = BenchConfig {
            iterations: 1,
            runs: 1,
            chunk_bytes: 512,
            ..small_cfg()
        };
        let err = run_stream_write(&mut vol, &mut file, &cfg, &mut timer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    /// 完整场景：16 MiB 写入后回读，零不一致，双向字节数精确
    #[cfg(feature = "write")]
    #[test]
    fn test_sixteen_mib_write_read() {
        let mut vol = volume(4200);
        let mut file = FileHandle::new(OpenFlags::READ | OpenFlags::WRITE);
        let cfg = BenchConfig {
            iterations: 32,
            runs: 32,
            chunk_bytes: 512 * 32,
            ticks_per_sec: 100_000_000,
            verbose: false,
        };
        assert_eq!(cfg.total_bytes(), 16 * 1024 * 1024);
        let mut timer = ManualTimer::new(1000);

        let wr = run_stream_write(&mut vol, &mut file, &cfg, &mut timer).unwrap();
        assert_eq!(wr.bytes, 16 * 1024 * 1024);

        let rd = run_read_verify(&mut vol, &mut file, &cfg, &mut timer).unwrap();
        assert_eq!(rd.bytes, 16 * 1024 * 1024);
    }
}
