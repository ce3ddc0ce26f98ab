//! 块设备核心类型

use crate::error::{Error, ErrorKind, Result};

/// 块设备接口
///
/// 实现此 trait 以提供底层扇区访问。
///
/// # 示例
///
/// ```rust,ignore
/// use contig_core::{BlockDevice, Result};
///
/// struct MyDevice {
///     // ...
/// }
///
/// impl BlockDevice for MyDevice {
///     fn sector_size(&self) -> u32 {
///         512
///     }
///
///     fn total_sectors(&self) -> u64 {
///         1000000
///     }
///
///     fn read_sectors(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize> {
///         // 实现扇区读取
///         Ok(count as usize * self.sector_size() as usize)
///     }
///
///     fn write_sectors(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize> {
///         // 实现扇区写入
///         Ok(count as usize * self.sector_size() as usize)
///     }
/// }
/// ```
pub trait BlockDevice {
    /// 物理扇区大小（通常 512）
    fn sector_size(&self) -> u32;

    /// 总扇区数
    fn total_sectors(&self) -> u64;

    /// 读取扇区
    ///
    /// # 参数
    ///
    /// * `lba` - 起始扇区地址
    /// * `count` - 要读取的扇区数
    /// * `buf` - 目标缓冲区（大小至少为 count * sector_size）
    ///
    /// # 返回
    ///
    /// 成功返回实际读取的字节数
    fn read_sectors(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize>;

    /// 写入扇区
    ///
    /// # 参数
    ///
    /// * `lba` - 起始扇区地址
    /// * `count` - 要写入的扇区数
    /// * `buf` - 源缓冲区（大小至少为 count * sector_size）
    ///
    /// # 返回
    ///
    /// 成功返回实际写入的字节数
    fn write_sectors(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize>;

    /// 刷新缓存
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// 是否只读
    fn is_read_only(&self) -> bool {
        false
    }

    /// 打开设备
    ///
    /// 在开始使用设备前调用，用于初始化设备资源。
    /// 默认实现什么都不做，设备可以根据需要覆盖此方法。
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// 关闭设备
    ///
    /// 在停止使用设备后调用，用于清理设备资源。
    /// 默认实现什么都不做，设备可以根据需要覆盖此方法。
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// 块设备包装器
///
/// 为卷和流式写入器提供扇区级访问，包含分区偏移和操作统计。
///
/// # 并发使用
///
/// BlockDev 本身不包含内部锁，在单线程环境中直接使用。
/// 分配器、写入器和测量循环在操作期间通过 `&mut` 独占持有它，
/// 这正是本子系统的所有权模型：同一时刻只有一个方向的一个任务在驱动设备。
#[derive(Debug)]
pub struct BlockDev<D> {
    /// 底层设备
    device: D,
    /// 分区偏移（扇区）
    partition_offset: u64,
    /// 读操作次数
    read_count: u64,
    /// 写操作次数
    write_count: u64,
    /// 累计读取字节数
    bytes_read: u64,
    /// 累计写入字节数
    bytes_written: u64,
}

impl<D: BlockDevice> BlockDev<D> {
    /// 创建新的块设备包装器
    pub fn new(device: D) -> Result<Self> {
        let sector_size = device.sector_size();

        // 扇区大小必须是 2 的幂
        if sector_size == 0 || !sector_size.is_power_of_two() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Sector size must be a power of two",
            ));
        }

        Ok(Self {
            device,
            partition_offset: 0,
            read_count: 0,
            write_count: 0,
            bytes_read: 0,
            bytes_written: 0,
        })
    }

    /// 创建指定分区偏移的块设备包装器
    ///
    /// # 参数
    ///
    /// * `device` - 底层块设备
    /// * `offset` - 分区起始偏移（扇区）
    pub fn new_partition(device: D, offset: u64) -> Result<Self> {
        let mut bd = Self::new(device)?;
        bd.partition_offset = offset;
        Ok(bd)
    }

    /// 获取底层设备的引用
    pub fn device(&self) -> &D {
        &self.device
    }

    /// 获取底层设备的可变引用
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// 获取物理扇区大小
    pub fn sector_size(&self) -> u32 {
        self.device.sector_size()
    }

    /// 获取总扇区数
    pub fn total_sectors(&self) -> u64 {
        self.device.total_sectors()
    }

    /// 获取分区偏移（扇区）
    pub fn partition_offset(&self) -> u64 {
        self.partition_offset
    }

    /// 获取读操作次数
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    /// 获取写操作次数
    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    /// 获取累计读取字节数
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// 获取累计写入字节数
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// 设备是否只读
    pub fn is_read_only(&self) -> bool {
        self.device.is_read_only()
    }

    /// 打开底层设备
    pub fn open(&mut self) -> Result<()> {
        self.device.open()
    }

    /// 关闭底层设备
    ///
    /// 先刷新，再调用底层设备的 `close()`。
    pub fn close(&mut self) -> Result<()> {
        self.device.flush()?;
        self.device.close()
    }

    /// 刷新底层设备
    pub fn flush(&mut self) -> Result<()> {
        self.device.flush()
    }

    // 内部辅助方法

    /// 将卷内扇区地址转换为设备物理扇区地址
    pub(super) fn to_physical(&self, lba: u64) -> u64 {
        lba + self.partition_offset
    }

    /// 增加读计数
    pub(super) fn inc_read(&mut self, bytes: usize) {
        self.read_count += 1;
        self.bytes_read += bytes as u64;
    }

    /// 增加写计数
    pub(super) fn inc_write(&mut self, bytes: usize) {
        self.write_count += 1;
        self.bytes_written += bytes as u64;
    }
}
