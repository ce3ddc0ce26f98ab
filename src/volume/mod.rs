//! 卷
//!
//! 这个模块提供挂载后的存储卷：几何参数、块设备包装器和分配表区域。
//! 卷实现 [`AllocTable`]，是分配器看到的唯一表访问入口。
//!
//! 目录树、长文件名等完整文件系统语义不在本子系统范围内；文件以
//! [`FileHandle`] 的形式从外部"打开"操作到达（见 file.rs）。

mod file;

pub use file::{FileHandle, OpenFlags};

use crate::block::{BlockDev, BlockDevice};
use crate::consts::{DEFAULT_FIRST_DATA_CLUSTER, ENTRY_FREE, ENTRY_MASK};
use crate::error::{Error, ErrorKind, Result};
use crate::table::{AllocTable, TableEntry};
use alloc::vec;
use alloc::vec::Vec;
use byteorder::{ByteOrder, LittleEndian};

/// 每个表项占用的字节数（32 位表项）
const ENTRY_BYTES: u32 = 4;

/// 卷几何参数
///
/// 描述分配表区域和数据区域在卷内的布局。挂载时校验一次，
/// 之后视为不变量。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeGeometry {
    /// 每簇扇区数（2 的幂）
    pub sectors_per_cluster: u32,
    /// 分配表起始扇区
    pub table_start_sector: u64,
    /// 数据区域起始扇区
    pub data_start_sector: u64,
    /// 数据簇数量
    pub data_clusters: u32,
    /// 第一个数据簇编号（保留边界，约定值 2）
    pub first_data_cluster: u32,
}

impl VolumeGeometry {
    /// 创建使用约定保留边界的几何参数
    pub fn new(
        sectors_per_cluster: u32,
        table_start_sector: u64,
        data_start_sector: u64,
        data_clusters: u32,
    ) -> Self {
        Self {
            sectors_per_cluster,
            table_start_sector,
            data_start_sector,
            data_clusters,
            first_data_cluster: DEFAULT_FIRST_DATA_CLUSTER,
        }
    }

    /// 表项总数（保留表项 + 数据簇）
    pub fn entry_count(&self) -> u32 {
        self.first_data_cluster + self.data_clusters
    }

    /// 分配表区域占用的扇区数
    pub fn table_sectors(&self, sector_size: u32) -> u64 {
        let bytes = self.entry_count() as u64 * ENTRY_BYTES as u64;
        (bytes + sector_size as u64 - 1) / sector_size as u64
    }
}

/// 挂载后的卷
///
/// 持有块设备和几何参数，提供表项读写、空闲统计和文件截断。
/// `table_writes` 计数每一次表项落盘，快速路径"零表修改"的
/// 可观测性就来自它。
#[derive(Debug)]
pub struct Volume<D> {
    bdev: BlockDev<D>,
    geometry: VolumeGeometry,
    /// 表项写入次数
    table_writes: u64,
    /// 表项读写共用的扇区缓冲
    sector_buf: Vec<u8>,
}

impl<D: BlockDevice> Volume<D> {
    /// 挂载卷
    ///
    /// 校验几何参数与设备容量是否自洽。
    ///
    /// # 参数
    ///
    /// * `bdev` - 块设备包装器
    /// * `geometry` - 卷几何参数
    pub fn mount(bdev: BlockDev<D>, geometry: VolumeGeometry) -> Result<Self> {
        let sector_size = bdev.sector_size();

        if geometry.sectors_per_cluster == 0 || !geometry.sectors_per_cluster.is_power_of_two() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Sectors per cluster must be a power of two",
            ));
        }
        if geometry.data_clusters == 0 {
            return Err(Error::new(ErrorKind::InvalidInput, "Volume has no data clusters"));
        }
        if geometry.first_data_cluster == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "First data cluster must be non-zero",
            ));
        }

        // 表区域和数据区域不得重叠
        let table_end = geometry.table_start_sector + geometry.table_sectors(sector_size);
        if table_end > geometry.data_start_sector {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Table region overlaps data region",
            ));
        }

        // 数据区域必须落在设备内
        let data_end = geometry.data_start_sector
            + geometry.data_clusters as u64 * geometry.sectors_per_cluster as u64;
        if data_end > bdev.total_sectors() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Data region beyond end of device",
            ));
        }

        log::info!(
            "[VOLUME] mounted: {} data clusters, {} bytes/cluster",
            geometry.data_clusters,
            geometry.sectors_per_cluster * sector_size
        );

        Ok(Self {
            bdev,
            geometry,
            table_writes: 0,
            sector_buf: vec![0u8; sector_size as usize],
        })
    }

    /// 获取几何参数
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// 获取扇区大小
    pub fn sector_size(&self) -> u32 {
        self.bdev.sector_size()
    }

    /// 获取块设备包装器的引用
    pub fn bdev(&self) -> &BlockDev<D> {
        &self.bdev
    }

    /// 获取块设备包装器的可变引用
    ///
    /// 流式写入器直接在返回的设备上做扇区传输。
    pub fn bdev_mut(&mut self) -> &mut BlockDev<D> {
        &mut self.bdev
    }

    /// 获取表项写入次数
    pub fn table_writes(&self) -> u64 {
        self.table_writes
    }

    /// 统计空闲簇数量
    pub fn free_clusters(&mut self) -> Result<u32> {
        let mut free = 0u32;
        for cluster in self.geometry.first_data_cluster..self.geometry.entry_count() {
            let raw = self.get_entry(cluster)?;
            if raw & ENTRY_MASK == ENTRY_FREE {
                free += 1;
            }
        }
        Ok(free)
    }

    /// 截断文件为空（释放整条链）
    ///
    /// # 参数
    ///
    /// * `file` - 文件句柄，必须以写权限打开
    #[cfg(feature = "write")]
    pub fn truncate_file(&mut self, file: &mut FileHandle) -> Result<()> {
        if !file.is_writable() {
            return Err(Error::new(
                ErrorKind::PermissionDenied,
                "File not opened for writing",
            ));
        }

        if file.first_cluster() != 0 {
            crate::table::release_chain(self, file.first_cluster())?;
        }
        file.reset_chain();
        Ok(())
    }

    /// 表项所在的（卷内扇区地址, 扇区内偏移）
    fn entry_location(&self, cluster: u32) -> Result<(u64, usize)> {
        if cluster >= self.geometry.entry_count() {
            return Err(Error::new(ErrorKind::InvalidInput, "Cluster beyond table"));
        }
        let sector_size = self.bdev.sector_size() as u64;
        let byte = cluster as u64 * ENTRY_BYTES as u64;
        let sector = self.geometry.table_start_sector + byte / sector_size;
        let offset = (byte % sector_size) as usize;
        Ok((sector, offset))
    }
}

impl<D: BlockDevice> AllocTable for Volume<D> {
    fn entry_count(&self) -> u32 {
        self.geometry.entry_count()
    }

    fn first_data_cluster(&self) -> u32 {
        self.geometry.first_data_cluster
    }

    fn sectors_per_cluster(&self) -> u32 {
        self.geometry.sectors_per_cluster
    }

    fn bytes_per_cluster(&self) -> u32 {
        self.geometry.sectors_per_cluster * self.bdev.sector_size()
    }

    fn cluster_to_sector(&self, cluster: u32) -> Result<u64> {
        if cluster < self.geometry.first_data_cluster || cluster >= self.geometry.entry_count() {
            return Err(Error::new(ErrorKind::InvalidInput, "Invalid data cluster"));
        }
        let index = (cluster - self.geometry.first_data_cluster) as u64;
        Ok(self.geometry.data_start_sector + index * self.geometry.sectors_per_cluster as u64)
    }

    fn get_entry(&mut self, cluster: u32) -> Result<u32> {
        let (sector, offset) = self.entry_location(cluster)?;
        let mut buf = core::mem::take(&mut self.sector_buf);
        let res = self.bdev.read_sectors(sector, 1, &mut buf);
        let value = res.map(|_| LittleEndian::read_u32(&buf[offset..offset + 4]));
        self.sector_buf = buf;
        value
    }

    #[cfg(feature = "write")]
    fn set_entry(&mut self, cluster: u32, value: u32) -> Result<()> {
        let (sector, offset) = self.entry_location(cluster)?;

        // 读-改-写所在扇区，高 4 位保留（FAT32 约定）
        let mut buf = core::mem::take(&mut self.sector_buf);
        let res = self.write_entry_in_sector(sector, offset, value, &mut buf);
        self.sector_buf = buf;
        res?;

        self.table_writes += 1;
        Ok(())
    }
}

impl<D: BlockDevice> Volume<D> {
    #[cfg(feature = "write")]
    fn write_entry_in_sector(
        &mut self,
        sector: u64,
        offset: usize,
        value: u32,
        buf: &mut [u8],
    ) -> Result<()> {
        self.bdev.read_sectors(sector, 1, buf)?;
        let old = LittleEndian::read_u32(&buf[offset..offset + 4]);
        let new = (old & !ENTRY_MASK) | (value & ENTRY_MASK);
        LittleEndian::write_u32(&mut buf[offset..offset + 4], new);
        self.bdev.write_sectors(sector, 1, buf)?;
        Ok(())
    }

    /// 分类表项（便捷转发，等价于 `AllocTable::classify`）
    pub fn classify_entry(&self, raw: u32) -> TableEntry {
        AllocTable::classify(self, raw)
    }
}
