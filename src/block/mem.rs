//! 内存块设备
//!
//! 用一段内存模拟扇区设备，测试套件和示例在其上运行。
//! 支持注入写入故障，用于验证错误传播路径。

use super::device::BlockDevice;
use crate::error::{Error, ErrorKind, Result};
use alloc::vec;
use alloc::vec::Vec;

/// 内存块设备
///
/// 所有扇区初始为零。`fail_after_writes` 可以让第 N+1 次写入开始返回
/// I/O 错误，模拟设备中途失效。
#[derive(Debug)]
pub struct MemDevice {
    sector_size: u32,
    data: Vec<u8>,
    writes_until_fail: Option<u64>,
    read_only: bool,
}

impl MemDevice {
    /// 创建新的内存设备
    ///
    /// # 参数
    ///
    /// * `sector_size` - 扇区大小（字节）
    /// * `total_sectors` - 总扇区数
    pub fn new(sector_size: u32, total_sectors: u64) -> Self {
        Self {
            sector_size,
            data: vec![0u8; (sector_size as u64 * total_sectors) as usize],
            writes_until_fail: None,
            read_only: false,
        }
    }

    /// 注入写入故障：前 n 次写入成功，之后的写入全部失败
    pub fn fail_after_writes(&mut self, n: u64) {
        self.writes_until_fail = Some(n);
    }

    /// 设为只读设备
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// 获取底层存储的引用（测试用）
    pub fn raw(&self) -> &[u8] {
        &self.data
    }

    /// 获取底层存储的可变引用（测试用，可制造位翻转）
    pub fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn byte_range(&self, lba: u64, count: u32) -> Result<(usize, usize)> {
        let start = lba
            .checked_mul(self.sector_size as u64)
            .ok_or(Error::new(ErrorKind::InvalidInput, "Sector address overflow"))?;
        let len = count as u64 * self.sector_size as u64;
        let end = start + len;
        if end > self.data.len() as u64 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Sector range beyond end of device",
            ));
        }
        Ok((start as usize, end as usize))
    }
}

impl BlockDevice for MemDevice {
    fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn total_sectors(&self) -> u64 {
        self.data.len() as u64 / self.sector_size as u64
    }

    fn read_sectors(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize> {
        let (start, end) = self.byte_range(lba, count)?;
        let len = end - start;
        buf[..len].copy_from_slice(&self.data[start..end]);
        Ok(len)
    }

    fn write_sectors(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize> {
        if self.read_only {
            return Err(Error::new(ErrorKind::PermissionDenied, "Device is read-only"));
        }

        if let Some(remaining) = self.writes_until_fail {
            if remaining == 0 {
                return Err(Error::new(ErrorKind::Io, "Injected device write fault"));
            }
            self.writes_until_fail = Some(remaining - 1);
        }

        let (start, end) = self.byte_range(lba, count)?;
        let len = end - start;
        self.data[start..end].copy_from_slice(&buf[..len]);
        Ok(len)
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_device_geometry() {
        let dev = MemDevice::new(512, 128);
        assert_eq!(dev.sector_size(), 512);
        assert_eq!(dev.total_sectors(), 128);
    }

    #[test]
    fn test_mem_device_roundtrip() {
        let mut dev = MemDevice::new(512, 8);
        let data = [7u8; 512];
        dev.write_sectors(3, 1, &data).unwrap();

        let mut back = [0u8; 512];
        dev.read_sectors(3, 1, &mut back).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_mem_device_out_of_range() {
        let mut dev = MemDevice::new(512, 8);
        let mut buf = [0u8; 512];
        assert!(dev.read_sectors(8, 1, &mut buf).is_err());
    }

    #[test]
    fn test_read_only_rejects_write() {
        let mut dev = MemDevice::new(512, 8);
        dev.set_read_only(true);
        let err = dev.write_sectors(0, 1, &[0u8; 512]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }
}
