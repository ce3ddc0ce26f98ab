//! 扇区 I/O 操作实现

use super::{BlockDev, BlockDevice};
use crate::error::{Error, ErrorKind, Result};

impl<D: BlockDevice> BlockDev<D> {
    /// 读取连续扇区
    ///
    /// 从指定扇区地址读取 `count` 个扇区到缓冲区。
    /// 设备报告的字节数与请求不符时（短传输）在这一层提升为 I/O 错误，
    /// 调用者拿到 `Ok` 即代表全量读取完成。
    ///
    /// # 参数
    ///
    /// * `lba` - 起始扇区地址（卷内）
    /// * `count` - 要读取的扇区数
    /// * `buf` - 目标缓冲区（大小至少为 count * sector_size）
    ///
    /// # 返回
    ///
    /// 成功返回读取的字节数（恒等于 count * sector_size）
    pub fn read_sectors(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize> {
        let expected = self.check_range(lba, count, buf.len())?;
        if expected == 0 {
            return Ok(0);
        }

        let pba = self.to_physical(lba);
        let n = self.device_mut().read_sectors(pba, count, &mut buf[..expected])?;
        if n != expected {
            log::error!(
                "[BLOCK] short read at lba {}: {} of {} bytes",
                lba,
                n,
                expected
            );
            return Err(Error::new(ErrorKind::Io, "Device returned short read"));
        }

        self.inc_read(n);
        Ok(n)
    }

    /// 写入连续扇区
    ///
    /// 将缓冲区数据写入指定扇区地址起的 `count` 个扇区。
    /// 与读取一样，短传输在这一层提升为 I/O 错误。
    ///
    /// # 参数
    ///
    /// * `lba` - 起始扇区地址（卷内）
    /// * `count` - 要写入的扇区数
    /// * `buf` - 源数据缓冲区（大小至少为 count * sector_size）
    ///
    /// # 返回
    ///
    /// 成功返回写入的字节数（恒等于 count * sector_size）
    pub fn write_sectors(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize> {
        let expected = self.check_range(lba, count, buf.len())?;
        if expected == 0 {
            return Ok(0);
        }

        let pba = self.to_physical(lba);
        let n = self.device_mut().write_sectors(pba, count, &buf[..expected])?;
        if n != expected {
            log::error!(
                "[BLOCK] short write at lba {}: {} of {} bytes",
                lba,
                n,
                expected
            );
            return Err(Error::new(ErrorKind::Io, "Device returned short write"));
        }

        self.inc_write(n);
        Ok(n)
    }

    /// 校验扇区范围和缓冲区大小
    ///
    /// # 返回
    ///
    /// 成功返回本次传输的字节数
    fn check_range(&self, lba: u64, count: u32, buf_len: usize) -> Result<usize> {
        let sector_size = self.sector_size() as usize;
        let expected = count as usize * sector_size;

        if buf_len < expected {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Buffer too small for requested sectors",
            ));
        }

        let end = self
            .to_physical(lba)
            .checked_add(count as u64)
            .ok_or(Error::new(ErrorKind::InvalidInput, "Sector range overflow"))?;
        if end > self.total_sectors() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Sector range beyond end of device",
            ));
        }

        Ok(expected)
    }
}
