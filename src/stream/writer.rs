//! 流式写入实现

use super::ChunkSource;
use crate::block::{BlockDev, BlockDevice};
use crate::contig::Extent;
use crate::error::{Error, ErrorKind, Result};
use alloc::vec;
use log::*;

/// 把生产者的数据流写进一个连续区段
///
/// 从区段首扇区开始严格升序传输，每块数据先向生产者索取、再整块
/// 下盘。对调用者而言这个调用是原子的：要么传满整个区段返回成功，
/// 要么返回遇到的第一个错误（设备错误、生产者错误或短块），此时
/// 最后一个确认扇区之后的盘上内容未定义。
///
/// 写入器不更新任何文件元数据；成功返回后由调用者把文件逻辑大小
/// 改成实际写入的字节数。
///
/// # 参数
///
/// * `bdev` - 块设备包装器
/// * `extent` - 已分配的连续区段（或它的一个切片）
/// * `source` - 数据块生产者
/// * `chunk_sectors` - 单次传输的扇区数
///
/// # 返回
///
/// 成功返回写入的总字节数（恒等于 `extent.byte_len`）
pub fn stream_write<D: BlockDevice, S: ChunkSource>(
    bdev: &mut BlockDev<D>,
    extent: &Extent,
    source: &mut S,
    chunk_sectors: u32,
) -> Result<u64> {
    if chunk_sectors == 0 {
        return Err(Error::new(ErrorKind::InvalidInput, "Chunk must cover sectors"));
    }

    let sector_size = bdev.sector_size() as u64;
    if extent.byte_len == 0 || extent.byte_len % sector_size != 0 {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Extent length not sector aligned",
        ));
    }

    let mut remaining = extent.byte_len / sector_size;
    let mut lba = extent.first_sector;
    let mut total = 0u64;
    let mut buf = vec![0u8; chunk_sectors as usize * sector_size as usize];

    while remaining > 0 {
        let sectors = remaining.min(chunk_sectors as u64) as u32;
        let want = sectors as usize * sector_size as usize;

        // 同步会合：生产者填满这一块，控制权才回到写入器
        let got = source.next_chunk(&mut buf[..want])?;
        if got != want {
            error!(
                "[STREAM] producer delivered {} of {} bytes at offset {}",
                got, want, total
            );
            return Err(Error::new(ErrorKind::SizeMismatch, "Producer delivered short chunk"));
        }

        bdev.write_sectors(lba, sectors, &buf[..want])?;

        lba += sectors as u64;
        remaining -= sectors as u64;
        total += want as u64;
    }

    debug!(
        "[STREAM] wrote {} bytes to sectors {}..{}",
        total, extent.first_sector, lba
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemDevice;
    use crate::seq::SequenceCursor;
    use crate::stream::SequenceSource;

    fn extent(first_sector: u64, sectors: u64) -> Extent {
        Extent {
            first_cluster: 2,
            first_sector,
            cluster_count: ((sectors + 7) / 8) as u32,
            sectors_per_cluster: 8,
            byte_len: sectors * 512,
        }
    }

    /// 只供应固定字节数的生产者，用来制造短块
    struct ShortSource {
        remaining: usize,
    }

    impl ChunkSource for ShortSource {
        fn next_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
            let n = self.remaining.min(buf.len());
            for b in &mut buf[..n] {
                *b = 0xEE;
            }
            self.remaining -= n;
            Ok(n)
        }
    }

    #[test]
    fn test_stream_write_full_extent() {
        let dev = MemDevice::new(512, 64);
        let mut bdev = BlockDev::new(dev).unwrap();
        let mut source = SequenceSource::new();

        let n = stream_write(&mut bdev, &extent(8, 16), &mut source, 4).unwrap();
        assert_eq!(n, 16 * 512);

        // 盘上内容必须等于独立重放的序列
        let mut cursor = SequenceCursor::new();
        let written = &bdev.device().raw()[8 * 512..(8 + 16) * 512];
        let mut expected = alloc::vec![0u8; written.len()];
        cursor.fill(&mut expected).unwrap();
        assert_eq!(written, &expected[..]);
    }

    #[test]
    fn test_stream_write_ascending_order() {
        // 区段之外的扇区保持为零
        let dev = MemDevice::new(512, 64);
        let mut bdev = BlockDev::new(dev).unwrap();
        let mut source = SequenceSource::new();

        stream_write(&mut bdev, &extent(4, 8), &mut source, 8).unwrap();

        assert!(bdev.device().raw()[..4 * 512].iter().all(|&b| b == 0));
        assert!(bdev.device().raw()[12 * 512..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_short_producer_is_size_mismatch() {
        let dev = MemDevice::new(512, 64);
        let mut bdev = BlockDev::new(dev).unwrap();

        // 生产者总量比区段少一个扇区
        let mut source = ShortSource { remaining: 15 * 512 };
        let err = stream_write(&mut bdev, &extent(0, 16), &mut source, 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SizeMismatch);
    }

    #[test]
    fn test_device_fault_propagates() {
        let mut dev = MemDevice::new(512, 64);
        dev.fail_after_writes(2);
        let mut bdev = BlockDev::new(dev).unwrap();
        let mut source = SequenceSource::new();

        let err = stream_write(&mut bdev, &extent(0, 16), &mut source, 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_zero_chunk_rejected() {
        let dev = MemDevice::new(512, 64);
        let mut bdev = BlockDev::new(dev).unwrap();
        let mut source = SequenceSource::new();
        let err = stream_write(&mut bdev, &extent(0, 8), &mut source, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
