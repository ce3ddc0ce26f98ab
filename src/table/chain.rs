//! 链遍历操作

use super::{AllocTable, TableEntry};
use crate::error::{Error, ErrorKind, Result};

#[cfg(feature = "write")]
use crate::consts::ENTRY_FREE;

/// 计算链长（簇数）
///
/// 从 `first` 沿表项走到链尾。链里出现空闲/保留/坏簇表项，
/// 或步数超过表项总数（成环），都按损坏处理。
///
/// # 参数
///
/// * `table` - 分配表
/// * `first` - 链首簇编号
///
/// # 返回
///
/// 成功返回链中的簇数
pub fn chain_length<T: AllocTable>(table: &mut T, first: u32) -> Result<u32> {
    let limit = table.entry_count();
    let mut cluster = first;
    let mut count = 0u32;

    loop {
        if cluster < table.first_data_cluster() {
            return Err(Error::new(ErrorKind::Corrupted, "Chain enters reserved area"));
        }
        if count >= limit {
            return Err(Error::new(ErrorKind::Corrupted, "Chain contains a cycle"));
        }

        let raw = table.get_entry(cluster)?;
        let entry = table.classify(raw);
        count += 1;

        match entry {
            TableEntry::Next(next) => cluster = next,
            TableEntry::EndOfChain => return Ok(count),
            _ => {
                log::error!("[TABLE] malformed entry in chain at cluster {}", cluster);
                return Err(Error::new(ErrorKind::Corrupted, "Malformed entry in chain"));
            }
        }
    }
}

/// 释放整条链（截断为空）
///
/// 从 `first` 开始沿链逐项清为空闲标记。遍历规则与 [`chain_length`]
/// 一致：链中的异常表项和环都按损坏处理，且不做修复。
///
/// # 参数
///
/// * `table` - 分配表
/// * `first` - 链首簇编号
///
/// # 返回
///
/// 成功返回释放的簇数
#[cfg(feature = "write")]
pub fn release_chain<T: AllocTable>(table: &mut T, first: u32) -> Result<u32> {
    let limit = table.entry_count();
    let mut cluster = first;
    let mut freed = 0u32;

    loop {
        if cluster < table.first_data_cluster() {
            return Err(Error::new(ErrorKind::Corrupted, "Chain enters reserved area"));
        }
        if freed >= limit {
            return Err(Error::new(ErrorKind::Corrupted, "Chain contains a cycle"));
        }

        let raw = table.get_entry(cluster)?;
        let entry = table.classify(raw);
        table.set_entry(cluster, ENTRY_FREE)?;
        freed += 1;

        match entry {
            TableEntry::Next(next) => cluster = next,
            TableEntry::EndOfChain => {
                log::debug!("[TABLE] released chain of {} clusters from {}", freed, first);
                return Ok(freed);
            }
            _ => {
                log::error!("[TABLE] malformed entry in chain at cluster {}", cluster);
                return Err(Error::new(ErrorKind::Corrupted, "Malformed entry in chain"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{ENTRY_BAD, ENTRY_EOC};
    use alloc::vec;
    use alloc::vec::Vec;

    /// 纯内存表，只给链操作测试用
    struct VecTable {
        entries: Vec<u32>,
    }

    impl VecTable {
        fn new(entries: u32) -> Self {
            Self {
                entries: vec![0u32; entries as usize],
            }
        }

        /// 建一条 start..start+len 的连续链
        fn with_chain(entries: u32, start: u32, len: u32) -> Self {
            let mut t = Self::new(entries);
            for i in 0..len - 1 {
                t.entries[(start + i) as usize] = start + i + 1;
            }
            t.entries[(start + len - 1) as usize] = ENTRY_EOC;
            t
        }
    }

    impl AllocTable for VecTable {
        fn entry_count(&self) -> u32 {
            self.entries.len() as u32
        }

        fn first_data_cluster(&self) -> u32 {
            2
        }

        fn sectors_per_cluster(&self) -> u32 {
            8
        }

        fn bytes_per_cluster(&self) -> u32 {
            4096
        }

        fn cluster_to_sector(&self, cluster: u32) -> Result<u64> {
            Ok((cluster - 2) as u64 * 8)
        }

        fn get_entry(&mut self, cluster: u32) -> Result<u32> {
            Ok(self.entries[cluster as usize])
        }

        #[cfg(feature = "write")]
        fn set_entry(&mut self, cluster: u32, value: u32) -> Result<()> {
            self.entries[cluster as usize] = value;
            Ok(())
        }
    }

    #[test]
    fn test_chain_length() {
        let mut t = VecTable::with_chain(64, 2, 5);
        assert_eq!(chain_length(&mut t, 2).unwrap(), 5);
    }

    #[test]
    fn test_chain_length_single() {
        let mut t = VecTable::with_chain(64, 10, 1);
        assert_eq!(chain_length(&mut t, 10).unwrap(), 1);
    }

    #[test]
    fn test_chain_with_free_entry_is_corrupt() {
        let mut t = VecTable::with_chain(64, 2, 5);
        t.entries[4] = 0; // 链中间出现空闲标记
        let err = chain_length(&mut t, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_chain_with_bad_entry_is_corrupt() {
        let mut t = VecTable::with_chain(64, 2, 5);
        t.entries[3] = ENTRY_BAD;
        let err = chain_length(&mut t, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_chain_cycle_detected() {
        let mut t = VecTable::with_chain(64, 2, 5);
        t.entries[6] = 2; // 链尾指回链首
        let err = chain_length(&mut t, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[cfg(feature = "write")]
    #[test]
    fn test_release_chain() {
        let mut t = VecTable::with_chain(64, 2, 5);
        let freed = release_chain(&mut t, 2).unwrap();
        assert_eq!(freed, 5);
        for cl in 2..7 {
            assert_eq!(t.entries[cl as usize], 0);
        }
    }

    #[cfg(feature = "write")]
    #[test]
    fn test_release_non_contiguous_chain() {
        // 释放不要求连续性，分散的链同样逐项清空
        let mut t = VecTable::new(64);
        t.entries[2] = 9;
        t.entries[9] = 4;
        t.entries[4] = ENTRY_EOC;

        let freed = release_chain(&mut t, 2).unwrap();
        assert_eq!(freed, 3);
        assert_eq!(t.entries[2], 0);
        assert_eq!(t.entries[9], 0);
        assert_eq!(t.entries[4], 0);
    }
}
