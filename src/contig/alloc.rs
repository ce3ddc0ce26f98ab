//! 连续区段分配实现

use super::Extent;
use crate::error::{Error, ErrorKind, Result};
use crate::table::{AllocTable, TableEntry};
use crate::volume::FileHandle;
use log::*;

#[cfg(feature = "write")]
use crate::consts::ENTRY_EOC;
#[cfg(feature = "write")]
use crate::table::release_chain;

/// 为文件分配一段连续区段
///
/// 先检查文件现有的链是否已经以所需大小连续；如果是，原样返回区段，
/// 不做任何表修改。否则（且文件可写、启用了 `write` 特性）释放现有链，
/// 从表头开始线性扫描第一段足够长的空闲区，按序成链后提交。
///
/// # 参数
///
/// * `table` - 分配表
/// * `file` - 文件句柄
/// * `required_bytes` - 需要的字节数（向上取整到整簇）
///
/// # 返回
///
/// 成功返回覆盖取整后大小的 [`Extent`]
///
/// # 错误
///
/// * `InvalidInput` - `required_bytes` 为 0
/// * `Corrupted` - 链中出现空闲/保留/坏簇表项（不尝试修复）
/// * `NotContiguous` - 文件不连续且不可写（或未启用 `write` 特性）
/// * `NoSpace` - 表中不存在足够长的连续空闲区
///
/// 分配失败后文件的分配状态未定义，调用者应重新打开句柄。
pub fn allocate_contiguous<T: AllocTable>(
    table: &mut T,
    file: &mut FileHandle,
    required_bytes: u64,
) -> Result<Extent> {
    if required_bytes == 0 {
        return Err(Error::new(ErrorKind::InvalidInput, "Cannot allocate zero bytes"));
    }

    let unit = table.bytes_per_cluster() as u64;
    let units_needed64 = (required_bytes + unit - 1) / unit;
    if units_needed64 > (table.entry_count() - table.first_data_cluster()) as u64 {
        return Err(Error::new(ErrorKind::NoSpace, "Request exceeds volume capacity"));
    }
    let units_needed = units_needed64 as u32;
    let rounded = units_needed64 * unit;

    // 快速路径：现有链已经以取整后的大小连续，零成本确认
    if file.size() == rounded && file.first_cluster() != 0 {
        if verify_chain_contiguous(table, file.first_cluster(), units_needed)? {
            debug!(
                "[CONTIG] existing chain at cluster {} confirmed contiguous ({} clusters)",
                file.first_cluster(),
                units_needed
            );
            return make_extent(table, file.first_cluster(), units_needed, rounded);
        }
    }

    // 文件不连续：只有可写句柄才能重建链
    if !file.is_writable() {
        return Err(Error::new(
            ErrorKind::NotContiguous,
            "File not contiguous and not opened for writing",
        ));
    }

    reallocate(table, file, units_needed, rounded)
}

/// 校验链从 `first` 起连续 `units` 簇
///
/// 返回 `Ok(false)` 表示链存在但不连续（下一跳不是紧邻的下一簇，
/// 或链长与期望不符）。链中的空闲/保留/坏簇表项是硬错误。
fn verify_chain_contiguous<T: AllocTable>(
    table: &mut T,
    first: u32,
    units: u32,
) -> Result<bool> {
    if first < table.first_data_cluster() || first >= table.entry_count() {
        return Err(Error::new(ErrorKind::Corrupted, "Chain starts in reserved area"));
    }

    let mut cluster = first;
    for step in 0..units {
        let raw = table.get_entry(cluster)?;
        let entry = table.classify(raw);
        let last = step == units - 1;

        match entry {
            TableEntry::Next(next) => {
                // 链比期望长，或下一跳不紧邻，都按不连续处理
                if last || next != cluster + 1 {
                    return Ok(false);
                }
                cluster = next;
            }
            TableEntry::EndOfChain => {
                // 链尾必须恰好落在最后一簇
                return Ok(last);
            }
            _ => {
                error!("[CONTIG] malformed entry in chain at cluster {}", cluster);
                return Err(Error::new(ErrorKind::Corrupted, "Malformed entry in chain"));
            }
        }
    }

    Ok(false)
}

/// 重分配路径：释放现有链，扫描空闲区，按序成链提交
#[cfg(feature = "write")]
fn reallocate<T: AllocTable>(
    table: &mut T,
    file: &mut FileHandle,
    units_needed: u32,
    rounded: u64,
) -> Result<Extent> {
    // 先把现有链整条释放（截断为空）
    if file.first_cluster() != 0 {
        release_chain(table, file.first_cluster())?;
        file.reset_chain();
    }

    // 从最低有效簇开始线性扫描，跟踪当前空闲区的起点和长度；
    // 遇到占用簇就把起点移到下一候选
    let first_data = table.first_data_cluster();
    let entry_count = table.entry_count();
    let mut run_start = first_data;
    let mut run_len = 0u32;
    let mut cluster = first_data;

    loop {
        if cluster >= entry_count {
            info!(
                "[CONTIG] no contiguous free area of {} clusters",
                units_needed
            );
            return Err(Error::new(ErrorKind::NoSpace, "No contiguous free area"));
        }

        let raw = table.get_entry(cluster)?;
        if table.classify(raw) == TableEntry::Free {
            if run_len == 0 {
                run_start = cluster;
            }
            run_len += 1;
            if run_len == units_needed {
                break;
            }
        } else {
            run_len = 0;
        }
        cluster += 1;
    }

    // 按序成链：每项指向下一簇，尾项写链尾标记
    for i in 0..units_needed {
        let cl = run_start + i;
        let value = if i == units_needed - 1 { ENTRY_EOC } else { cl + 1 };
        table.set_entry(cl, value)?;
    }

    file.set_chain(run_start, rounded);

    info!(
        "[CONTIG] allocated clusters {}..={} ({} bytes) at sector {}",
        run_start,
        run_start + units_needed - 1,
        rounded,
        table.cluster_to_sector(run_start)?
    );

    make_extent(table, run_start, units_needed, rounded)
}

#[cfg(not(feature = "write"))]
fn reallocate<T: AllocTable>(
    _table: &mut T,
    _file: &mut FileHandle,
    _units_needed: u32,
    _rounded: u64,
) -> Result<Extent> {
    // 只读配置：分配器只保留快速校验路径
    Err(Error::new(
        ErrorKind::NotContiguous,
        "File not contiguous and table is read-only",
    ))
}

fn make_extent<T: AllocTable>(
    table: &mut T,
    first_cluster: u32,
    cluster_count: u32,
    byte_len: u64,
) -> Result<Extent> {
    Ok(Extent {
        first_cluster,
        first_sector: table.cluster_to_sector(first_cluster)?,
        cluster_count,
        sectors_per_cluster: table.sectors_per_cluster(),
        byte_len,
    })
}
