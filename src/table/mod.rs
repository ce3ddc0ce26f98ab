//! 分配表抽象
//!
//! 分配表是卷上"每簇一个表项"的链表结构（FAT32 约定）：表项要么指向
//! 文件链中的下一簇，要么是空闲/保留/坏簇/链尾标记。
//!
//! 这个模块把表访问收窄为一个能力接口 [`AllocTable`]，分配器只通过它
//! 读写表项和做簇到扇区的换算，不接触卷的其余结构。
//!
//! - table/entry.rs 提供表项分类 [`TableEntry`]
//! - table/chain.rs 提供链遍历操作（整链释放）

mod chain;
mod entry;

#[cfg(feature = "write")]
pub use chain::release_chain;
pub use chain::chain_length;
pub use entry::TableEntry;

use crate::error::Result;

/// 分配表访问能力
///
/// 卷实现此 trait，把表项读写和几何换算暴露给分配器。
/// 表项值使用 FAT32 约定（见 [`TableEntry::classify`]）。
///
/// # 并发约定
///
/// 表项只在分配器的重分配路径中被修改，修改期间调用者通过 `&mut`
/// 独占持有实现者；没有任何组件会与进行中的分配并发读写表项。
pub trait AllocTable {
    /// 表项总数（含保留表项；有效数据簇编号范围为
    /// `first_data_cluster()..entry_count()`）
    fn entry_count(&self) -> u32;

    /// 第一个数据簇编号（之下的编号视为保留，默认 2）
    ///
    /// 保留边界由卷几何配置决定，链中出现小于此值的表项按损坏处理。
    fn first_data_cluster(&self) -> u32;

    /// 每簇扇区数
    fn sectors_per_cluster(&self) -> u32;

    /// 每簇字节数（分配单元大小）
    fn bytes_per_cluster(&self) -> u32;

    /// 簇编号换算为卷内起始扇区地址
    fn cluster_to_sector(&self, cluster: u32) -> Result<u64>;

    /// 读取表项原始值
    fn get_entry(&mut self, cluster: u32) -> Result<u32>;

    /// 写入表项
    ///
    /// 按 FAT32 约定只改写低 28 位，高 4 位保留。
    #[cfg(feature = "write")]
    fn set_entry(&mut self, cluster: u32, value: u32) -> Result<()>;

    /// 对表项原始值做分类
    fn classify(&self, raw: u32) -> TableEntry {
        TableEntry::classify(raw, self.first_data_cluster(), self.entry_count())
    }
}
