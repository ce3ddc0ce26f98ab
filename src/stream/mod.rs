//! 流式扇区写入
//!
//! 把一个持续产出数据的生产者直接灌进已分配好的连续区段：按扇区
//! 升序传输，不经过文件系统的逐块簿记（不重走链、不中途更新目录项
//! 大小）。
//!
//! 生产者和写入器是单线程协作的交接：写入器索要下一块数据时挂起在
//! 生产者的回调上，生产者填完缓冲区控制权才回来，天然只有一块数据
//! 在途——这就是背压，不引入任何无界队列。
//!
//! - stream/source.rs 提供 [`ChunkSource`] 的序列生成器实现
//! - stream/writer.rs 提供 [`stream_write`]

mod source;
mod writer;

pub use source::SequenceSource;
pub use writer::stream_write;

use crate::error::Result;

/// 数据块生产者
///
/// 写入器每准备好一块传输缓冲区就调用一次 `next_chunk`，生产者把
/// 数据填进去。这是一次同步会合：调用返回前写入器不会前进，返回后
/// 生产者不再持有缓冲区。
pub trait ChunkSource {
    /// 填充下一块数据
    ///
    /// # 参数
    ///
    /// * `buf` - 本次传输的缓冲区
    ///
    /// # 返回
    ///
    /// 成功返回实际填充的字节数；少于 `buf.len()` 表示生产者提前
    /// 耗尽，写入器会把它按大小不符错误上报
    fn next_chunk(&mut self, buf: &mut [u8]) -> Result<usize>;
}
