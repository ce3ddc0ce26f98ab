//! 序列生产者

use super::ChunkSource;
use crate::error::Result;
use crate::seq::SequenceCursor;

/// 确定性序列生产者
///
/// 用校验序列逐字填满每一块缓冲区，永不短供。写入端用它生成测试
/// 数据流，回读端用一个独立复位的游标重放同一序列做比对。
pub struct SequenceSource {
    cursor: SequenceCursor,
}

impl SequenceSource {
    /// 创建从复位点开始的生产者
    pub fn new() -> Self {
        Self {
            cursor: SequenceCursor::new(),
        }
    }
}

impl Default for SequenceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkSource for SequenceSource {
    fn next_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.cursor.fill(buf)?;
        Ok(buf.len())
    }
}
