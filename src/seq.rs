//! 确定性校验序列
//!
//! 基于 CRC32 迭代的可复位伪随机字生成器：每次 `walk` 把累加器自身的
//! 四个字节（小端）作为输入做一轮 CRC32（反射多项式 `0xEDB88320`）更新，
//! 因此每个输出字只依赖上一个输出字。从同一复位点出发，序列是 `walk`
//! 调用次数的纯函数——写入端可以生成任意长度的可校验数据，回读端独立
//! 重放同一序列逐字比对，全程不需要保存期望值。

use crate::consts::{CRC32_INIT, SEQ_WORD_BYTES};
use crate::error::{Error, ErrorKind, Result};
use byteorder::{ByteOrder, LittleEndian};
use crc32fast::Hasher;

/// 序列游标
///
/// 内部状态是未取反的 CRC32 寄存器值。crc32fast 对外暴露的是按约定
/// 取反后的校验值，所以在出入口各取反一次完成换算。
pub struct SequenceCursor {
    acc: u32,
}

impl SequenceCursor {
    /// 创建已复位的游标
    pub fn new() -> Self {
        Self { acc: CRC32_INIT }
    }

    /// 复位：累加器回到全 1 初始值（CRC32 约定种子）
    pub fn reset(&mut self) {
        self.acc = CRC32_INIT;
    }

    /// 前进一步并返回下一个 32 位字
    ///
    /// 累加器既是输入数据也是演化状态。
    pub fn walk(&mut self) -> u32 {
        let data = self.acc.to_le_bytes();
        let mut hasher = Hasher::new_with_initial(!self.acc);
        hasher.update(&data);
        self.acc = !hasher.finalize();
        self.acc
    }

    /// 用序列字填充缓冲区（小端字节序）
    ///
    /// 这是写入端对序列的唯一一次物化：传输缓冲区逐字填满后整体下盘。
    ///
    /// # 参数
    ///
    /// * `buf` - 目标缓冲区，长度必须是 4 的倍数
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.len() % SEQ_WORD_BYTES != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Buffer length not a multiple of the word size",
            ));
        }
        for word in buf.chunks_exact_mut(SEQ_WORD_BYTES) {
            LittleEndian::write_u32(word, self.walk());
        }
        Ok(())
    }

    /// 逐字比对缓冲区与重放的序列
    ///
    /// # 参数
    ///
    /// * `buf` - 回读数据，长度必须是 4 的倍数
    ///
    /// # 返回
    ///
    /// 全部一致返回 `Ok(None)`；否则返回第一处不一致。发现不一致后
    /// 游标已失去同步，调用者必须终止本次运行而不是继续比对。
    pub fn verify(&mut self, buf: &[u8]) -> Result<Option<Mismatch>> {
        if buf.len() % SEQ_WORD_BYTES != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Buffer length not a multiple of the word size",
            ));
        }
        for (i, word) in buf.chunks_exact(SEQ_WORD_BYTES).enumerate() {
            let expected = self.walk();
            let actual = LittleEndian::read_u32(word);
            if actual != expected {
                return Ok(Some(Mismatch {
                    offset: i * SEQ_WORD_BYTES,
                    expected,
                    actual,
                }));
            }
        }
        Ok(None)
    }
}

impl Default for SequenceCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// 一处校验不一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// 缓冲区内的字节偏移（指向不一致的字的起始）
    pub offset: usize,
    /// 期望的序列字
    pub expected: u32,
    /// 实际读到的字
    pub actual: u32,
}
