//! 文件句柄

use bitflags::bitflags;

bitflags! {
    /// 文件打开权限标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u8 {
        /// 读权限
        const READ = 0x01;
        /// 写权限
        const WRITE = 0x02;
    }
}

/// 文件句柄
///
/// 表示一个已打开文件的分配链首簇、逻辑大小和权限标志。
///
/// # 设计说明
///
/// 句柄由外部的"打开"操作产生、"关闭"操作销毁——目录查找不在本
/// 子系统范围内，所以这里只提供两个构造器充当那个边界：空文件用
/// [`FileHandle::new`]，已有链的文件用 [`FileHandle::from_chain`]。
/// 句柄是纯数据；操作期间分配器/写入器通过 `&mut` 独占持有它，
/// 分配失败后句柄的分配状态未定义，调用者应重新打开而不是复用。
pub struct FileHandle {
    /// 链首簇编号（0 表示空链）
    first_cluster: u32,
    /// 逻辑大小（字节）
    size: u64,
    /// 权限标志
    flags: OpenFlags,
}

impl FileHandle {
    /// 创建空文件的句柄
    pub fn new(flags: OpenFlags) -> Self {
        Self {
            first_cluster: 0,
            size: 0,
            flags,
        }
    }

    /// 为已有分配链创建句柄
    ///
    /// # 参数
    ///
    /// * `first_cluster` - 链首簇编号
    /// * `size` - 文件逻辑大小（字节）
    /// * `flags` - 权限标志
    pub fn from_chain(first_cluster: u32, size: u64, flags: OpenFlags) -> Self {
        Self {
            first_cluster,
            size,
            flags,
        }
    }

    /// 获取链首簇编号（0 表示空链）
    pub fn first_cluster(&self) -> u32 {
        self.first_cluster
    }

    /// 获取文件逻辑大小（字节）
    pub fn size(&self) -> u64 {
        self.size
    }

    /// 获取权限标志
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    /// 是否可写
    pub fn is_writable(&self) -> bool {
        self.flags.contains(OpenFlags::WRITE)
    }

    /// 更新逻辑大小
    ///
    /// 流式写入器不更新文件元数据，成功完成后由调用者用实际写入的
    /// 字节数调用此方法。
    pub fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    /// 记录新的链首（分配器提交新链时调用）
    #[cfg(feature = "write")]
    pub(crate) fn set_chain(&mut self, first_cluster: u32, size: u64) {
        self.first_cluster = first_cluster;
        self.size = size;
    }

    /// 清空链记录（截断后调用）
    #[cfg(feature = "write")]
    pub(crate) fn reset_chain(&mut self) {
        self.first_cluster = 0;
        self.size = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_handle_is_empty() {
        let file = FileHandle::new(OpenFlags::READ | OpenFlags::WRITE);
        assert_eq!(file.first_cluster(), 0);
        assert_eq!(file.size(), 0);
        assert!(file.is_writable());
    }

    #[test]
    fn test_read_only_handle() {
        let file = FileHandle::from_chain(5, 4096, OpenFlags::READ);
        assert!(!file.is_writable());
        assert_eq!(file.first_cluster(), 5);
        assert_eq!(file.size(), 4096);
    }

    #[test]
    fn test_set_size() {
        let mut file = FileHandle::new(OpenFlags::WRITE);
        file.set_size(1024);
        assert_eq!(file.size(), 1024);
    }
}
