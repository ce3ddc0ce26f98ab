//! 错误类型定义
//!
//! 提供连续分配与流式写入子系统的错误类型。
//! 所有错误在本层都不可恢复：策略是"停止并上报"，不做重试或降级继续。

use core::fmt;

/// 子系统操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 设备 I/O 错误（包括短传输）
    Io,
    /// 无效参数
    InvalidInput,
    /// 分配表/链损坏
    Corrupted,
    /// 权限错误（例如对只读句柄执行重分配）
    PermissionDenied,
    /// 空间不足（找不到足够长的连续空闲区）
    NoSpace,
    /// 文件不连续且无法重分配
    NotContiguous,
    /// 完成的操作字节数与请求不符（静默截断）
    SizeMismatch,
    /// 回读数据与确定性序列不符
    IntegrityMismatch,
    /// 无效状态
    InvalidState,
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 创建带原因的错误（简化版，忽略 cause）
    ///
    /// 注意：在 no_std 环境下，cause 参数会被忽略
    pub fn with_cause(kind: ErrorKind, message: &'static str, _cause: impl core::fmt::Debug) -> Self {
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_accessors() {
        let err = Error::new(ErrorKind::NoSpace, "no contiguous free area");
        assert_eq!(err.kind(), ErrorKind::NoSpace);
        assert_eq!(err.message(), "no contiguous free area");
    }

    #[test]
    fn test_error_equality() {
        let a = Error::new(ErrorKind::SizeMismatch, "short chunk");
        let b = Error::new(ErrorKind::SizeMismatch, "short chunk");
        assert_eq!(a, b);
    }
}
