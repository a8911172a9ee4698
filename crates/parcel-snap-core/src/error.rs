//! 捕捉引擎错误定义
//!
//! 查询与提取路径从不报错；只有配置校验会返回错误。

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapError {
    #[error("Invalid snap config: {0}")]
    InvalidConfig(String),
}
