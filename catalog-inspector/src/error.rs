use std::path::PathBuf;

use catalog_filter::ConfigError;
use thiserror::Error;

/// 检查工具的错误
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("无法读取文件 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("遍历目录时出错: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("HTML 解析失败: {0}")]
    Parse(String),

    #[error("筛选条件格式错误 '{0}'，应为 类别=值")]
    FilterArg(String),

    #[error("价格格式错误 '{0}'")]
    PriceArg(String),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("没有找到 HTML 页面: {0}")]
    NoPages(PathBuf),

    #[error("序列化报告失败: {0}")]
    Json(#[from] serde_json::Error),
}
