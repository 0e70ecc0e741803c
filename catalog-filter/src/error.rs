use thiserror::Error;

/// 配置解析错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("解析配置失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("哨兵值不能为空")]
    EmptySentinel,
}

/// 页面绑定错误
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("无法获取 window 对象")]
    NoWindow,
    #[error("无法获取 document 对象")]
    NoDocument,
    #[error("选择器无效: {0}")]
    Selector(String),
    #[error("注册事件监听失败: {0}")]
    Listener(String),
}
