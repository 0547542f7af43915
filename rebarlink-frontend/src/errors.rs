use rebarlink_config::ConfigError;
use rebarlink_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("配置无效: {0}")]
    Config(#[from] ConfigError),
    #[error("场景快照读写失败: {0}")]
    Scene(#[from] IoError),
    #[error("宿主未响应选择请求")]
    SelectionNotRequested,
}
