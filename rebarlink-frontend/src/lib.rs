pub mod cli;
pub mod console;
pub mod demo;
pub mod errors;
pub mod loader;

use cli::{CliOptions, CliRun};
use errors::FrontendError;
use rebarlink_config::AppConfig;
use tracing::info;

/// 以控制台宿主执行一轮属性传递。
pub fn run_cli(config: &AppConfig, options: &CliOptions) -> Result<CliRun, FrontendError> {
    info!("启动控制台前端");
    cli::run(config, options)
}
