use std::path::PathBuf;

use rebarlink_config::{AppConfig, ConfigError};
use rebarlink_frontend::cli::CliOptions;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_override = Some(PathBuf::from(required(&mut args, "--config"))),
            "--scene" => options.scene = Some(PathBuf::from(required(&mut args, "--scene"))),
            "--tolerance" => {
                let value = required(&mut args, "--tolerance");
                let Ok(tolerance) = value.parse::<f64>() else {
                    eprintln!("`--tolerance` 需要数值，实际为 {value}");
                    std::process::exit(1);
                };
                options.tolerance = Some(tolerance);
            }
            "--attributes" => {
                let value = required(&mut args, "--attributes");
                let parsed: Result<Vec<i32>, _> =
                    value.split(',').map(|id| id.trim().parse::<i32>()).collect();
                let Ok(ids) = parsed else {
                    eprintln!("`--attributes` 需要以逗号分隔的属性 ID，实际为 {value}");
                    std::process::exit(1);
                };
                options.attribute_ids = Some(ids);
            }
            "--quiet" => options.quiet = true,
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let config = load_configuration(config_override);
    init_logging(&config);
    info!("启动 RebarLink 属性传递");

    if let Err(err) = rebarlink_frontend::run_cli(&config, &options) {
        error!(error = %err, "执行属性传递失败");
        std::process::exit(1);
    }
}

fn required(args: &mut impl Iterator<Item = String>, flag: &str) -> String {
    match args.next() {
        Some(value) => value,
        None => {
            eprintln!("`{flag}` 需要提供参数值");
            std::process::exit(1);
        }
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Invalid { .. }
                    | ConfigError::InvalidMessageCode(_)
                    | ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
