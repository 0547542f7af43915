use std::env;
use std::path::{Path, PathBuf};

use rebarlink_config::AppConfig;
use rebarlink_core::document::Drawing;
use rebarlink_io::{JsonSceneFacade, SceneLoader};
use tracing::{info, warn};

use crate::demo::{DemoElements, populate_demo};
use crate::errors::FrontendError;

/// 指定场景快照路径的环境变量。
pub const SCENE_ENV: &str = "REBARLINK_SCENE";

/// 图纸来源，便于前端呈现加载信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneSource {
    Snapshot(PathBuf),
    Demo,
}

/// 统一封装加载后的图纸与元信息。
#[derive(Debug)]
pub struct LoadedScene {
    pub drawing: Drawing,
    pub source: SceneSource,
    pub demo_elements: Option<DemoElements>,
}

/// 按 命令行参数 → 环境变量 `REBARLINK_SCENE` → 配置 `scene.fixture` 的顺序加载快照。
/// 命令行指定的文件读取失败时返回错误；其余来源失败时回退到内置示例。
pub fn load_scene(config: &AppConfig, explicit: Option<&Path>) -> Result<LoadedScene, FrontendError> {
    let from_env = env::var_os(SCENE_ENV).map(PathBuf::from);
    load_scene_from(config, explicit, from_env)
}

pub fn load_scene_from(
    config: &AppConfig,
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
) -> Result<LoadedScene, FrontendError> {
    let loader = JsonSceneFacade::new();

    if let Some(path) = explicit {
        let drawing = loader.load(path)?;
        info!(path = %path.display(), elements = drawing.len(), "从快照加载图纸成功");
        return Ok(LoadedScene {
            drawing,
            source: SceneSource::Snapshot(path.to_path_buf()),
            demo_elements: None,
        });
    }

    if let Some(path) = from_env.or_else(|| config.scene.fixture.clone()) {
        match loader.load(&path) {
            Ok(drawing) => {
                info!(path = %path.display(), elements = drawing.len(), "从快照加载图纸成功");
                return Ok(LoadedScene {
                    drawing,
                    source: SceneSource::Snapshot(path),
                    demo_elements: None,
                });
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载快照失败，回退到内置示例");
            }
        }
    }

    Ok(demo_scene())
}

pub fn demo_scene() -> LoadedScene {
    let mut drawing = Drawing::new();
    let demo_elements = populate_demo(&mut drawing);
    LoadedScene {
        drawing,
        source: SceneSource::Demo,
        demo_elements: Some(demo_elements),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_demo_without_sources() {
        let loaded = load_scene_from(&AppConfig::default(), None, None).unwrap();
        assert_eq!(loaded.source, SceneSource::Demo);
        assert!(loaded.demo_elements.is_some());
        assert_eq!(loaded.drawing.len(), 9);
    }

    #[test]
    fn broken_fixture_falls_back_to_demo() {
        let mut config = AppConfig::default();
        config.scene.fixture = Some(PathBuf::from("/nonexistent/scene.json"));
        let loaded = load_scene_from(&config, None, None).unwrap();
        assert_eq!(loaded.source, SceneSource::Demo);
    }

    #[test]
    fn explicit_path_failure_is_an_error() {
        let err = load_scene_from(
            &AppConfig::default(),
            Some(Path::new("/nonexistent/scene.json")),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, FrontendError::Scene(_)));
    }

    #[test]
    fn env_path_wins_over_config_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(&path, r#"{"elements": [{"id": 1, "type": "Beam"}]}"#).unwrap();

        let mut config = AppConfig::default();
        config.scene.fixture = Some(PathBuf::from("/nonexistent/scene.json"));
        let loaded = load_scene_from(&config, None, Some(path.clone())).unwrap();
        assert_eq!(loaded.source, SceneSource::Snapshot(path));
        assert_eq!(loaded.drawing.len(), 1);
    }
}
