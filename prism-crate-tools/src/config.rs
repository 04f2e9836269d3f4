//! 渲染图运行配置
//!
//! 配置文件示例：
//!
//! ```toml
//! log_level = "debug"
//! print_execution_plan = true
//! viewport_width = 1920
//! viewport_height = 1080
//! default_creation_flags = ["LazyInit", "Shared"]
//! cross_graph_sharing = false
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 渲染图的运行配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderGraphSettings {
    /// 日志级别：off / error / warn / info / debug / trace
    pub log_level: String,

    /// 每次 build 之后是否打印执行计划
    pub print_execution_plan: bool,

    /// 初始视口尺寸
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// 未显式指定 flags 的资源创建接口所使用的默认 flags
    ///
    /// 取值为 `ResourceCreationFlags` 的 flag 名称
    pub default_creation_flags: Vec<String>,

    /// 是否允许挂在同一个共享资源表上的多个渲染图之间复用 Shared 资源
    pub cross_graph_sharing: bool,
}

impl Default for RenderGraphSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            print_execution_plan: true,
            viewport_width: 1280,
            viewport_height: 720,
            default_creation_flags: vec!["LazyInit".to_string()],
            cross_graph_sharing: true,
        }
    }
}

impl RenderGraphSettings {
    /// 从 TOML 文件加载配置
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file: {:?}", path.as_ref()))?;

        Self::from_toml_str(&content).with_context(|| format!("failed to parse config file: {:?}", path.as_ref()))
    }

    /// 配置文件不存在时使用默认配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if !path.as_ref().exists() {
            log::warn!("config file {:?} not found, using default settings", path.as_ref());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let settings: Self = toml::from_str(content).context("invalid render graph settings")?;
        anyhow::ensure!(
            settings.viewport_width > 0 && settings.viewport_height > 0,
            "viewport must not be empty: {}x{}",
            settings.viewport_width,
            settings.viewport_height
        );
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("failed to serialize render graph settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let settings = RenderGraphSettings::from_toml_str(
            r#"
            log_level = "debug"
            viewport_width = 1920
            "#,
        )
        .unwrap();

        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.viewport_width, 1920);
        assert_eq!(settings.viewport_height, 720);
        assert!(settings.print_execution_plan);
        assert_eq!(settings.default_creation_flags, vec!["LazyInit".to_string()]);
    }

    #[test]
    fn test_empty_viewport_rejected() {
        assert!(RenderGraphSettings::from_toml_str("viewport_height = 0").is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let settings = RenderGraphSettings {
            cross_graph_sharing: false,
            default_creation_flags: vec!["LazyInit".to_string(), "Shared".to_string()],
            ..Default::default()
        };
        let text = settings.to_toml_string().unwrap();
        assert_eq!(RenderGraphSettings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = RenderGraphSettings::load_or_default("/definitely/not/here.toml").unwrap();
        assert_eq!(settings, RenderGraphSettings::default());
    }
}
