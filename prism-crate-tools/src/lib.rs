//! Prism 工具集
//!
//! 提供日志初始化、资源路径管理、渲染图配置等通用工具。
//!
//! # PrismPath
//! 基于工作区根目录的统一路径管理，避免硬编码相对路径。
//!
//! # RenderGraphSettings
//! 渲染图的运行配置，可通过 TOML 文件加载。

pub mod config;
pub mod init_log;
pub mod resource;
