use thiserror::Error;

/// 渲染图的错误
///
/// - 构建期错误（重名、无法解析的依赖、环）会终止图的构建，执行顺序无从谈起
/// - `Construction` 来自设备的资源构造函数，原样向上传播，不做回滚
#[derive(Debug, Error)]
pub enum RenderGraphError {
    #[error("render pass '{0}' is already registered")]
    DuplicateNode(String),

    #[error("resource '{0}' is already registered")]
    DuplicateResource(String),

    #[error("render pass '{node}' could not resolve dependency '{resource}'")]
    UnresolvedDependency { node: String, resource: String },

    #[error("cyclic dependency detected at render pass '{node}'")]
    CyclicDependency { node: String },

    #[error("render pass '{0}' not found")]
    UnknownPass(String),

    #[error("resource '{0}' not found")]
    UnknownResource(String),

    #[error("resource '{0}' has no value")]
    EmptyResource(String),

    #[error("resource '{name}' is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("cannot share '{consumer}' from '{source_name}': {reason}")]
    InvalidShare {
        consumer: String,
        source_name: String,
        reason: &'static str,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("failed to construct resource '{name}'")]
    Construction {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("render pass '{pass}' failed in {stage}")]
    Pass {
        pass: String,
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

pub type RgResult<T> = Result<T, RenderGraphError>;

impl RenderGraphError {
    /// 是否为构建期错误
    pub fn is_build_fatal(&self) -> bool {
        matches!(
            self,
            Self::DuplicateNode(_)
                | Self::DuplicateResource(_)
                | Self::UnresolvedDependency { .. }
                | Self::CyclicDependency { .. }
        )
    }
}
