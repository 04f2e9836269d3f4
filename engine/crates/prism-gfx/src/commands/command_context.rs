use crate::device::GfxObjectId;

/// 记录下来的一条命令
#[derive(Clone, PartialEq, Debug)]
pub enum GfxCommand {
    BeginLabel(String),
    EndLabel,
    Draw { vertex_count: u32, instance_count: u32 },
    Dispatch { x: u32, y: u32, z: u32 },
    Bind(GfxObjectId),
}

/// 命令上下文
///
/// 渲染图在执行每个 pass 时把它交给 pass。这里只按顺序记录命令，
/// 提交与同步由外部的帧驱动负责。
#[derive(Default)]
pub struct GfxCommandContext {
    name: String,
    commands: Vec<GfxCommand>,
    label_depth: u32,
}
// new & init
impl GfxCommandContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
// commands
impl GfxCommandContext {
    pub fn begin_label(&mut self, label: &str) {
        self.label_depth += 1;
        self.commands.push(GfxCommand::BeginLabel(label.to_string()));
    }

    pub fn end_label(&mut self) {
        if self.label_depth == 0 {
            log::warn!("command context '{}': end_label without begin_label", self.name);
            return;
        }
        self.label_depth -= 1;
        self.commands.push(GfxCommand::EndLabel);
    }

    pub fn bind(&mut self, object: GfxObjectId) {
        self.commands.push(GfxCommand::Bind(object));
    }

    pub fn draw(&mut self, vertex_count: u32, instance_count: u32) {
        self.commands.push(GfxCommand::Draw {
            vertex_count,
            instance_count,
        });
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.commands.push(GfxCommand::Dispatch { x, y, z });
    }

    /// 清空已记录的命令，开始新的一帧
    pub fn reset(&mut self) {
        self.commands.clear();
        self.label_depth = 0;
    }
}
// getters
impl GfxCommandContext {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn commands(&self) -> &[GfxCommand] {
        &self.commands
    }

    /// 按记录顺序返回所有 label
    pub fn labels(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                GfxCommand::BeginLabel(label) => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }
}
