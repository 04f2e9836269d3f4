//! deferred 管线的各个 pass
//!
//! 数据流：
//!
//! ```text
//! shadow ───────────────┐
//! brdf_lut (OneHit) ────┤
//! gbuffer ──────────────┴─> lighting ─> tonemap ─> #backbuffer ─> screenshot (Trigger)
//! ```

pub mod brdf_lut_pass;
pub mod gbuffer_pass;
pub mod lighting_pass;
pub mod screenshot_pass;
pub mod shadow_pass;
pub mod tonemap_pass;

/// 由外部（窗口或离屏目标）提供的最终输出
pub const BACKBUFFER: &str = "#backbuffer";
