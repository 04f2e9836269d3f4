//! headless 的 deferred 渲染 app
//!
//! - [`render_pipeline`]：shadow / gbuffer / lighting / tonemap 以及 OneHit 的 BRDF LUT、Trigger 的截图
//! - [`deferred_app`]：组装渲染图，驱动帧循环与 resize

pub mod deferred_app;
pub mod render_pipeline;
