use prism_app::deferred_app::DeferredApp;
use prism_crate_tools::config::RenderGraphSettings;
use prism_crate_tools::init_log::{init_log_with, parse_level_filter};
use prism_crate_tools::resource::PrismPath;

const FRAME_COUNT: u64 = 240;
const RESIZE_FRAME: u64 = 120;
const SCREENSHOT_FRAME: u64 = 200;

fn main() -> anyhow::Result<()> {
    let settings = RenderGraphSettings::load_or_default(PrismPath::config_path("render_graph.toml"))?;
    init_log_with(parse_level_filter(&settings.log_level));
    log::info!("settings: {settings:?}");

    let mut app = DeferredApp::new(&settings)?;
    for frame in 0..FRAME_COUNT {
        if frame == RESIZE_FRAME {
            app.resize(settings.viewport_width / 2, settings.viewport_height / 2)?;
        }
        if frame == SCREENSHOT_FRAME {
            app.request_screenshot()?;
        }
        app.run_frame()?;
    }
    app.shutdown()
}
