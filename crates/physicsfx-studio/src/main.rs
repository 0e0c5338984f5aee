use anyhow::{Context, Result};
use physicsfx_loop::adapter::{ToolkitConfig, ToolkitLoop};
use physicsfx_loop::core::{LoopConfig, LoopCoordinator};
use physicsfx_loop::device::{ClearColorEngine, GpuInit};
use physicsfx_loop::logging::{LoggingConfig, init_logging};

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 768;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let target_rate = target_rate_from_args()?;
    let config = LoopConfig::default()
        .with_target_rate(target_rate)
        .with_thread_name("physicsfx-studio");

    let mut studio = ToolkitLoop::new(
        ClearColorEngine::new(GpuInit::default()),
        config,
        ToolkitConfig {
            title: "physicsfx studio".to_string(),
        },
    );

    log::info!("physicsfx studio: {WIDTH}x{HEIGHT} at {target_rate} Hz");

    // Blocks until the window closes.
    studio
        .start(None, WIDTH, HEIGHT)
        .context("studio event loop failed")?;

    let stats = studio.stats();
    log::info!(
        "studio closed after {} frames (last sample {:?} fps)",
        stats.frame_count,
        stats.last_fps
    );
    if let Some(fault) = stats.fault {
        anyhow::bail!("engine stopped: {fault}");
    }
    Ok(())
}

/// `--fps <n>`, default 60.
fn target_rate_from_args() -> Result<u32> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--fps" {
            let value = args.next().context("--fps needs a value")?;
            return value
                .parse()
                .with_context(|| format!("invalid --fps value {value:?}"));
        }
    }
    Ok(60)
}
