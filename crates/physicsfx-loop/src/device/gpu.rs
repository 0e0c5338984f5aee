use std::sync::Arc;

use anyhow::{Context, Result, bail};
use wgpu::SurfaceError;

use super::error::SurfaceErrorAction;
use super::init::GpuInit;
use super::raw::RawTarget;
use super::surface::{choose_alpha_mode, choose_surface_format};
use crate::surface::SurfaceHandle;

/// wgpu device, queue and configured surface for one engine session.
pub struct Gpu {
    surface: wgpu::Surface<'static>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: (u32, u32),
}

/// One acquired swapchain image. Present by passing it to `Gpu::submit`.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl Gpu {
    /// Blocks on adapter and device acquisition.
    pub fn new(handle: &SurfaceHandle, width: u32, height: u32, init: &GpuInit) -> Result<Self> {
        pollster::block_on(Self::create(handle, width, height, init))
    }

    async fn create(
        handle: &SurfaceHandle,
        width: u32,
        height: u32,
        init: &GpuInit,
    ) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "surface has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = create_surface(&instance, handle)
            .with_context(|| format!("failed to create wgpu surface for {handle}"))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("physicsfx device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps.formats, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: init.present_mode,
            alpha_mode: choose_alpha_mode(&caps.alpha_modes, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);

        let info = adapter.get_info();
        log::info!(
            "gpu ready: {} ({:?}), {format:?} {width}x{height}",
            info.name,
            info.backend
        );

        Ok(Gpu {
            surface,
            adapter,
            device,
            queue,
            config,
            size: (width, height),
        })
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// wgpu cannot configure a 0x0 surface; such sizes are recorded and the
    /// configuration deferred.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("physicsfx frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the frame's commands and presents it.
    pub fn submit(&self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        frame.surface_texture.present();
    }

    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        let action = SurfaceErrorAction::classify(&err);
        if action == SurfaceErrorAction::Reconfigured && self.size.0 > 0 && self.size.1 > 0 {
            self.surface.configure(&self.device, &self.config);
        }
        log::debug!("surface error {err:?}: {action:?}");
        action
    }
}

fn create_surface(
    instance: &wgpu::Instance,
    handle: &SurfaceHandle,
) -> Result<wgpu::Surface<'static>> {
    match handle {
        SurfaceHandle::HostWindow(window) => Ok(instance.create_surface(Arc::clone(window))?),
        SurfaceHandle::NativeWindow(raw) | SurfaceHandle::ViewSurface(raw) => {
            let target = RawTarget::from_raw(*raw)?;
            // SAFETY: the host keeps the drawable alive until `shutdown`, which
            // drops this surface first.
            let surface = unsafe {
                instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::from_window(&target)?)?
            };
            Ok(surface)
        }
        SurfaceHandle::Canvas(id) => bail!("canvas #{id} needs the web build"),
    }
}
