use anyhow::{Context, Result, bail};

use super::error::SurfaceErrorAction;
use super::gpu::Gpu;
use super::init::GpuInit;
use crate::engine::{EngineBoundary, SimulationControl};
use crate::input::{KeyEvent, KeyPhase, PointerEvent, PointerPhase};
use crate::surface::SurfaceHandle;

/// Simulation state of the clear-colour engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearSimulation {
    /// Simulated seconds.
    pub elapsed: f32,
    pub time_scale: f32,
    pub paused: bool,
    pub gravity: f32,
    /// Last pointer position, normalized to the surface.
    pub focus: (f32, f32),
}

impl Default for ClearSimulation {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            time_scale: 1.0,
            paused: false,
            gravity: -9.81,
            focus: (0.5, 0.5),
        }
    }
}

impl ClearSimulation {
    pub fn step(&mut self, delta_time: f32) {
        if !self.paused {
            self.elapsed += delta_time * self.time_scale;
        }
    }

    pub fn apply(&mut self, control: SimulationControl) {
        match control {
            SimulationControl::SetGravity(g) => self.gravity = g,
            SimulationControl::SetTimeScale(s) => self.time_scale = s.max(0.0),
            SimulationControl::SetPaused(p) => self.paused = p,
            SimulationControl::Reset => *self = Self::default(),
        }
    }

    /// Cycles hue over time; stronger gravity cycles faster.
    pub fn color(&self) -> wgpu::Color {
        let speed = 0.1 + self.gravity.abs() / 98.1;
        let phase = f64::from(self.elapsed * speed) * std::f64::consts::TAU;
        let (fx, fy) = (f64::from(self.focus.0), f64::from(self.focus.1));

        wgpu::Color {
            r: 0.5 + 0.5 * phase.sin() * fx,
            g: 0.5 + 0.5 * (phase + 2.0).sin() * fy,
            b: 0.5 + 0.5 * (phase + 4.0).sin(),
            a: 1.0,
        }
    }
}

/// Engine that clears its surface to an animated colour.
///
/// Enough to exercise device creation, resize and the surface error paths
/// without any rendering pipeline.
pub struct ClearColorEngine {
    init: GpuInit,
    gpu: Option<Gpu>,
    sim: ClearSimulation,
}

impl ClearColorEngine {
    pub fn new(init: GpuInit) -> Self {
        Self {
            init,
            gpu: None,
            sim: ClearSimulation::default(),
        }
    }

    pub fn simulation(&self) -> &ClearSimulation {
        &self.sim
    }
}

impl Default for ClearColorEngine {
    fn default() -> Self {
        Self::new(GpuInit::default())
    }
}

impl EngineBoundary for ClearColorEngine {
    fn init(&mut self, surface: &SurfaceHandle, width: u32, height: u32) -> bool {
        if self.gpu.is_some() {
            log::warn!("init while a device is live; replacing it");
        }
        match Gpu::new(surface, width, height, &self.init) {
            Ok(gpu) => {
                self.gpu = Some(gpu);
                true
            }
            Err(e) => {
                log::error!("gpu init failed: {e:#}");
                false
            }
        }
    }

    fn update(&mut self, delta_time: f32) -> Result<()> {
        self.sim.step(delta_time);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let color = self.sim.color();
        let gpu = self.gpu.as_mut().context("render before init")?;

        let mut frame = match gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return match gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Ok(()),
                    SurfaceErrorAction::Fatal => bail!("surface out of memory"),
                };
            }
        };

        {
            let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("physicsfx clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        gpu.submit(frame);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(width, height);
        }
    }

    fn shutdown(&mut self) {
        // Drops the surface before the host tears the window down.
        self.gpu = None;
        self.sim = ClearSimulation::default();
    }

    fn info(&self) -> String {
        match &self.gpu {
            Some(gpu) => {
                let info = gpu.adapter_info();
                format!("clear-colour engine on {} ({:?})", info.name, info.backend)
            }
            None => "clear-colour engine (no device)".to_string(),
        }
    }

    fn pointer(&mut self, event: PointerEvent) {
        if event.phase == PointerPhase::Up {
            return;
        }
        if let Some(gpu) = &self.gpu {
            let (w, h) = gpu.size();
            if w > 0 && h > 0 {
                self.sim.focus = (
                    (event.x / w as f32).clamp(0.0, 1.0),
                    (event.y / h as f32).clamp(0.0, 1.0),
                );
            }
        }
    }

    fn key(&mut self, event: KeyEvent) {
        // Space toggles pause.
        if event.phase == KeyPhase::Down && event.key_code == SPACE {
            self.sim.paused = !self.sim.paused;
        }
    }

    fn control(&mut self, control: SimulationControl) {
        log::debug!("control: {control:?}");
        self.sim.apply(control);
    }
}

const SPACE: u32 = winit::keyboard::KeyCode::Space as u32;
