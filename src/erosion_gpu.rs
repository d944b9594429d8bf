//! Optional GPU acceleration for the hydraulic erosion pass, gated behind
//! the `gpu` feature.
//!
//! Grounded in `erosion::gpu::GpuErosionContext`: same device/adapter setup,
//! same storage-buffer-plus-uniform-params bind group layout, same
//! create-pipeline/dispatch/map-and-read lifecycle. The workgroup shape
//! changes from 1D droplet batches to an 8x8 2D grid dispatch because this
//! pass is per-cell rather than per-droplet, and the shader only computes
//! the per-cell erosion delta and steepest-neighbor index; the actual
//! height subtraction and neighbor deposition happen on the CPU once the
//! buffer is read back, exactly mirroring [`crate::erosion::hydraulic_pass`]
//! bit-for-bit arithmetic. This makes the GPU path a non-authoritative
//! accelerator: the CPU path is always correct on its own, and the GPU path
//! is only used when available, never required for correctness.

use bytemuck::{Pod, Zeroable};
use std::borrow::Cow;
use wgpu::util::DeviceExt;

use crate::heightfield::HeightField;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct GpuHydraulicParams {
    width: u32,
    height: u32,
    rain_intensity: f32,
    flow_max: f32,
    _pad: [u32; 0],
}

pub struct GpuHydraulicContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl GpuHydraulicContext {
    /// Build a GPU context, or `None` when no compatible adapter exists.
    pub fn new() -> Option<Self> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> Option<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Hydraulic Erosion GPU"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .ok()?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Hydraulic Erosion Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(HYDRAULIC_SHADER)),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Hydraulic Erosion Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Hydraulic Erosion Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Hydraulic Erosion Compute Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Some(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
        })
    }

    /// Run one hydraulic pass on the GPU: compute the per-cell erosion
    /// delta and steepest-downhill neighbor index, then apply both the
    /// subtraction and the 0.3x deposit on the CPU, identically to
    /// [`crate::erosion`]'s pure-CPU pass.
    pub fn run_pass(
        &self,
        height: &mut HeightField,
        flow: &HeightField,
        river: &HeightField,
        rain_intensity: f32,
    ) {
        let (w, h) = (height.width, height.height);
        let n = w * h;

        let flow_max = flow.as_slice().iter().cloned().fold(0.0f32, f32::max).max(1.0);

        let height_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Height Buffer"),
            contents: bytemuck::cast_slice(height.as_slice()),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let flow_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Flow Buffer"),
            contents: bytemuck::cast_slice(flow.as_slice()),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let river_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("River Buffer"),
            contents: bytemuck::cast_slice(river.as_slice()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let params = GpuHydraulicParams {
            width: w as u32,
            height: h as u32,
            rain_intensity,
            flow_max,
            _pad: [],
        };
        let params_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Hydraulic Params Buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let delta_data = vec![0.0f32; n];
        let delta_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Delta Buffer"),
            contents: bytemuck::cast_slice(&delta_data),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        });

        let steepest_data = vec![u32::MAX; n];
        let steepest_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Steepest Index Buffer"),
            contents: bytemuck::cast_slice(&steepest_data),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Hydraulic Erosion Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: height_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: flow_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: river_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: params_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 4, resource: delta_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 5, resource: steepest_buffer.as_entire_binding() },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Hydraulic Erosion Encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Hydraulic Erosion Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            // 8x8 workgroups over the 2D grid.
            let groups_x = (w as u32 + 7) / 8;
            let groups_y = (h as u32 + 7) / 8;
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        let delta = read_back_f32(&self.device, &self.queue, &delta_buffer, n);
        let steepest = read_back_u32(&self.device, &self.queue, &steepest_buffer, n);

        let mut deposit = vec![0.0f32; n];
        for idx in 0..n {
            let d = delta[idx];
            if d == 0.0 {
                continue;
            }
            let x = idx % w;
            let y = idx / w;
            let cur = height.get(x as i64, y as i64);
            height.set(x, y, cur - d);
            let s = steepest[idx];
            if s != u32::MAX {
                deposit[s as usize] += 0.3 * d;
            }
        }
        for idx in 0..n {
            if deposit[idx] != 0.0 {
                let x = idx % w;
                let y = idx / w;
                let cur = height.get(x as i64, y as i64);
                height.set(x, y, cur + deposit[idx]);
            }
        }
    }
}

fn read_back_f32(device: &wgpu::Device, queue: &wgpu::Queue, buffer: &wgpu::Buffer, n: usize) -> Vec<f32> {
    let size = (n * std::mem::size_of::<f32>()) as u64;
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Staging f32"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |r| {
        let _ = tx.send(r);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv().unwrap().unwrap();
    let data = slice.get_mapped_range();
    let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
    drop(data);
    staging.unmap();
    result
}

fn read_back_u32(device: &wgpu::Device, queue: &wgpu::Queue, buffer: &wgpu::Buffer, n: usize) -> Vec<u32> {
    let size = (n * std::mem::size_of::<u32>()) as u64;
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Staging u32"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |r| {
        let _ = tx.send(r);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv().unwrap().unwrap();
    let data = slice.get_mapped_range();
    let result: Vec<u32> = bytemuck::cast_slice(&data).to_vec();
    drop(data);
    staging.unmap();
    result
}

/// `true` if a compatible adapter exists on this machine.
pub fn is_gpu_available() -> bool {
    GpuHydraulicContext::new().is_some()
}

const HYDRAULIC_SHADER: &str = r#"
struct Params {
    width: u32,
    height: u32,
    rain_intensity: f32,
    flow_max: f32,
}

@group(0) @binding(0) var<storage, read> heightmap: array<f32>;
@group(0) @binding(1) var<storage, read> flow: array<f32>;
@group(0) @binding(2) var<storage, read> river: array<f32>;
@group(0) @binding(3) var<uniform> params: Params;
@group(0) @binding(4) var<storage, read_write> delta: array<f32>;
@group(0) @binding(5) var<storage, read_write> steepest: array<u32>;

fn idx(x: i32, y: i32) -> u32 {
    let cx = clamp(x, 0, i32(params.width) - 1);
    let cy = clamp(y, 0, i32(params.height) - 1);
    return u32(cy) * params.width + u32(cx);
}

@compute @workgroup_size(8, 8, 1)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let x = i32(gid.x);
    let y = i32(gid.y);
    if (gid.x == 0u || gid.y == 0u || gid.x >= params.width - 1u || gid.y >= params.height - 1u) {
        return;
    }

    let hp = heightmap[idx(x, y)];
    let flow_norm = flow[idx(x, y)] / params.flow_max;

    var slope_sum: f32 = 0.0;
    var steepest_drop: f32 = 0.0;
    var steepest_idx: u32 = 0xFFFFFFFFu;

    for (var dy = -1; dy <= 1; dy = dy + 1) {
        for (var dx = -1; dx <= 1; dx = dx + 1) {
            if (dx == 0 && dy == 0) {
                continue;
            }
            let hn = heightmap[idx(x + dx, y + dy)];
            slope_sum = slope_sum + abs(hp - hn);
            let drop = hp - hn;
            if (drop > steepest_drop) {
                steepest_drop = drop;
                steepest_idx = idx(x + dx, y + dy);
            }
        }
    }
    let slope = slope_sum / 8.0;

    let hydro = flow_norm * slope * params.rain_intensity * 0.02;
    let river_v = river[idx(x, y)] * slope * params.rain_intensity * 0.05;
    let total = hydro + river_v;

    delta[idx(x, y)] = total;
    steepest[idx(x, y)] = steepest_idx;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_params_struct_is_plain_old_data() {
        let p = GpuHydraulicParams {
            width: 4,
            height: 4,
            rain_intensity: 0.5,
            flow_max: 1.0,
            _pad: [],
        };
        let bytes = bytemuck::bytes_of(&p);
        assert_eq!(bytes.len(), std::mem::size_of::<GpuHydraulicParams>());
    }
}
