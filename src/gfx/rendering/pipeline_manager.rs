//! Named render pipelines built from registered configurations
//!
//! Shaders are compiled once under a name; pipelines are described by a
//! [`PipelineConfig`] and built up front with
//! [`PipelineManager::create_all_pipelines`], or on first use.

use std::{collections::HashMap, sync::Arc};

use log::{debug, error};
use wgpu::*;

use crate::{
    error::{Result, ViewerError},
    gfx::scene::vertex::Vertex3D,
};

/// Everything needed to build a pipeline over [`Vertex3D`] meshes
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    /// In group order
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub color_format: TextureFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Pipeline".to_string(),
            shader: "scene".to_string(),
            bind_group_layouts: Vec::new(),
            cull_mode: Some(Face::Back),
            depth_format: None,
            color_format: TextureFormat::Bgra8Unorm,
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_shader(mut self, shader: &str) -> Self {
        self.shader = shader.to_owned();
        self
    }

    /// `None` draws both faces
    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// Enables depth testing against a buffer of `format`
    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_format = format;
        self
    }
}

pub struct PipelineManager {
    device: Arc<Device>,
    shaders: HashMap<String, ShaderModule>,
    configs: HashMap<String, PipelineConfig>,
    pipelines: HashMap<String, RenderPipeline>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            shaders: HashMap::new(),
            configs: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    /// Compiles a WGSL module under `name`
    pub fn load_shader(&mut self, name: &str, source: &str) {
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shaders.insert(name.to_owned(), module);
    }

    /// Registers (or replaces) a pipeline description; building is deferred
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipelines.remove(name);
        self.configs.insert(name.to_owned(), config);
    }

    /// Builds every registered pipeline not built yet.
    ///
    /// Failures are collected so one bad pipeline does not hide the others.
    pub fn create_all_pipelines(&mut self) -> std::result::Result<(), Vec<String>> {
        let pending: Vec<String> = self
            .configs
            .keys()
            .filter(|name| !self.pipelines.contains_key(*name))
            .cloned()
            .collect();

        let mut errors = Vec::new();
        for name in pending {
            let built = match self.configs.get(&name) {
                Some(config) => self.build(config),
                None => continue,
            };
            match built {
                Ok(pipeline) => {
                    debug!("created pipeline '{}'", name);
                    self.pipelines.insert(name, pipeline);
                }
                Err(e) => errors.push(format!("pipeline '{}': {}", name, e)),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The pipeline registered as `name`, built on first request
    pub fn get_pipeline(&mut self, name: &str) -> Option<&RenderPipeline> {
        if !self.pipelines.contains_key(name) {
            let config = self.configs.get(name)?;
            match self.build(config) {
                Ok(pipeline) => {
                    self.pipelines.insert(name.to_owned(), pipeline);
                }
                Err(e) => {
                    error!("failed to create pipeline '{}': {}", name, e);
                    return None;
                }
            }
        }
        self.pipelines.get(name)
    }

    fn build(&self, config: &PipelineConfig) -> Result<RenderPipeline> {
        let shader = self
            .shaders
            .get(&config.shader)
            .ok_or_else(|| ViewerError::MissingShader(config.shader.clone()))?;

        let layouts: Vec<&BindGroupLayout> = config.bind_group_layouts.iter().collect();
        let layout = self.device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(&format!("{} layout", config.label)),
            bind_group_layouts: &layouts,
            push_constant_ranges: &[],
        });

        let color_targets = [Some(ColorTargetState {
            format: config.color_format,
            blend: Some(BlendState::REPLACE),
            write_mask: ColorWrites::ALL,
        })];

        Ok(self.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&config.label),
            layout: Some(&layout),
            vertex: VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3D::desc()],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &color_targets,
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                front_face: FrontFace::Ccw,
                cull_mode: config.cull_mode,
                ..Default::default()
            },
            depth_stencil: config.depth_format.map(|format| DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        }))
    }
}
