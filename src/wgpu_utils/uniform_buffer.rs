use std::marker::PhantomData;

/// Typed uniform buffer that skips redundant uploads
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    last_upload: Vec<u8>,
    content_type: PhantomData<Content>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    /// Creates the buffer already holding `initial_content`
    pub fn new_with_data(device: &wgpu::Device, initial_content: &Content) -> Self {
        let bytes = bytemuck::bytes_of(initial_content);
        let short_name = std::any::type_name::<Content>()
            .rsplit("::")
            .next()
            .unwrap_or("uniform");

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} buffer", short_name)),
            size: bytes.len() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: true,
        });
        buffer.slice(..).get_mapped_range_mut().copy_from_slice(bytes);
        buffer.unmap();

        Self {
            buffer,
            last_upload: bytes.to_vec(),
            content_type: PhantomData,
        }
    }

    /// Writes `content` unless it is byte-identical to the last upload
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let bytes = bytemuck::bytes_of(&content);
        if self.last_upload.as_slice() != bytes {
            queue.write_buffer(&self.buffer, 0, bytes);
            self.last_upload.clear();
            self.last_upload.extend_from_slice(bytes);
        }
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}
