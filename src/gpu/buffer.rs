//! Storage buffers behind a small backend seam.
//!
//! The instance store and the selection subsystem only ever reallocate,
//! write byte ranges, and read back. [`GpuBuffer`] captures exactly that,
//! so both run unchanged against a real wgpu storage buffer
//! ([`DeviceBuffer`]) or an in-memory one ([`HostBuffer`]) in headless
//! tools and tests.

use std::sync::mpsc;

use crate::error::GpuError;

/// Smallest physical allocation. wgpu rejects zero-sized storage
/// bindings, so an empty logical buffer still owns one instance's worth.
pub const MIN_PHYSICAL_SIZE: u64 = 32;

/// A GPU-resident byte buffer with whole and ranged writes.
///
/// Replacing the allocation is split in two: [`GpuBuffer::allocate`] may
/// fail but changes nothing, [`GpuBuffer::install`] cannot fail. Owners of
/// several buffers that must change together allocate all of them first.
///
/// Writes are ordered: a [`GpuBuffer::read_back`] issued after a write
/// observes it.
pub trait GpuBuffer {
    /// A fresh, zeroed allocation not yet in use.
    type Allocation;

    /// Allocate `size` zeroed bytes without touching the current contents.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError`] when the backend refuses the allocation.
    fn allocate(&self, size: u64) -> Result<Self::Allocation, GpuError>;

    /// Replace the current allocation. Bumps [`GpuBuffer::generation`].
    fn install(&mut self, allocation: Self::Allocation);

    /// [`GpuBuffer::allocate`] then [`GpuBuffer::install`].
    ///
    /// # Errors
    ///
    /// Returns [`GpuError`] when the backend refuses the allocation. The
    /// previous allocation is kept in that case.
    fn reallocate(&mut self, size: u64) -> Result<(), GpuError> {
        let allocation = self.allocate(size)?;
        self.install(allocation);
        Ok(())
    }

    /// Write `bytes` at `offset`. The range must lie within
    /// [`GpuBuffer::size`].
    fn write(&mut self, offset: u64, bytes: &[u8]);

    /// Logical size in bytes of the installed allocation.
    fn size(&self) -> u64;

    /// Bumped on every install, so bind groups referencing the old
    /// allocation can be rebuilt.
    fn generation(&self) -> u64;

    /// Blocking copy of the logical contents back to the CPU.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::Readback`] when mapping the staging copy fails.
    fn read_back(&self) -> Result<Vec<u8>, GpuError>;
}

/// Read-only snapshot of a buffer handed to the draw step.
#[derive(Debug)]
pub struct BufferView<'a, B> {
    /// The buffer itself.
    pub buffer: &'a B,
    /// Number of elements (instances or selection words).
    pub count: u32,
    /// [`GpuBuffer::generation`] at snapshot time.
    pub generation: u64,
}

// Copy regardless of `B`; a derive would require `B: Copy`.
impl<B> Clone for BufferView<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for BufferView<'_, B> {}

/// In-memory buffer with the same contract as [`DeviceBuffer`].
#[derive(Debug, Clone, Default)]
pub struct HostBuffer {
    label: String,
    bytes: Vec<u8>,
    limit: Option<u64>,
    generation: u64,
}

impl HostBuffer {
    /// Empty buffer with no size limit.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Empty buffer refusing allocations above `limit` bytes, mirroring a
    /// device's storage binding limit.
    pub fn with_limit(label: impl Into<String>, limit: u64) -> Self {
        Self {
            label: label.into(),
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// The current contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl GpuBuffer for HostBuffer {
    type Allocation = Vec<u8>;

    fn allocate(&self, size: u64) -> Result<Vec<u8>, GpuError> {
        if let Some(limit) = self.limit {
            if size > limit {
                return Err(GpuError::BufferTooLarge {
                    label: self.label.clone(),
                    requested: size,
                    limit,
                });
            }
        }
        let len = usize::try_from(size).map_err(|_| GpuError::Allocation {
            label: self.label.clone(),
            message: format!("{size} bytes does not fit in host memory"),
        })?;
        Ok(vec![0; len])
    }

    fn install(&mut self, allocation: Vec<u8>) {
        self.bytes = allocation;
        self.generation += 1;
    }

    fn write(&mut self, offset: u64, bytes: &[u8]) {
        let start = offset as usize;
        let end = start + bytes.len();
        debug_assert!(end <= self.bytes.len(), "write past end of {}", self.label);
        if let Some(dst) = self.bytes.get_mut(start..end) {
            dst.copy_from_slice(bytes);
        }
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn read_back(&self) -> Result<Vec<u8>, GpuError> {
        Ok(self.bytes.clone())
    }
}

/// A wgpu storage buffer usable as a shader binding and readable back
/// through a staging copy.
pub struct DeviceBuffer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    buffer: wgpu::Buffer,
    label: String,
    size: u64,
    generation: u64,
}

impl DeviceBuffer {
    /// Allocate an empty buffer (physically [`MIN_PHYSICAL_SIZE`] bytes).
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::Allocation`] if the device rejects the buffer.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
    ) -> Result<Self, GpuError> {
        let buffer = create_storage_buffer(device, label, MIN_PHYSICAL_SIZE)?;
        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            buffer,
            label: label.to_owned(),
            size: 0,
            generation: 0,
        })
    }

    /// The underlying wgpu buffer, for bind group creation.
    #[must_use]
    pub fn handle(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

/// A storage buffer allocated by [`DeviceBuffer::allocate`].
pub struct DeviceAllocation {
    buffer: wgpu::Buffer,
    size: u64,
}

impl GpuBuffer for DeviceBuffer {
    type Allocation = DeviceAllocation;

    fn allocate(&self, size: u64) -> Result<DeviceAllocation, GpuError> {
        let limits = self.device.limits();
        let limit = u64::from(limits.max_storage_buffer_binding_size)
            .min(limits.max_buffer_size);
        if size > limit {
            return Err(GpuError::BufferTooLarge {
                label: self.label.clone(),
                requested: size,
                limit,
            });
        }
        let physical = size.max(MIN_PHYSICAL_SIZE).next_multiple_of(4);
        let buffer = create_storage_buffer(&self.device, &self.label, physical)?;
        Ok(DeviceAllocation { buffer, size })
    }

    fn install(&mut self, allocation: DeviceAllocation) {
        self.buffer = allocation.buffer;
        self.size = allocation.size;
        self.generation += 1;
        log::debug!(
            "{}: reallocated to {} bytes (generation {})",
            self.label,
            self.size,
            self.generation
        );
    }

    fn write(&mut self, offset: u64, bytes: &[u8]) {
        debug_assert!(
            offset + bytes.len() as u64 <= self.size,
            "write past end of {}",
            self.label
        );
        if !bytes.is_empty() {
            self.queue.write_buffer(&self.buffer, offset, bytes);
        }
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn read_back(&self) -> Result<Vec<u8>, GpuError> {
        if self.size == 0 {
            return Ok(Vec::new());
        }
        // Copy sizes must be 4-byte aligned; the physical buffer is.
        let copy_size = self.size.next_multiple_of(4);
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Staging Buffer"),
            size: copy_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder =
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Readback Encoder"),
                });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, copy_size);
        let _ = self.queue.submit(std::iter::once(encoder.finish()));

        map_and_copy(&self.device, &staging, self.size)
    }
}

fn create_storage_buffer(
    device: &wgpu::Device,
    label: &str,
    size: u64,
) -> Result<wgpu::Buffer, GpuError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    match validation.or(out_of_memory) {
        Some(error) => Err(GpuError::Allocation {
            label: label.to_owned(),
            message: error.to_string(),
        }),
        None => Ok(buffer),
    }
}

/// Map `staging` for reading, wait for the GPU, and copy out `len` bytes.
///
/// # Errors
///
/// Returns [`GpuError::Readback`] if polling or mapping fails.
pub(crate) fn map_and_copy(
    device: &wgpu::Device,
    staging: &wgpu::Buffer,
    len: u64,
) -> Result<Vec<u8>, GpuError> {
    let slice = staging.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    let _ = device
        .poll(wgpu::PollType::Wait)
        .map_err(|e| GpuError::Readback(e.to_string()))?;

    match receiver.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(GpuError::Readback(e.to_string())),
        Err(e) => return Err(GpuError::Readback(e.to_string())),
    }

    let data = slice.get_mapped_range();
    let out = data.get(..len as usize).map(<[u8]>::to_vec);
    drop(data);
    staging.unmap();
    out.ok_or_else(|| {
        GpuError::Readback(format!("staging buffer shorter than {len} bytes"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_copy_over_non_copy_buffers() {
        fn takes_view(view: BufferView<'_, HostBuffer>) -> u32 {
            view.count
        }
        let buffer = HostBuffer::new("view");
        let view = BufferView {
            buffer: &buffer,
            count: 3,
            generation: 0,
        };
        assert_eq!(takes_view(view), 3);
        assert_eq!(view.count, 3);
    }

    #[test]
    fn host_buffer_reallocation_zeroes_and_bumps_generation() {
        let mut buffer = HostBuffer::new("test");
        buffer.reallocate(8).unwrap();
        buffer.write(4, &[1, 2, 3, 4]);
        assert_eq!(buffer.read_back().unwrap(), vec![0, 0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(buffer.generation(), 1);

        buffer.reallocate(4).unwrap();
        assert_eq!(buffer.bytes(), &[0, 0, 0, 0]);
        assert_eq!(buffer.generation(), 2);
    }

    #[test]
    fn allocation_does_not_touch_installed_contents() {
        let mut buffer = HostBuffer::new("test");
        buffer.reallocate(4).unwrap();
        buffer.write(0, &[9; 4]);
        let pending = buffer.allocate(12).unwrap();
        assert_eq!(buffer.bytes(), &[9; 4]);
        buffer.install(pending);
        assert_eq!(buffer.size(), 12);
        assert!(buffer.bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn host_buffer_limit_is_a_hard_failure() {
        let mut buffer = HostBuffer::with_limit("small", 16);
        buffer.reallocate(16).unwrap();
        buffer.write(0, &[7; 16]);
        let err = buffer.reallocate(17).unwrap_err();
        assert_eq!(
            err,
            GpuError::BufferTooLarge {
                label: "small".into(),
                requested: 17,
                limit: 16,
            }
        );
        // Old allocation survives a refused one.
        assert_eq!(buffer.size(), 16);
        assert_eq!(buffer.bytes()[0], 7);
    }
}
