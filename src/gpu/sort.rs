//! Sort buffer contract and the pluggable GPU sorter capability.
//!
//! The renderer does not know the sorting algorithm. It allocates the
//! buffers described here, fills them from the preprocess pass, and hands
//! the encoder to a [`GpuSorter`]: any multi-pass GPU sort that reads
//! `keys(0)`/`indices(0)` and leaves the index order ascending by key in
//! `indices(1)` satisfies the contract. Pass count,
//! workgroup shape, and scratch usage are the sorter's business; it reads
//! its control inputs from the `SortInfos` block and the indirect dispatch
//! record instead of from the CPU.

use crate::gpu::{buffers, DispatchIndirect, RenderError, RenderResult, SortInfos};
use wgpu::{Buffer, BufferUsages, CommandEncoder, Device};

/// Dispatch granularity the preprocess pass sizes the indirect record for.
/// One sorter workgroup covers this many keys.
pub const SORT_KEYS_PER_WORKGROUP: u32 = 256;

/// Key/index buffer pairs plus sorter control blocks for one point cloud.
///
/// Keys and indices are double-buffered so the sorter can read one slot
/// while writing the reordered result into the other. Slot roles are fixed:
/// the preprocess pass writes fresh keys and identity indices into slot 0
/// each frame, and the sorter must leave its final ordering in slot 1,
/// which is the slot the render pass binds. Keeping the slots distinct
/// means each buffer has exactly one writer per frame; a sorter that
/// finished in slot 0 would have its output overwritten by the next
/// preprocess pass before the draw could observe it.
pub struct SortBuffers {
    num_points: u32,
    padded_size: u32,
    info: Buffer,
    dispatch: Buffer,
    keys: [Buffer; 2],
    indices: [Buffer; 2],
}

impl SortBuffers {
    /// Allocate sort buffers for `num_points` keys, padded to the next
    /// multiple of [`SORT_KEYS_PER_WORKGROUP`].
    ///
    /// Padding keys are pre-filled with `u32::MAX` so they sort behind every
    /// live key and are never drawn. The preprocess pass only ever rewrites
    /// the first `num_points` entries, so the fill survives for the lifetime
    /// of the buffers.
    pub fn new(device: &Device, num_points: u32) -> RenderResult<Self> {
        let padded_size = padded_key_count(num_points);

        let max_binding = device.limits().max_storage_buffer_binding_size as u64;
        let bytes = padded_size as u64 * std::mem::size_of::<u32>() as u64;
        if bytes > max_binding {
            return Err(RenderError::Allocation {
                label: "sort key buffer",
                size: bytes,
                limit: max_binding,
            });
        }

        let info = buffers::create_buffer_init(
            device,
            "sort info buffer",
            &[SortInfos {
                keys_size: 0,
                padded_size,
                ..SortInfos::default()
            }],
            BufferUsages::STORAGE | BufferUsages::COPY_DST | BufferUsages::COPY_SRC,
        );
        let dispatch = buffers::create_buffer_init(
            device,
            "sort dispatch indirect buffer",
            &[DispatchIndirect::default()],
            BufferUsages::STORAGE | BufferUsages::INDIRECT | BufferUsages::COPY_SRC,
        );

        let usage = BufferUsages::STORAGE | BufferUsages::COPY_DST | BufferUsages::COPY_SRC;
        let sentinel_keys = vec![u32::MAX; padded_size as usize];
        let keys = [
            buffers::create_buffer_init(device, "sort keys (ping)", &sentinel_keys, usage),
            buffers::create_buffer_init(device, "sort keys (pong)", &sentinel_keys, usage),
        ];
        // Indices start as an identity ramp so the first frame's draw (which
        // runs before any preprocess output exists) still reads in-range
        // point indices.
        let identity: Vec<u32> = (0..padded_size).collect();
        let indices = [
            buffers::create_buffer_init(device, "sort indices (ping)", &identity, usage),
            buffers::create_buffer_init(device, "sort indices (pong)", &identity, usage),
        ];

        Ok(Self {
            num_points,
            padded_size,
            info,
            dispatch,
            keys,
            indices,
        })
    }

    pub fn num_points(&self) -> u32 {
        self.num_points
    }

    /// Key count including workgroup padding.
    pub fn padded_size(&self) -> u32 {
        self.padded_size
    }

    /// Sorter control block (`SortInfos` layout).
    pub fn info(&self) -> &Buffer {
        &self.info
    }

    /// Indirect workgroup counts, written by the preprocess pass.
    pub fn dispatch(&self) -> &Buffer {
        &self.dispatch
    }

    /// Depth key buffer for ping-pong slot 0 or 1.
    pub fn keys(&self, slot: usize) -> &Buffer {
        &self.keys[slot]
    }

    /// Point index buffer for ping-pong slot 0 or 1.
    pub fn indices(&self, slot: usize) -> &Buffer {
        &self.indices[slot]
    }
}

/// Round `num_points` up to the sorter's workgroup granularity, keeping at
/// least one workgroup so the buffers are never empty.
pub(crate) fn padded_key_count(num_points: u32) -> u32 {
    num_points.div_ceil(SORT_KEYS_PER_WORKGROUP).max(1) * SORT_KEYS_PER_WORKGROUP
}

/// External GPU sorting capability.
///
/// Implementations append whatever passes they need to `encoder` so that
/// afterwards `buffers.indices(1)` holds the point indices ordered
/// ascending by the keys in `buffers.keys(0)`. Slot 0 may be used as
/// read-source or scratch but must not carry the final result; the next
/// preprocess pass rewrites it. The renderer guarantees the buffers exist
/// and are correctly sized before calling this, exactly once per frame,
/// before the preprocess pass refreshes the keys.
pub trait GpuSorter {
    fn sort(&self, encoder: &mut CommandEncoder, buffers: &SortBuffers);
}

/// A sorter that performs no reordering.
///
/// Passes the identity index order the preprocess pass wrote through to
/// the output slot, which is the correct result for a single-point
/// workload and a usable placeholder when draw order does not matter
/// (opaque debugging views, tests).
pub struct IdentitySorter;

impl GpuSorter for IdentitySorter {
    fn sort(&self, encoder: &mut CommandEncoder, buffers: &SortBuffers) {
        let bytes = u64::from(buffers.padded_size()) * std::mem::size_of::<u32>() as u64;
        encoder.copy_buffer_to_buffer(buffers.indices(0), 0, buffers.indices(1), 0, bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_rounds_up_to_workgroup_multiples() {
        assert_eq!(padded_key_count(0), 256);
        assert_eq!(padded_key_count(1), 256);
        assert_eq!(padded_key_count(255), 256);
        assert_eq!(padded_key_count(256), 256);
        assert_eq!(padded_key_count(257), 512);
        assert_eq!(padded_key_count(100_000), 100_096);
    }

    #[test]
    fn padded_count_is_never_zero() {
        // num_points = 0 must still allocate non-empty sort buffers.
        assert!(padded_key_count(0) >= SORT_KEYS_PER_WORKGROUP);
    }
}
