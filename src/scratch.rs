use core::mem::{align_of, size_of};

use crate::engine::{CharFlags, GlyphFlags, GlyphOffset};

/// Bytes needed by a single glyph slot across all per-glyph arrays:
/// advance, offset, visual cluster, glyph and glyph props.
pub const GLYPH_SLOT_SIZE: usize = size_of::<i32>()
    + size_of::<GlyphOffset>()
    + size_of::<u32>()
    + size_of::<u16>()
    + size_of::<GlyphFlags>();

/// Hands out typed, non-overlapping slices of a byte region.
pub struct ScratchArena<'a> {
    bytes: &'a mut [u8],
}

impl<'a> ScratchArena<'a> {
    #[inline]
    pub fn new(bytes: &'a mut [u8]) -> Self {
        ScratchArena { bytes }
    }

    /// Bytes left, minus what is needed to align the next array of `T`.
    pub fn remaining<T>(&self) -> usize {
        match self.padding::<T>() {
            Some(pad) => self.bytes.len().saturating_sub(pad),
            None => 0,
        }
    }

    fn padding<T>(&self) -> Option<usize> {
        let pad = self.bytes.as_ptr().align_offset(align_of::<T>());
        (pad != usize::MAX).then_some(pad)
    }

    /// Takes an array of `len` elements from the front of the region.
    ///
    /// Returns `None` when it doesn't fit. Contents are whatever the region held.
    pub fn alloc<T: bytemuck::Pod>(&mut self, len: usize) -> Option<&'a mut [T]> {
        let pad = self.padding::<T>()?;
        let size = len.checked_mul(size_of::<T>())?;
        if pad.checked_add(size)? > self.bytes.len() {
            return None;
        }

        let bytes = core::mem::take(&mut self.bytes);
        let (_, bytes) = bytes.split_at_mut(pad);
        let (head, tail) = bytes.split_at_mut(size);
        self.bytes = tail;
        bytemuck::try_cast_slice_mut(head).ok()
    }
}

/// The working memory of a single shaping attempt.
pub struct Scratch<'a> {
    /// UTF-16 text, one entry per code unit.
    pub units: &'a mut [u16],
    /// Per code unit, the first glyph of its cluster.
    pub log_clusters: &'a mut [u16],
    pub char_props: &'a mut [CharFlags],

    pub advances: &'a mut [i32],
    pub offsets: &'a mut [GlyphOffset],
    pub vis_clusters: &'a mut [u32],
    pub glyphs: &'a mut [u16],
    pub glyph_props: &'a mut [GlyphFlags],
}

impl<'a> Scratch<'a> {
    /// Carves `bytes` into per-unit arrays of `units_len` entries and
    /// as many glyph slots as the rest of the region can hold.
    ///
    /// Returns `None` when not even the per-unit arrays fit.
    pub fn partition(bytes: &'a mut [u8], units_len: usize) -> Option<Self> {
        let mut arena = ScratchArena::new(bytes);

        let units = arena.alloc::<u16>(units_len)?;
        let log_clusters = arena.alloc::<u16>(units_len)?;
        let char_props = arena.alloc::<CharFlags>(units_len)?;

        // Four byte aligned arrays go first, so the two byte ones need no padding.
        let glyphs_size = arena.remaining::<i32>() / GLYPH_SLOT_SIZE;

        Some(Scratch {
            units,
            log_clusters,
            char_props,
            advances: arena.alloc(glyphs_size)?,
            offsets: arena.alloc(glyphs_size)?,
            vis_clusters: arena.alloc(glyphs_size)?,
            glyphs: arena.alloc(glyphs_size)?,
            glyph_props: arena.alloc(glyphs_size)?,
        })
    }

    /// Number of glyph slots.
    #[inline]
    pub fn glyphs_size(&self) -> usize {
        self.glyphs.len()
    }
}
