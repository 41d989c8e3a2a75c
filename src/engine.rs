//! The interface of a complex-script shaping service.
//!
//! A service splits UTF-16 text into script runs, turns every run into glyphs
//! and positions those glyphs. The crate never looks inside; it only adapts
//! its own buffer to this contract and back.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::common::Feature;
use crate::Tag;

/// A list of script items, as returned by [`ShapingEngine::itemize`].
pub type Items = SmallVec<[ScriptItem; 16]>;

/// A status reported by a shaping service.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum EngineError {
    /// The output arrays are too small.
    ///
    /// This is the only status the caller recovers from, by retrying with more room.
    #[error("not enough room for the output")]
    OutOfMemory,
    /// Itemization produced more runs than allowed.
    #[error("too many items")]
    TooManyItems,
    /// The input was rejected.
    #[error("invalid argument")]
    InvalidArgument,
    /// Any other service-defined failure.
    #[error("failed with status {0}")]
    Failed(i32),
}

/// The initial bidi state of the itemizer.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct ScriptState {
    /// The embedding level the text starts with.
    pub bidi_level: u8,
    /// Ignore directional marks embedded in the text and use `bidi_level` as is.
    pub override_direction: bool,
}

/// Per-run analysis, produced by itemization and passed back to shaping and placement.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct ScriptAnalysis {
    /// The resolved embedding level of the run. Odd levels are right-to-left.
    pub bidi_level: u8,
    /// Set by the service when it could not produce glyph indices for the run.
    pub no_glyph_index: bool,
}

impl ScriptAnalysis {
    /// Checks that the run is right-to-left.
    #[inline]
    pub fn is_rtl(&self) -> bool {
        self.bidi_level & 1 == 1
    }
}

/// A script run.
///
/// Itemization always returns one more item than the number of runs:
/// the last one only marks where the final run ends.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScriptItem {
    /// Offset of the run's first code unit.
    pub char_pos: usize,
    /// The run analysis.
    pub analysis: ScriptAnalysis,
    /// OpenType script tag of the run. Can be null when the service has no opinion.
    pub script_tag: Tag,
}

impl ScriptItem {
    /// Creates the item that terminates a list of runs.
    pub fn terminator(char_pos: usize) -> Self {
        ScriptItem {
            char_pos,
            analysis: ScriptAnalysis::default(),
            script_tag: Tag(0),
        }
    }
}

/// Per-glyph visual attributes.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct GlyphFlags(u16);

bitflags! {
    impl GlyphFlags: u16 {
        /// The glyph is the first glyph of its cluster.
        const CLUSTER_START = 1 << 0;
        /// The glyph is a combining mark.
        const DIACRITIC     = 1 << 1;
        /// The glyph must not take any room.
        const ZERO_WIDTH    = 1 << 2;
    }
}

unsafe impl bytemuck::Zeroable for GlyphFlags {}
unsafe impl bytemuck::Pod for GlyphFlags {}

/// Per-character shaping attributes.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct CharFlags(u16);

bitflags! {
    impl CharFlags: u16 {
        /// The character can be rendered with a glyph of its own.
        const CAN_GLYPH_ALONE = 1 << 0;
    }
}

unsafe impl bytemuck::Zeroable for CharFlags {}
unsafe impl bytemuck::Pod for CharFlags {}

/// A glyph offset, in device units.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct GlyphOffset {
    /// Horizontal offset.
    pub du: i32,
    /// Vertical offset.
    pub dv: i32,
}

unsafe impl bytemuck::Zeroable for GlyphOffset {}
unsafe impl bytemuck::Pod for GlyphOffset {}

/// A span of characters that shares a set of feature overrides.
#[derive(Clone, Copy, Debug)]
pub struct FeatureRange<'a> {
    /// Number of code units the range covers.
    pub len: usize,
    /// Features enabled for this range.
    pub features: &'a [Feature],
}

/// Properties shared by shaping and placement of a single run.
#[derive(Clone, Copy, Debug)]
pub struct RunProps<'a> {
    /// OpenType script tag.
    pub script: Tag,
    /// OpenType language system tag.
    pub language: Tag,
    /// Feature overrides. Empty when none are requested.
    pub features: &'a [FeatureRange<'a>],
}

/// Output arrays of [`ShapingEngine::shape`].
///
/// `log_clusters` and `char_props` hold exactly one entry per input code unit,
/// the glyph arrays hold the remaining glyph room.
#[derive(Debug)]
pub struct ShapeOutput<'a> {
    /// For every code unit, the run-local index of the first glyph of its cluster.
    pub log_clusters: &'a mut [u16],
    /// Per code unit attributes.
    pub char_props: &'a mut [CharFlags],
    /// Glyph indices.
    pub glyphs: &'a mut [u16],
    /// Per glyph attributes.
    pub glyph_props: &'a mut [GlyphFlags],
}

/// The run data [`ShapingEngine::place`] works on.
#[derive(Clone, Copy, Debug)]
pub struct PlaceInput<'a> {
    /// The run's code units.
    pub units: &'a [u16],
    /// As produced by shaping.
    pub log_clusters: &'a [u16],
    /// As produced by shaping.
    pub char_props: &'a [CharFlags],
    /// As produced by shaping, exactly one entry per glyph.
    pub glyphs: &'a [u16],
    /// As produced by shaping, exactly one entry per glyph.
    pub glyph_props: &'a [GlyphFlags],
}

/// Output arrays of [`ShapingEngine::place`], exactly one entry per glyph.
#[derive(Debug)]
pub struct PlaceOutput<'a> {
    /// Horizontal advances.
    pub advances: &'a mut [i32],
    /// Glyph offsets.
    pub offsets: &'a mut [GlyphOffset],
}

/// A complex-script shaping service.
pub trait ShapingEngine {
    /// The rendering context the service draws font data from.
    ///
    /// Provided by a [`FontResources`](crate::FontResources) implementation.
    type Context;

    /// Data the service caches between runs of a single shaping call.
    type Cache: Default;

    /// Splits UTF-16 text into script runs.
    ///
    /// Returns the runs followed by a terminator item whose `char_pos` is `units.len()`.
    /// Must fail with [`EngineError::TooManyItems`] instead of returning
    /// more than `max_items` runs.
    fn itemize(
        &mut self,
        units: &[u16],
        max_items: usize,
        state: &ScriptState,
    ) -> Result<Items, EngineError>;

    /// Converts a single run into glyphs.
    ///
    /// Returns the number of glyphs written. Must fail with [`EngineError::OutOfMemory`]
    /// when `output.glyphs` cannot hold them. May set `analysis.no_glyph_index`.
    fn shape(
        &mut self,
        context: &mut Self::Context,
        cache: &mut Self::Cache,
        analysis: &mut ScriptAnalysis,
        props: &RunProps,
        units: &[u16],
        output: ShapeOutput,
    ) -> Result<usize, EngineError>;

    /// Positions glyphs produced by [`shape`](Self::shape).
    fn place(
        &mut self,
        context: &mut Self::Context,
        cache: &mut Self::Cache,
        analysis: &ScriptAnalysis,
        props: &RunProps,
        input: PlaceInput,
        output: PlaceOutput,
    ) -> Result<(), EngineError>;
}
