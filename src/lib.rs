/*!
`complex-shaper` drives an external complex-script shaping service through
a harfbuzz-style buffer API.

The service is described by the [`ShapingEngine`] trait and the fonts and rendering
contexts it works with by [`FontResources`]. [`shape`] encodes the buffer as UTF-16,
splits it into script runs, shapes and places every run, maps the glyphs back to
the original clusters and writes them into the same buffer.

Shaping never fails. If the service gives up, the buffer holds one glyph 0 per
character instead and [`GlyphBuffer::is_shaped`] returns `false`.

[`NominalEngine`] together with [`MemoryResources`] is a complete in-process
implementation that maps characters to their nominal glyphs.
*/

#![warn(missing_docs)]

mod buffer;
mod cluster;
mod common;
mod config;
mod encode;
mod engine;
mod face;
mod fallback;
mod itemize;
mod nominal;
mod resources;
mod scratch;
mod shape;
mod tag;

pub use ttf_parser::Tag;

pub use crate::buffer::{GlyphBuffer, GlyphInfo, GlyphPosition, SerializeFlags, UnicodeBuffer};
pub use crate::common::{script, Direction, Feature, Language, Script};
pub use crate::config::ShapeConfig;
pub use crate::engine::{
    CharFlags, EngineError, FeatureRange, GlyphFlags, GlyphOffset, Items, PlaceInput,
    PlaceOutput, RunProps, ScriptAnalysis, ScriptItem, ScriptState, ShapeOutput, ShapingEngine,
};
pub use crate::face::Face;
pub use crate::nominal::{GlyphMetrics, NominalCache, NominalEngine};
pub use crate::resources::{
    FontDescriptor, FontResources, MemoryContext, MemoryFontHandle, MemoryResources,
};
pub use crate::shape::{shape, shape_with_config};
pub use crate::tag::{language_tag, script_tag, DEFAULT_LANGUAGE, DEFAULT_SCRIPT};
