//! A shaping engine that maps characters to their nominal glyphs.
//!
//! No substitution and no positioning beyond advances. Useful as a reference
//! implementation of [`ShapingEngine`] and for text that needs no shaping at all.

use std::collections::HashMap;

use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};
use unicode_script::UnicodeScript;

use crate::common::{script, Direction, Script};
use crate::engine::*;
use crate::resources::MemoryContext;
use crate::tag;
use crate::Tag;

/// Glyph lookup and metrics of a font.
pub trait GlyphMetrics {
    /// Returns the nominal glyph of a character.
    fn glyph_index(&self, c: char) -> Option<u16>;

    /// Returns the horizontal advance of a glyph in font units.
    fn glyph_advance(&self, glyph: u16) -> Option<u16>;
}

impl GlyphMetrics for ttf_parser::Face<'_> {
    #[inline]
    fn glyph_index(&self, c: char) -> Option<u16> {
        ttf_parser::Face::glyph_index(self, c).map(|g| g.0)
    }

    #[inline]
    fn glyph_advance(&self, glyph: u16) -> Option<u16> {
        self.glyph_hor_advance(ttf_parser::GlyphId(glyph))
    }
}

impl<T: GlyphMetrics + ?Sized> GlyphMetrics for &T {
    #[inline]
    fn glyph_index(&self, c: char) -> Option<u16> {
        (**self).glyph_index(c)
    }

    #[inline]
    fn glyph_advance(&self, glyph: u16) -> Option<u16> {
        (**self).glyph_advance(glyph)
    }
}

/// Advances looked up during a single shaping call.
#[derive(Default, Debug)]
pub struct NominalCache {
    advances: HashMap<u16, i32>,
}

/// An engine that performs one-to-one character to glyph mapping.
///
/// Glyphs are emitted in logical order, right-to-left runs included.
/// Draws from a [`MemoryContext`], so it pairs with
/// [`MemoryResources`](crate::MemoryResources).
#[derive(Clone, Debug)]
pub struct NominalEngine<M> {
    metrics: M,
}

impl<M: GlyphMetrics> NominalEngine<M> {
    /// Creates a new engine on top of font metrics.
    #[inline]
    pub fn new(metrics: M) -> Self {
        NominalEngine { metrics }
    }

    /// Returns the underlying metrics.
    #[inline]
    pub fn metrics(&self) -> &M {
        &self.metrics
    }
}

impl<M: GlyphMetrics> ShapingEngine for NominalEngine<M> {
    type Context = MemoryContext;
    type Cache = NominalCache;

    fn itemize(
        &mut self,
        units: &[u16],
        max_items: usize,
        state: &ScriptState,
    ) -> Result<Items, EngineError> {
        if units.is_empty() {
            return Err(EngineError::InvalidArgument);
        }

        let mut items = Items::new();
        let mut current: Option<Script> = None;
        for (pos, _, c) in Chars::new(units) {
            let script = Script::from(c.script());
            let joins = script == script::COMMON
                || script == script::INHERITED
                || script == script::UNKNOWN;

            if items.is_empty() {
                items.push(item(pos, None, state));
            }

            if joins || current == Some(script) {
                continue;
            }

            if current.is_some() {
                items.push(item(pos, Some(script), state));
            } else if let Some(first) = items.last_mut() {
                // Leading neutral characters take the first real script.
                *first = item(first.char_pos, Some(script), state);
            }

            current = Some(script);
        }

        if items.len() > max_items {
            return Err(EngineError::TooManyItems);
        }

        items.push(ScriptItem::terminator(units.len()));
        Ok(items)
    }

    fn shape(
        &mut self,
        _: &mut MemoryContext,
        _: &mut NominalCache,
        analysis: &mut ScriptAnalysis,
        _: &RunProps,
        units: &[u16],
        output: ShapeOutput,
    ) -> Result<usize, EngineError> {
        let mut len = 0;
        let mut cluster_start = 0;
        for (pos, unit_len, c) in Chars::new(units) {
            let c = if analysis.is_rtl() {
                unicode_bidi_mirroring::get_mirrored(c).unwrap_or(c)
            } else {
                c
            };

            if len == output.glyphs.len() {
                return Err(EngineError::OutOfMemory);
            }

            let unit_range = pos..pos + unit_len;
            if is_mark(c) && len > 0 {
                output.glyph_props[len] = GlyphFlags::DIACRITIC | GlyphFlags::ZERO_WIDTH;
                output.char_props[unit_range.clone()].fill(CharFlags::empty());
            } else {
                cluster_start = len;
                output.glyph_props[len] = GlyphFlags::CLUSTER_START;
                output.char_props[unit_range.clone()].fill(CharFlags::CAN_GLYPH_ALONE);
            }

            let cluster =
                u16::try_from(cluster_start).map_err(|_| EngineError::InvalidArgument)?;
            output.log_clusters[unit_range].fill(cluster);
            output.glyphs[len] = self.metrics.glyph_index(c).unwrap_or(0);
            len += 1;
        }

        Ok(len)
    }

    fn place(
        &mut self,
        context: &mut MemoryContext,
        cache: &mut NominalCache,
        _: &ScriptAnalysis,
        _: &RunProps,
        input: PlaceInput,
        output: PlaceOutput,
    ) -> Result<(), EngineError> {
        if context.font().is_none() {
            return Err(EngineError::InvalidArgument);
        }

        let iter = input.glyphs.iter().zip(input.glyph_props);
        for (i, (&glyph, props)) in iter.enumerate() {
            output.advances[i] = if props.contains(GlyphFlags::ZERO_WIDTH) {
                0
            } else {
                let metrics = &self.metrics;
                *cache
                    .advances
                    .entry(glyph)
                    .or_insert_with(|| metrics.glyph_advance(glyph).map_or(0, i32::from))
            };
            output.offsets[i] = GlyphOffset::default();
        }

        Ok(())
    }
}

fn item(char_pos: usize, script: Option<Script>, state: &ScriptState) -> ScriptItem {
    let bidi_level = match script {
        Some(script) if !state.override_direction => {
            let rtl = Direction::from_script(script)
                .map_or(false, |dir| !dir.is_forward());
            u8::from(rtl)
        }
        _ => state.bidi_level,
    };

    ScriptItem {
        char_pos,
        analysis: ScriptAnalysis {
            bidi_level,
            no_glyph_index: false,
        },
        script_tag: script.map_or(Tag(0), tag::script_tag),
    }
}

fn is_mark(c: char) -> bool {
    matches!(
        c.general_category(),
        GeneralCategory::NonspacingMark
            | GeneralCategory::SpacingMark
            | GeneralCategory::EnclosingMark
    )
}

/// Decodes UTF-16 yielding `(offset, units, char)`.
///
/// Unpaired surrogates become U+FFFD.
struct Chars<'a> {
    units: &'a [u16],
    pos: usize,
}

impl<'a> Chars<'a> {
    fn new(units: &'a [u16]) -> Self {
        Chars { units, pos: 0 }
    }
}

impl Iterator for Chars<'_> {
    type Item = (usize, usize, char);

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.pos;
        let first = *self.units.get(pos)?;
        let second = self.units.get(pos + 1).copied();

        let (len, c) = match char::decode_utf16([first].into_iter().chain(second)).next() {
            Some(Ok(c)) => (c.len_utf16(), c),
            _ => (1, char::REPLACEMENT_CHARACTER),
        };

        self.pos += len;
        Some((pos, len, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{FontDescriptor, FontResources, MemoryResources};

    struct Toy;

    impl GlyphMetrics for Toy {
        fn glyph_index(&self, c: char) -> Option<u16> {
            match c {
                'a'..='z' => Some(c as u16 - 'a' as u16 + 1),
                '(' => Some(40),
                ')' => Some(41),
                _ => None,
            }
        }

        fn glyph_advance(&self, glyph: u16) -> Option<u16> {
            Some(glyph * 10)
        }
    }

    const LTR: ScriptState = ScriptState {
        bidi_level: 0,
        override_direction: true,
    };

    fn run_props() -> RunProps<'static> {
        RunProps {
            script: Tag::from_bytes(b"latn"),
            language: tag::DEFAULT_LANGUAGE,
            features: &[],
        }
    }

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    struct Shaped {
        glyphs: Vec<u16>,
        props: Vec<GlyphFlags>,
        log_clusters: Vec<u16>,
    }

    fn shape(s: &str, bidi_level: u8, slots: usize) -> Result<Shaped, EngineError> {
        let units = utf16(s);
        let mut engine = NominalEngine::new(Toy);
        let mut analysis = ScriptAnalysis { bidi_level, no_glyph_index: false };
        let mut log_clusters = vec![0; units.len()];
        let mut char_props = vec![CharFlags::empty(); units.len()];
        let mut glyphs = vec![0; slots];
        let mut props = vec![GlyphFlags::empty(); slots];
        let mut context = MemoryResources::new().acquire_context().unwrap();
        let len = engine.shape(
            &mut context,
            &mut NominalCache::default(),
            &mut analysis,
            &run_props(),
            &units,
            ShapeOutput {
                log_clusters: &mut log_clusters,
                char_props: &mut char_props,
                glyphs: &mut glyphs,
                glyph_props: &mut props,
            },
        )?;
        glyphs.truncate(len);
        props.truncate(len);
        Ok(Shaped { glyphs, props, log_clusters })
    }

    #[test]
    fn decode() {
        let units = [0x61, 0xD83D, 0xDE00, 0xDC00, 0x62, 0xD800];
        let chars: Vec<_> = Chars::new(&units).collect();
        assert_eq!(
            chars,
            vec![
                (0, 1, 'a'),
                (1, 2, '😀'),
                (3, 1, char::REPLACEMENT_CHARACTER),
                (4, 1, 'b'),
                (5, 1, char::REPLACEMENT_CHARACTER),
            ]
        );
    }

    #[test]
    fn itemize_by_script() {
        let mut engine = NominalEngine::new(Toy);
        let units = utf16("ab cd אב!");
        let items = engine.itemize(&units, 10, &LTR).unwrap();
        let starts: Vec<usize> = items.iter().map(|i| i.char_pos).collect();
        assert_eq!(starts, vec![0, 6, 9]);
        assert_eq!(items[0].script_tag, Tag::from_bytes(b"latn"));
        assert_eq!(items[1].script_tag, Tag::from_bytes(b"hebr"));
        assert!(items[2].script_tag.is_null());
    }

    #[test]
    fn itemize_neutral_text() {
        let mut engine = NominalEngine::new(Toy);
        let items = engine.itemize(&utf16("1, 2"), 10, &LTR).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].script_tag.is_null());

        // Leading neutrals join the first run.
        let items = engine.itemize(&utf16("(ab)"), 10, &LTR).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].char_pos, 0);
        assert_eq!(items[0].script_tag, Tag::from_bytes(b"latn"));
    }

    #[test]
    fn itemize_levels() {
        let mut engine = NominalEngine::new(Toy);
        let rtl = ScriptState { bidi_level: 1, override_direction: true };
        let items = engine.itemize(&utf16("ab"), 10, &rtl).unwrap();
        assert!(items[0].analysis.is_rtl());

        let natural = ScriptState { bidi_level: 0, override_direction: false };
        let items = engine.itemize(&utf16("abאב"), 10, &natural).unwrap();
        assert!(!items[0].analysis.is_rtl());
        assert!(items[1].analysis.is_rtl());
    }

    #[test]
    fn itemize_errors() {
        let mut engine = NominalEngine::new(Toy);
        assert_eq!(engine.itemize(&[], 10, &LTR), Err(EngineError::InvalidArgument));
        assert_eq!(
            engine.itemize(&utf16("aאbב"), 3, &LTR),
            Err(EngineError::TooManyItems)
        );
        assert_eq!(engine.itemize(&utf16("aאbב"), 4, &LTR).map(|i| i.len()), Ok(5));
    }

    #[test]
    fn nominal_glyphs() {
        let shaped = shape("abz", 0, 8).unwrap();
        assert_eq!(shaped.glyphs, vec![1, 2, 26]);
        assert_eq!(shaped.log_clusters, vec![0, 1, 2]);
        assert!(shaped.props.iter().all(|p| *p == GlyphFlags::CLUSTER_START));
    }

    #[test]
    fn missing_glyphs_are_zero() {
        let shaped = shape("a😀", 0, 8).unwrap();
        assert_eq!(shaped.glyphs, vec![1, 0]);
        // Both units of the pair point at the same glyph.
        assert_eq!(shaped.log_clusters, vec![0, 1, 1]);
    }

    #[test]
    fn marks_attach() {
        let shaped = shape("a\u{301}\u{302}b", 0, 8).unwrap();
        assert_eq!(shaped.glyphs.len(), 4);
        assert_eq!(shaped.log_clusters, vec![0, 0, 0, 3]);
        assert_eq!(shaped.props[0], GlyphFlags::CLUSTER_START);
        assert!(shaped.props[1].contains(GlyphFlags::DIACRITIC));
        assert!(!shaped.props[2].contains(GlyphFlags::CLUSTER_START));
        assert_eq!(shaped.props[3], GlyphFlags::CLUSTER_START);

        // Nothing to attach to.
        let shaped = shape("\u{301}a", 0, 8).unwrap();
        assert_eq!(shaped.props[0], GlyphFlags::CLUSTER_START);
    }

    #[test]
    fn mirroring() {
        assert_eq!(shape("(a)", 0, 8).unwrap().glyphs, vec![40, 1, 41]);
        assert_eq!(shape("(a)", 1, 8).unwrap().glyphs, vec![41, 1, 40]);
    }

    #[test]
    fn out_of_memory() {
        assert_eq!(shape("abc", 0, 2).err(), Some(EngineError::OutOfMemory));
        assert!(shape("abc", 0, 3).is_ok());
    }

    fn place(
        engine: &mut NominalEngine<Toy>,
        context: &mut MemoryContext,
        cache: &mut NominalCache,
        advances: &mut [i32],
        offsets: &mut [GlyphOffset],
    ) -> Result<(), EngineError> {
        let props = [
            GlyphFlags::CLUSTER_START,
            GlyphFlags::DIACRITIC | GlyphFlags::ZERO_WIDTH,
            GlyphFlags::CLUSTER_START,
        ];
        engine.place(
            context,
            cache,
            &ScriptAnalysis::default(),
            &run_props(),
            PlaceInput {
                units: &[0x61, 0x301, 0x61],
                log_clusters: &[0, 0, 2],
                char_props: &[CharFlags::CAN_GLYPH_ALONE; 3],
                glyphs: &[1, 2, 1],
                glyph_props: &props,
            },
            PlaceOutput { advances, offsets },
        )
    }

    #[test]
    fn advances() {
        let mut engine = NominalEngine::new(Toy);
        let mut resources = MemoryResources::new();
        let mut context = resources.acquire_context().unwrap();
        let mut cache = NominalCache::default();
        let mut advances = [0; 3];
        let mut offsets = [GlyphOffset { du: 5, dv: 5 }; 3];

        // No logical font selected.
        assert_eq!(
            place(&mut engine, &mut context, &mut cache, &mut advances, &mut offsets),
            Err(EngineError::InvalidArgument)
        );

        let descriptor = FontDescriptor { height: 1000, face_name: String::new() };
        let font = resources.create_font(&mut context, &descriptor).unwrap();
        place(&mut engine, &mut context, &mut cache, &mut advances, &mut offsets).unwrap();
        assert_eq!(advances, [10, 0, 10]);
        assert_eq!(offsets, [GlyphOffset::default(); 3]);
        assert_eq!(cache.advances.len(), 1);

        resources.delete_font(font);
        resources.release_context(context);
        assert_eq!(resources.outstanding(), 0);
    }
}
