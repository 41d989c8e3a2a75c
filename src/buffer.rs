use bitflags::bitflags;
use unicode_script::UnicodeScript;

use crate::common::{script, Direction, Language, Script};

const MAX_LEN_FACTOR: usize = 32;
const MAX_LEN_MIN: usize = 8192;
// Shaping more than a billion chars? Let us know!
const MAX_LEN_DEFAULT: usize = 0x3FFF_FFFF;

/// `GlyphPosition` is the structure that holds the positions of the glyph in
/// both horizontal and vertical directions. All positions in `GlyphPosition`
/// are relative to the current point.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct GlyphPosition {
    /// How much the line advances after drawing this glyph when setting text in
    /// horizontal direction.
    pub x_advance: i32,
    /// How much the line advances after drawing this glyph when setting text in
    /// vertical direction.
    pub y_advance: i32,
    /// How much the glyph moves on the X-axis before drawing it, this should not
    /// affect how much the line advances.
    pub x_offset: i32,
    /// How much the glyph moves on the Y-axis before drawing it, this should
    /// not affect how much the line advances.
    pub y_offset: i32,
    var: u32,
}

unsafe impl bytemuck::Zeroable for GlyphPosition {}
unsafe impl bytemuck::Pod for GlyphPosition {}

/// A glyph info.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct GlyphInfo {
    // NOTE: Stores a Unicode codepoint before shaping and a glyph ID after.
    /// A selected glyph.
    ///
    /// Guarantee to be <= `u16::MAX`.
    pub glyph_id: u32,
    pub(crate) mask: u32,
    /// An index to the start of the grapheme cluster in the original string.
    pub cluster: u32,
    pub(crate) var1: u32,
    pub(crate) var2: u32,
}

unsafe impl bytemuck::Zeroable for GlyphInfo {}
unsafe impl bytemuck::Pod for GlyphInfo {}

impl GlyphInfo {
    /// Offset of the item's first UTF-16 code unit. Only valid during shaping.
    #[inline]
    pub(crate) fn utf16_index(&self) -> u32 {
        self.var1
    }

    #[inline]
    pub(crate) fn set_utf16_index(&mut self, index: u32) {
        self.var1 = index;
    }

    #[inline]
    pub(crate) fn as_char(&self) -> char {
        char::from_u32(self.glyph_id).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

pub(crate) struct Buffer {
    // Information about how the text in the buffer should be treated.
    pub direction: Direction,
    pub script: Option<Script>,
    pub language: Option<Language>,

    pub successful: bool,
    pub shaped: bool,
    pub max_len: usize,

    pub len: usize,
    pub allocated: usize,
    pub info: Vec<GlyphInfo>,
    pub pos: Vec<GlyphPosition>,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer {
            direction: Direction::Invalid,
            script: None,
            language: None,
            successful: true,
            shaped: false,
            max_len: MAX_LEN_DEFAULT,
            len: 0,
            allocated: 0,
            info: Vec::new(),
            pos: Vec::new(),
        }
    }

    #[inline]
    pub fn info_slice(&self) -> &[GlyphInfo] {
        &self.info[..self.len]
    }

    #[inline]
    pub fn pos_slice(&self) -> &[GlyphPosition] {
        &self.pos[..self.len]
    }

    pub fn reset(&mut self) {
        self.direction = Direction::Invalid;
        self.script = None;
        self.language = None;
        self.clear();
    }

    pub fn clear(&mut self) {
        self.successful = true;
        self.shaped = false;
        self.len = 0;
    }

    pub fn add(&mut self, codepoint: u32, cluster: u32) {
        if !self.ensure(self.len + 1) {
            return;
        }

        self.info[self.len] = GlyphInfo {
            glyph_id: codepoint,
            cluster,
            ..GlyphInfo::default()
        };
        self.len += 1;
    }

    /// Makes sure both arrays can hold at least `size` items.
    ///
    /// Fails, and marks the buffer as unsuccessful, once `size` goes past `max_len`.
    #[must_use]
    pub fn ensure(&mut self, size: usize) -> bool {
        if size <= self.allocated {
            return true;
        }

        self.enlarge(size)
    }

    fn enlarge(&mut self, size: usize) -> bool {
        if !self.successful {
            return false;
        }

        if size > self.max_len {
            self.successful = false;
            return false;
        }

        let mut new_allocated = self.allocated;
        while size >= new_allocated {
            new_allocated += (new_allocated >> 1) + 32;
        }

        self.pos.resize(new_allocated, GlyphPosition::default());
        self.info.resize(new_allocated, GlyphInfo::default());
        self.allocated = new_allocated;
        true
    }

    /// Returns the first `info_len` infos and the first `scratch_len` positions
    /// as raw bytes.
    ///
    /// Positions are not needed until shaping is finished,
    /// so their storage is borrowed as the call's working memory.
    pub fn split_scratch(
        &mut self,
        info_len: usize,
        scratch_len: usize,
    ) -> (&mut [GlyphInfo], &mut [u8]) {
        let info = &mut self.info[..info_len];
        let pos = &mut self.pos[..scratch_len];
        (info, bytemuck::cast_slice_mut(pos))
    }

    pub fn clear_positions(&mut self) {
        for pos in &mut self.pos[..self.len] {
            *pos = GlyphPosition::default();
        }
    }

    /// Called when a shaping call starts.
    pub fn enter(&mut self) {
        self.successful = true;
        self.shaped = false;
        self.max_len = self
            .len
            .checked_mul(MAX_LEN_FACTOR)
            .map_or(MAX_LEN_DEFAULT, |len| len.max(MAX_LEN_MIN))
            .min(MAX_LEN_DEFAULT);
    }

    /// Called when a shaping call ends.
    pub fn leave(&mut self) {
        self.max_len = MAX_LEN_DEFAULT;
    }

    pub fn guess_segment_properties(&mut self) {
        if self.script.is_none() {
            for info in &self.info[..self.len] {
                let script = Script::from(info.as_char().script());
                if script != script::COMMON
                    && script != script::INHERITED
                    && script != script::UNKNOWN
                {
                    self.script = Some(script);
                    break;
                }
            }
        }

        // If direction is set to INVALID, guess from script.
        if self.direction == Direction::Invalid {
            if let Some(script) = self.script {
                self.direction = Direction::from_script(script).unwrap_or_default();
            }

            if self.direction == Direction::Invalid {
                self.direction = Direction::LeftToRight;
            }
        }
    }
}

/// A buffer that contains an input string ready for shaping.
pub struct UnicodeBuffer(pub(crate) Buffer);

impl UnicodeBuffer {
    /// Create a new `UnicodeBuffer`.
    #[inline]
    pub fn new() -> UnicodeBuffer {
        UnicodeBuffer(Buffer::new())
    }

    /// Returns the length of the data of the buffer.
    ///
    /// This corresponds to the number of unicode codepoints contained in the
    /// buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len
    }

    /// Pre-allocate the buffer to hold a string at least `size` codepoints.
    ///
    /// Shaping uses the same allocation as working memory,
    /// so a larger buffer can save a retry.
    pub fn pre_allocate(&mut self, size: usize) {
        let _ = self.0.ensure(size);
    }

    /// Returns `true` if the buffer contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.len == 0
    }

    /// Pushes a string to a buffer.
    ///
    /// Every character gets its byte offset as a cluster.
    pub fn push_str(&mut self, str: &str) {
        // Adding a string is one allocation, not one per character.
        if !self.0.ensure(self.0.len + str.chars().count()) {
            return;
        }

        for (i, c) in str.char_indices() {
            self.add(c, i as u32);
        }
    }

    /// Appends a character to a buffer with the given cluster value.
    pub fn add(&mut self, codepoint: char, cluster: u32) {
        self.0.add(codepoint as u32, cluster);
    }

    /// Appends a raw codepoint to a buffer with the given cluster value.
    ///
    /// Values outside the Unicode range are accepted and
    /// replaced with U+FFFD during shaping.
    pub fn add_codepoint(&mut self, codepoint: u32, cluster: u32) {
        self.0.add(codepoint, cluster);
    }

    /// Set the text direction of the `Buffer`'s contents.
    #[inline]
    pub fn set_direction(&mut self, direction: Direction) {
        self.0.direction = direction;
    }

    /// Returns the `Buffer`'s text direction.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.0.direction
    }

    /// Set the script from an ISO15924 tag.
    #[inline]
    pub fn set_script(&mut self, script: Script) {
        self.0.script = Some(script);
    }

    /// Get the ISO15924 script tag.
    pub fn script(&self) -> Script {
        self.0.script.unwrap_or(script::UNKNOWN)
    }

    /// Set the buffer language.
    #[inline]
    pub fn set_language(&mut self, lang: Language) {
        self.0.language = Some(lang);
    }

    /// Get the buffer language.
    #[inline]
    pub fn language(&self) -> Option<Language> {
        self.0.language.clone()
    }

    /// Guess the segment properties (direction, language, script) for the
    /// current buffer.
    #[inline]
    pub fn guess_segment_properties(&mut self) {
        self.0.guess_segment_properties()
    }

    /// Resets clusters to the item index.
    pub fn reset_clusters(&mut self) {
        for (i, info) in self.0.info[..self.0.len].iter_mut().enumerate() {
            info.cluster = i as u32;
        }
    }

    /// Clear the contents of the buffer.
    pub fn clear(&mut self) {
        self.0.reset()
    }
}

impl core::fmt::Debug for UnicodeBuffer {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::fmt::Result {
        fmt.debug_struct("UnicodeBuffer")
            .field("direction", &self.direction())
            .field("language", &self.language())
            .field("script", &self.script())
            .finish()
    }
}

impl Default for UnicodeBuffer {
    fn default() -> UnicodeBuffer {
        UnicodeBuffer::new()
    }
}

bitflags! {
    /// Flags used for serialization with a `BufferSerializer`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SerializeFlags: u8 {
        /// Do not serialize glyph cluster.
        const NO_CLUSTERS = 1 << 0;
        /// Do not serialize glyph position information.
        const NO_POSITIONS = 1 << 1;
        /// Do not serialize glyph advances, glyph offsets will reflect absolute
        /// glyph positions.
        const NO_ADVANCES = 1 << 2;
    }
}

/// A buffer that contains the results of the shaping process.
pub struct GlyphBuffer(pub(crate) Buffer);

impl GlyphBuffer {
    /// Returns the length of the data of the buffer.
    ///
    /// When called before shaping this is the number of unicode codepoints
    /// contained in the buffer. When called after shaping it returns the number
    /// of glyphs stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len
    }

    /// Returns `true` if the buffer contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.len == 0
    }

    /// Returns `false` when shaping did not happen and the buffer holds
    /// the fallback result.
    #[inline]
    pub fn is_shaped(&self) -> bool {
        self.0.shaped
    }

    /// Get the glyph infos.
    #[inline]
    pub fn glyph_infos(&self) -> &[GlyphInfo] {
        self.0.info_slice()
    }

    /// Get the glyph positions.
    #[inline]
    pub fn glyph_positions(&self) -> &[GlyphPosition] {
        self.0.pos_slice()
    }

    /// Clears the content of the glyph buffer and returns an empty
    /// `UnicodeBuffer` reusing the existing allocation.
    #[inline]
    pub fn clear(mut self) -> UnicodeBuffer {
        self.0.reset();
        UnicodeBuffer(self.0)
    }

    /// Converts the glyph buffer content into a string.
    ///
    /// Uses the harfbuzz text format with glyph IDs instead of names:
    /// `gid=cluster@x_offset,y_offset+x_advance`.
    pub fn serialize(&self, flags: SerializeFlags) -> String {
        use core::fmt::Write;

        let mut s = String::with_capacity(64);

        let info = self.glyph_infos();
        let pos = self.glyph_positions();
        let mut x = 0;
        let mut y = 0;
        for (info, pos) in info.iter().zip(pos) {
            if !s.is_empty() {
                s.push('|');
            }

            write!(&mut s, "{}", info.glyph_id).unwrap();

            if !flags.contains(SerializeFlags::NO_CLUSTERS) {
                write!(&mut s, "={}", info.cluster).unwrap();
            }

            if !flags.contains(SerializeFlags::NO_POSITIONS) {
                if x + pos.x_offset != 0 || y + pos.y_offset != 0 {
                    write!(&mut s, "@{},{}", x + pos.x_offset, y + pos.y_offset).unwrap();
                }

                if !flags.contains(SerializeFlags::NO_ADVANCES) {
                    write!(&mut s, "+{}", pos.x_advance).unwrap();
                    if pos.y_advance != 0 {
                        write!(&mut s, ",{}", pos.y_advance).unwrap();
                    }
                }
            }

            if flags.contains(SerializeFlags::NO_ADVANCES) {
                x += pos.x_advance;
                y += pos.y_advance;
            }
        }

        s
    }
}

impl core::fmt::Debug for GlyphBuffer {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::fmt::Result {
        fmt.debug_struct("GlyphBuffer")
            .field("glyph_positions", &self.glyph_positions())
            .field("glyph_infos", &self.glyph_infos())
            .field("shaped", &self.is_shaped())
            .finish()
    }
}

impl core::fmt::Display for GlyphBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.serialize(SerializeFlags::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_str_uses_byte_offsets() {
        let mut buffer = UnicodeBuffer::new();
        buffer.push_str("aé😀b");
        let clusters: Vec<u32> = buffer.0.info_slice().iter().map(|i| i.cluster).collect();
        assert_eq!(clusters, vec![0, 1, 3, 7]);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn ensure_respects_max_len() {
        let mut buffer = Buffer::new();
        buffer.add(0x41, 0);
        buffer.enter();
        assert_eq!(buffer.max_len, MAX_LEN_MIN);
        assert!(buffer.ensure(100));
        assert!(buffer.allocated >= 100);
        assert!(!buffer.ensure(MAX_LEN_MIN + 1));
        assert!(!buffer.successful);
        // Once failed, the buffer stays failed until the next call.
        assert!(!buffer.ensure(buffer.allocated + 1));
    }

    #[test]
    fn scratch_covers_positions() {
        let mut buffer = Buffer::new();
        buffer.add(0x41, 0);
        let allocated = buffer.allocated;
        let (info, scratch) = buffer.split_scratch(1, allocated);
        assert_eq!(info.len(), 1);
        assert_eq!(scratch.len(), allocated * core::mem::size_of::<GlyphPosition>());
    }

    #[test]
    fn guess_properties() {
        let mut buffer = UnicodeBuffer::new();
        buffer.push_str("1 שלום");
        buffer.guess_segment_properties();
        assert_eq!(buffer.script(), script::HEBREW);
        assert_eq!(buffer.direction(), Direction::RightToLeft);

        let mut buffer = UnicodeBuffer::new();
        buffer.push_str("123");
        buffer.guess_segment_properties();
        assert_eq!(buffer.script(), script::UNKNOWN);
        assert_eq!(buffer.direction(), Direction::LeftToRight);
    }

    #[test]
    fn clear_keeps_allocation() {
        let mut buffer = UnicodeBuffer::new();
        buffer.push_str("abc");
        let allocated = buffer.0.allocated;
        let glyphs = GlyphBuffer(buffer.0);
        let buffer = glyphs.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.0.allocated, allocated);
    }

    #[test]
    fn serialize_text() {
        let mut buffer = Buffer::new();
        buffer.add(10, 0);
        buffer.add(20, 0);
        buffer.add(30, 2);
        buffer.pos[0].x_advance = 500;
        buffer.pos[1].x_offset = -100;
        buffer.pos[1].y_offset = 50;
        buffer.pos[2].x_advance = 600;

        let glyphs = GlyphBuffer(buffer);
        assert_eq!(
            glyphs.serialize(SerializeFlags::default()),
            "10=0+500|20=0@-100,50+0|30=2+600"
        );
        assert_eq!(
            glyphs.serialize(SerializeFlags::NO_CLUSTERS | SerializeFlags::NO_ADVANCES),
            "10|20@400,50|30@500,0"
        );
        assert_eq!(glyphs.serialize(SerializeFlags::NO_POSITIONS), "10=0|20=0|30=2");
    }
}
