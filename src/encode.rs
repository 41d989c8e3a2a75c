//! UTF-16 encoding of the buffer content.

use crate::buffer::GlyphInfo;

/// Returns the number of UTF-16 code units `infos` encode to.
pub fn utf16_len(infos: &[GlyphInfo]) -> usize {
    infos
        .iter()
        .map(|info| if (0x10000..0x110000).contains(&info.glyph_id) { 2 } else { 1 })
        .sum()
}

/// Encodes the codepoints of `infos` into `units` and records the offset of
/// every item's first code unit on the item.
///
/// Codepoints outside of the Unicode range become U+FFFD.
/// `units` must be exactly [`utf16_len`] long.
pub fn encode_utf16(infos: &mut [GlyphInfo], units: &mut [u16]) {
    debug_assert_eq!(units.len(), utf16_len(infos));

    let mut len = 0;
    for info in infos {
        let c = info.glyph_id;
        info.set_utf16_index(len as u32);
        if c < 0x10000 {
            units[len] = c as u16;
            len += 1;
        } else if c >= 0x110000 {
            units[len] = 0xFFFD;
            len += 1;
        } else {
            units[len] = (0xD800 + ((c - 0x10000) >> 10)) as u16;
            units[len + 1] = (0xDC00 + ((c - 0x10000) & ((1 << 10) - 1))) as u16;
            len += 2;
        }
    }
}
