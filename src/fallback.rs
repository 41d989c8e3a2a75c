use crate::buffer::Buffer;

/// Produces the "no shaping performed" result.
///
/// Every item becomes glyph 0 with its original cluster and no advance.
/// Only reads the items, so a result of a failed attempt can never leak in.
pub(crate) fn fallback_shape(buffer: &mut Buffer) {
    log::debug!("fallback shaper invoked for {} items", buffer.len);

    for info in &mut buffer.info[..buffer.len] {
        info.glyph_id = 0;
        info.mask = 0;
        info.var1 = 0;
        info.var2 = 0;
    }

    buffer.clear_positions();
    buffer.shaped = false;
}
