use crate::buffer::{Buffer, GlyphBuffer, UnicodeBuffer};
use crate::cluster::{self, RunSpan, RunSpans};
use crate::common::{Feature, Script};
use crate::encode;
use crate::engine::{
    EngineError, Items, PlaceInput, PlaceOutput, RunProps, ShapeOutput, ShapingEngine,
};
use crate::fallback::fallback_shape;
use crate::itemize;
use crate::resources::{FontResources, ResourceScope};
use crate::scratch::Scratch;
use crate::tag;
use crate::{Face, ShapeConfig, Tag};

/// Why a shaping attempt did not produce glyphs.
///
/// Never leaves the crate: every error ends in the fallback result.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("nothing to shape")]
    EmptyBuffer,
    #[error("not enough working memory")]
    InsufficientCapacity,
    #[error("itemization failed: {0}")]
    Itemize(EngineError),
    #[error("itemizer returned malformed runs")]
    InvalidRuns,
    #[error("font has no data")]
    EmptyFontData,
    #[error("font registration failed")]
    FontRegistration,
    #[error("no rendering context")]
    RenderContext,
    #[error("logical font creation failed")]
    LogicalFont,
    #[error("font has no glyph indices for the run")]
    NoGlyphIndex,
    #[error("shaping failed: {0}")]
    Shape(EngineError),
    #[error("engine reported more glyphs than it was given room for")]
    InvalidGlyphCount,
    #[error("placement failed: {0}")]
    Place(EngineError),
    #[error("log cluster points past the produced glyphs")]
    ClusterOutOfRange,
    #[error("buffer cannot grow any further")]
    BufferResize,
    #[error("gave up after {0} attempts")]
    RetryLimit(usize),
}

impl ShapeError {
    /// Checks that the attempt may succeed when started over with more room.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, ShapeError::InsufficientCapacity)
    }
}

/// Shapes the buffer content using the provided engine, resources and face.
///
/// Consumes the buffer. You can then run [`GlyphBuffer::clear`] to get the [`UnicodeBuffer`] back
/// without allocating a new one.
///
/// Never fails. When the engine or the resources give up, every character becomes glyph 0
/// with its original cluster and no advance, and [`GlyphBuffer::is_shaped`] returns `false`.
///
/// Features are accepted but not forwarded to the engine yet.
pub fn shape<E, R>(
    engine: &mut E,
    resources: &mut R,
    face: &Face,
    features: &[Feature],
    buffer: UnicodeBuffer,
) -> GlyphBuffer
where
    E: ShapingEngine<Context = R::Context>,
    R: FontResources,
{
    shape_with_config(engine, resources, face, features, buffer, &ShapeConfig::default())
}

/// Like [`shape`], with explicit limits.
pub fn shape_with_config<E, R>(
    engine: &mut E,
    resources: &mut R,
    face: &Face,
    features: &[Feature],
    buffer: UnicodeBuffer,
    config: &ShapeConfig,
) -> GlyphBuffer
where
    E: ShapingEngine<Context = R::Context>,
    R: FontResources,
{
    let mut buffer = buffer.0;
    buffer.guess_segment_properties();
    buffer.enter();

    if !features.is_empty() {
        log::debug!("ignoring {} feature overrides", features.len());
    }

    let result = if buffer.len == 0 {
        Err(ShapeError::EmptyBuffer)
    } else {
        shape_internal(engine, resources, face, &mut buffer, config)
    };

    match result {
        Ok(()) => buffer.shaped = true,
        Err(err) => {
            log::debug!("shaping failed: {}", err);
            fallback_shape(&mut buffer);
        }
    }

    buffer.leave();

    GlyphBuffer(buffer)
}

fn shape_internal<E, R>(
    engine: &mut E,
    resources: &mut R,
    face: &Face,
    buffer: &mut Buffer,
    config: &ShapeConfig,
) -> Result<(), ShapeError>
where
    E: ShapingEngine<Context = R::Context>,
    R: FontResources,
{
    let mut attempts = 0;
    loop {
        attempts += 1;

        let err = match shape_attempt(engine, resources, face, buffer, config) {
            Err(err) if err.is_retryable() => err,
            result => return result,
        };

        if attempts >= config.max_attempts() {
            return Err(ShapeError::RetryLimit(attempts));
        }

        // Everything is recomputed from the items, so growing is all it takes.
        let size = buffer.allocated.saturating_mul(2);
        if !buffer.ensure(size) {
            return Err(ShapeError::BufferResize);
        }

        log::trace!("{}, retrying with {} slots", err, buffer.allocated);
    }
}

fn shape_attempt<E, R>(
    engine: &mut E,
    resources: &mut R,
    face: &Face,
    buffer: &mut Buffer,
    config: &ShapeConfig,
) -> Result<(), ShapeError>
where
    E: ShapingEngine<Context = R::Context>,
    R: FontResources,
{
    let units_len = encode::utf16_len(buffer.info_slice());
    let direction = buffer.direction;
    let script = buffer.script;
    let language = buffer
        .language
        .as_ref()
        .map_or(tag::DEFAULT_LANGUAGE, tag::language_tag);
    let scratch_len = buffer.allocated;
    let len = buffer.len;

    let glyphs_len = {
        let (infos, bytes) = buffer.split_scratch(len, scratch_len);
        let mut scratch =
            Scratch::partition(bytes, units_len).ok_or(ShapeError::InsufficientCapacity)?;

        encode::encode_utf16(infos, scratch.units);

        let items = itemize::itemize(engine, scratch.units, direction, config.max_runs())?;

        let (glyphs_len, runs) = {
            let mut scope = ResourceScope::acquire(resources, face)?;
            let context = scope.context_mut()?;
            shape_runs(engine, context, &items, script, language, &mut scratch)?
        };

        cluster::remap_clusters(
            infos,
            scratch.log_clusters,
            &runs,
            &scratch.glyph_props[..glyphs_len],
            &mut scratch.vis_clusters[..glyphs_len],
        )?;

        glyphs_len
    };

    write_back(buffer, units_len, scratch_len, glyphs_len)
}

fn shape_runs<E: ShapingEngine>(
    engine: &mut E,
    context: &mut E::Context,
    items: &Items,
    script: Option<Script>,
    language: Tag,
    scratch: &mut Scratch,
) -> Result<(usize, RunSpans), ShapeError> {
    let mut cache = E::Cache::default();
    let glyphs_size = scratch.glyphs_size();
    let mut glyphs_offset = 0;
    let mut runs = RunSpans::new();

    for pair in items.windows(2) {
        let item = &pair[0];
        let units = item.char_pos..pair[1].char_pos;
        let mut analysis = item.analysis;
        let props = RunProps {
            script: itemize::run_script_tag(item, script),
            language,
            features: &[],
        };

        let result = engine.shape(
            context,
            &mut cache,
            &mut analysis,
            &props,
            &scratch.units[units.clone()],
            ShapeOutput {
                log_clusters: &mut scratch.log_clusters[units.clone()],
                char_props: &mut scratch.char_props[units.clone()],
                glyphs: &mut scratch.glyphs[glyphs_offset..],
                glyph_props: &mut scratch.glyph_props[glyphs_offset..],
            },
        );

        if analysis.no_glyph_index {
            return Err(ShapeError::NoGlyphIndex);
        }

        let glyphs_len = match result {
            Ok(n) => n,
            Err(EngineError::OutOfMemory) => return Err(ShapeError::InsufficientCapacity),
            Err(err) => return Err(ShapeError::Shape(err)),
        };

        if glyphs_len > glyphs_size - glyphs_offset {
            return Err(ShapeError::InvalidGlyphCount);
        }

        cluster::check_log_clusters(&scratch.log_clusters[units.clone()], glyphs_len)?;

        let glyphs = glyphs_offset..glyphs_offset + glyphs_len;
        engine
            .place(
                context,
                &mut cache,
                &analysis,
                &props,
                PlaceInput {
                    units: &scratch.units[units.clone()],
                    log_clusters: &scratch.log_clusters[units.clone()],
                    char_props: &scratch.char_props[units.clone()],
                    glyphs: &scratch.glyphs[glyphs.clone()],
                    glyph_props: &scratch.glyph_props[glyphs.clone()],
                },
                PlaceOutput {
                    advances: &mut scratch.advances[glyphs.clone()],
                    offsets: &mut scratch.offsets[glyphs],
                },
            )
            .map_err(ShapeError::Place)?;

        log::trace!(
            "run {:?} with script {} produced {} glyphs",
            units,
            props.script,
            glyphs_len
        );

        runs.push(RunSpan {
            units_start: units.start,
            glyphs_start: glyphs_offset,
        });
        glyphs_offset += glyphs_len;
    }

    Ok((glyphs_offset, runs))
}

// Replaces items with glyphs.
//
// The results live in the position storage, which is also where the output
// positions go, so they are stashed in the infos first.
fn write_back(
    buffer: &mut Buffer,
    units_len: usize,
    scratch_len: usize,
    glyphs_len: usize,
) -> Result<(), ShapeError> {
    if !buffer.ensure(glyphs_len) {
        return Err(ShapeError::BufferResize);
    }

    {
        // Growing keeps the contents, so the same prefix gives back the same layout.
        let (infos, bytes) = buffer.split_scratch(glyphs_len, scratch_len);
        let scratch =
            Scratch::partition(bytes, units_len).ok_or(ShapeError::InsufficientCapacity)?;

        for (i, info) in infos.iter_mut().enumerate() {
            info.glyph_id = u32::from(scratch.glyphs[i]);
            info.cluster = scratch.vis_clusters[i];
            info.mask = scratch.advances[i] as u32;
            info.var1 = scratch.offsets[i].du as u32;
            info.var2 = scratch.offsets[i].dv as u32;
        }
    }

    buffer.len = glyphs_len;
    buffer.clear_positions();

    let Buffer { info, pos, .. } = buffer;
    for (info, pos) in info[..glyphs_len].iter_mut().zip(&mut pos[..glyphs_len]) {
        pos.x_advance = info.mask as i32;
        pos.y_advance = 0;
        pos.x_offset = info.var1 as i32;
        pos.y_offset = info.var2 as i32;

        info.mask = 0;
        info.var1 = 0;
        info.var2 = 0;
    }

    Ok(())
}
