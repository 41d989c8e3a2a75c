//! Maps glyphs back to the clusters of the original text.
//!
//! The engine reports clusters per code unit and per run. What we ship is one
//! cluster value per glyph, taken from the buffer's own cluster values.

use smallvec::SmallVec;

use crate::buffer::GlyphInfo;
use crate::engine::GlyphFlags;
use crate::shape::ShapeError;

const UNSET: u32 = u32::MAX;

/// Where a run starts in the code unit and glyph arrays.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RunSpan {
    pub units_start: usize,
    pub glyphs_start: usize,
}

pub type RunSpans = SmallVec<[RunSpan; 16]>;

/// Checks that every logical cluster of a run points at one of its own glyphs.
pub fn check_log_clusters(log_clusters: &[u16], glyphs_len: usize) -> Result<(), ShapeError> {
    if log_clusters.iter().any(|c| usize::from(*c) >= glyphs_len) {
        return Err(ShapeError::ClusterOutOfRange);
    }

    Ok(())
}

/// Calculates visual clusters.
///
/// `log_clusters` hold run-local glyph indices, `runs` tells which glyph each run
/// starts at. `glyph_props` and `vis_clusters` hold exactly one entry per produced glyph.
///
/// Clusters the engine interleaves are not reordered: every glyph simply takes the
/// cluster of the glyph before it unless it starts a cluster of its own.
/// A glyph no unit points at is treated as a continuation.
pub fn remap_clusters(
    infos: &[GlyphInfo],
    log_clusters: &[u16],
    runs: &[RunSpan],
    glyph_props: &[GlyphFlags],
    vis_clusters: &mut [u32],
) -> Result<(), ShapeError> {
    debug_assert_eq!(glyph_props.len(), vis_clusters.len());

    vis_clusters.fill(UNSET);

    // Walk backwards, so the first item of a cluster has the last word.
    for info in infos.iter().rev() {
        let unit = info.utf16_index() as usize;
        let run = runs
            .partition_point(|run| run.units_start <= unit)
            .checked_sub(1)
            .and_then(|i| runs.get(i))
            .ok_or(ShapeError::ClusterOutOfRange)?;
        let glyph = log_clusters.get(unit).ok_or(ShapeError::ClusterOutOfRange)?;
        let slot = vis_clusters
            .get_mut(run.glyphs_start + usize::from(*glyph))
            .ok_or(ShapeError::ClusterOutOfRange)?;
        *slot = info.cluster;
    }

    for i in 1..vis_clusters.len() {
        if !glyph_props[i].contains(GlyphFlags::CLUSTER_START) || vis_clusters[i] == UNSET {
            vis_clusters[i] = vis_clusters[i - 1];
        }
    }

    if let Some(first) = vis_clusters.iter().position(|c| *c != UNSET) {
        let cluster = vis_clusters[first];
        vis_clusters[..first].fill(cluster);
    }

    Ok(())
}
