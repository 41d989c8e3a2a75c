use crate::common::{Direction, Script};
use crate::engine::{Items, ScriptItem, ScriptState, ShapingEngine};
use crate::shape::ShapeError;
use crate::tag;
use crate::Tag;

/// Splits UTF-16 text into script runs using the engine's itemizer.
///
/// The returned list ends with a terminator, so run `i` spans
/// `items[i].char_pos..items[i + 1].char_pos`.
pub fn itemize<E: ShapingEngine>(
    engine: &mut E,
    units: &[u16],
    direction: Direction,
    max_runs: usize,
) -> Result<Items, ShapeError> {
    let state = ScriptState {
        bidi_level: if direction.is_forward() { 0 } else { 1 },
        override_direction: true,
    };

    let items = engine
        .itemize(units, max_runs, &state)
        .map_err(ShapeError::Itemize)?;

    if !runs_are_valid(&items, units.len(), max_runs) {
        return Err(ShapeError::InvalidRuns);
    }

    log::trace!("{} runs", items.len() - 1);

    Ok(items)
}

// Runs must start at 0, end at `len`, be non-empty and in order.
fn runs_are_valid(items: &[ScriptItem], len: usize, max_runs: usize) -> bool {
    let (Some(first), Some(last)) = (items.first(), items.last()) else {
        return false;
    };

    items.len() >= 2
        && items.len() - 1 <= max_runs
        && first.char_pos == 0
        && last.char_pos == len
        && items.windows(2).all(|pair| pair[0].char_pos < pair[1].char_pos)
}

/// Picks the OpenType script tag a run is shaped with.
///
/// The itemizer knows best, the buffer script is only used when it has no opinion.
pub fn run_script_tag(item: &ScriptItem, script: Option<Script>) -> Tag {
    if !item.script_tag.is_null() {
        return item.script_tag;
    }

    script.map_or(tag::DEFAULT_SCRIPT, tag::script_tag)
}
