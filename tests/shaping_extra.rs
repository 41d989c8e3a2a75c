
use complex_shaper::*;
use shaping_impl::{
    shape, shape_buffer, shape_with, toy_engine, FaultyEngine, FlakyResources, Faults, Stage,
    FONT_DATA,
};

// Failure paths: every one of them must end in the fallback result
// and leave no resources behind.

fn shape_flaky<E>(engine: &mut E, resources: &mut FlakyResources, text: &str) -> GlyphBuffer
where
    E: ShapingEngine<Context = MemoryContext>,
{
    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    let face = Face::from_slice(FONT_DATA, 0);
    complex_shaper::shape(engine, resources, &face, &[], buffer)
}

fn assert_fallback(glyph_buffer: &GlyphBuffer, clusters: &[u32]) {
    assert!(!glyph_buffer.is_shaped());
    assert_eq!(glyph_buffer.len(), clusters.len());
    for (info, cluster) in glyph_buffer.glyph_infos().iter().zip(clusters) {
        assert_eq!(info.glyph_id, 0);
        assert_eq!(info.cluster, *cluster);
    }
    assert!(glyph_buffer.glyph_positions().iter().all(|p| *p == GlyphPosition::default()));
}

#[test]
fn retry_after_injected_out_of_memory() {
    let faults = Faults {
        out_of_memory: 2,
        ..Faults::default()
    };
    let mut engine = FaultyEngine::new(toy_engine(), faults);
    let result = shape_with(&mut engine, "a😀b", "");
    assert_eq!(result, shape("a😀b", ""));
    assert_eq!(engine.itemize_calls, 3);
    assert_eq!(engine.shape_calls, 3);
    assert_eq!(engine.place_calls, 1);
}

#[test]
fn retry_when_buffer_is_too_small() {
    let text = "abcdefghij".repeat(200);

    let mut engine = FaultyEngine::new(toy_engine(), Faults::default());
    let grown = shape_buffer(&mut engine, &text, "");
    assert!(grown.is_shaped());
    assert!(engine.itemize_calls > 1);

    let mut engine = FaultyEngine::new(toy_engine(), Faults::default());
    let preallocated = shape_buffer(&mut engine, &text, "--pre-allocate=10000");
    assert!(preallocated.is_shaped());
    assert_eq!(engine.itemize_calls, 1);

    assert_eq!(grown.len(), 2000);
    assert_eq!(grown.to_string(), preallocated.to_string());
}

#[test]
fn retry_terminates() {
    let faults = Faults {
        out_of_memory: usize::MAX,
        ..Faults::default()
    };

    let mut engine = FaultyEngine::new(toy_engine(), faults.clone());
    let glyph_buffer = shape_buffer(&mut engine, "ab", "");
    assert_fallback(&glyph_buffer, &[0, 1]);
    assert!(engine.shape_calls > 1);
    assert!(engine.shape_calls <= 16);

    let mut engine = FaultyEngine::new(toy_engine(), faults);
    let glyph_buffer = shape_buffer(&mut engine, "ab", "--max-attempts=3");
    assert_fallback(&glyph_buffer, &[0, 1]);
    assert_eq!(engine.shape_calls, 3);
}

#[test]
fn itemize_failure() {
    let faults = Faults {
        itemize: Some(EngineError::InvalidArgument),
        ..Faults::default()
    };
    let mut engine = FaultyEngine::new(toy_engine(), faults);
    let mut resources = FlakyResources::new(None);
    let glyph_buffer = shape_flaky(&mut engine, &mut resources, "ab");
    assert_fallback(&glyph_buffer, &[0, 1]);
    assert_eq!(engine.shape_calls, 0);
    // Resources are acquired only once the text is itemized.
    assert_eq!(resources.registrations, 0);
}

#[test]
fn resource_failures() {
    for stage in [Stage::Register, Stage::Context, Stage::Font] {
        let mut engine = FaultyEngine::new(toy_engine(), Faults::default());
        let mut resources = FlakyResources::new(Some(stage));
        let glyph_buffer = shape_flaky(&mut engine, &mut resources, "ab");
        assert_fallback(&glyph_buffer, &[0, 1]);
        assert_eq!(engine.shape_calls, 0, "{:?}", stage);
        assert_eq!(resources.inner.outstanding(), 0, "{:?}", stage);
    }
}

#[test]
fn empty_font_data() {
    let mut engine = FaultyEngine::new(toy_engine(), Faults::default());
    let mut resources = FlakyResources::new(None);
    let mut buffer = UnicodeBuffer::new();
    buffer.push_str("ab");
    let face = Face::from_slice(&[], 0);
    let glyph_buffer = complex_shaper::shape(&mut engine, &mut resources, &face, &[], buffer);
    assert_fallback(&glyph_buffer, &[0, 1]);
    assert_eq!(resources.registrations, 0);
}

#[test]
fn engine_failures() {
    let cases = [
        Faults {
            shape: Some(EngineError::Failed(-5)),
            ..Faults::default()
        },
        Faults {
            no_glyph_index: true,
            ..Faults::default()
        },
        Faults {
            place: Some(EngineError::InvalidArgument),
            ..Faults::default()
        },
        Faults {
            overflow: true,
            ..Faults::default()
        },
        Faults {
            stray_cluster: true,
            ..Faults::default()
        },
    ];

    for faults in cases {
        let mut engine = FaultyEngine::new(toy_engine(), faults.clone());
        let mut resources = FlakyResources::new(None);
        let glyph_buffer = shape_flaky(&mut engine, &mut resources, "a😀b");
        assert_fallback(&glyph_buffer, &[0, 1, 5]);
        assert_eq!(engine.shape_calls, 1, "{:?}", faults);
        assert_eq!(resources.inner.outstanding(), 0, "{:?}", faults);
    }
}

#[test]
fn fallback_is_idempotent() {
    let faults = Faults {
        shape: Some(EngineError::Failed(-1)),
        ..Faults::default()
    };
    let mut engine = FaultyEngine::new(toy_engine(), faults);
    let first = shape_with(&mut engine, "aאb", "");
    let second = shape_with(&mut engine, "aאb", "");
    assert_eq!(first, "0=0+0|0=1+0|0=3+0");
    assert_eq!(first, second);
}

#[test]
fn resources_released_after_success() {
    let mut engine = FaultyEngine::new(toy_engine(), Faults::default());
    let mut resources = FlakyResources::new(None);
    for _ in 0..3 {
        let glyph_buffer = shape_flaky(&mut engine, &mut resources, "abאב");
        assert!(glyph_buffer.is_shaped());
    }
    assert_eq!(resources.registrations, 3);
    assert_eq!(resources.inner.outstanding(), 0);
}

#[test]
fn cluster_past_own_run() {
    // The second run would otherwise borrow a glyph of the first one.
    let faults = Faults {
        stray_cluster: true,
        ..Faults::default()
    };
    let mut engine = FaultyEngine::new(toy_engine(), faults);
    let glyph_buffer = shape_buffer(&mut engine, "abאב", "");
    assert_fallback(&glyph_buffer, &[0, 1, 2, 4]);
    assert_eq!(engine.shape_calls, 1);
    assert_eq!(engine.place_calls, 0);
}
