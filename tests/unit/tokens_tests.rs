/*!
 * Tests for token alignment
 */

use anyhow::Result;
use tei2lcp::app_config::LemmaStrategy;
use tei2lcp::conversion::tokens::align_tokens;
use tei2lcp::conversion::Timeline;
use tei2lcp::errors::ConversionError;
use tei2lcp::tei::{LayerKind, TeiDocument};
use crate::common::{sample_document, BlockBuilder, TeiBuilder};

fn single_block(block: BlockBuilder) -> Result<TeiDocument> {
    let xml = TeiBuilder::new()
        .person("SPK1", &[])
        .markers_at(&[0, 400, 800, 1200])
        .end("#T3")
        .block(block)
        .build();
    Ok(TeiDocument::parse(&xml)?)
}

/// Parallel layers are zipped into tokens with frame spans
#[test]
fn test_align_tokens_withAlignedLayers_shouldBuildTokens() -> Result<()> {
    let document = TeiDocument::parse(&sample_document("Sample").build())?;
    let frames = Timeline::new().resolve(&document.timeline)?;

    let table = align_tokens(&document.blocks[0], "SPK1", &frames, LemmaStrategy::Plain)?;
    assert_eq!(table.len(), 3);
    assert!(table.is_time_ordered());

    let tokens = table.tokens();
    assert_eq!(tokens[0].form, "pomme");
    assert_eq!(tokens[1].pos, "PRP");
    assert_eq!(tokens[2].lemma, "terre");
    assert_eq!((tokens[0].span.start, tokens[0].span.end), (0, 10));
    assert_eq!((tokens[2].span.start, tokens[2].span.end), (20, 30));
    assert_eq!(table.position("#T1", "#T2"), Some(1));
    assert_eq!(table.position("#T0", "#T3"), None);
    Ok(())
}

/// A block without token layers has no tokens
#[test]
fn test_align_tokens_withoutLayers_shouldBeEmpty() -> Result<()> {
    let document = single_block(BlockBuilder::new("ab1", "SPK1", "#T0", "#T1", "euh"))?;
    let frames = Timeline::new().resolve(&document.timeline)?;

    let table = align_tokens(&document.blocks[0], "SPK1", &frames, LemmaStrategy::Plain)?;
    assert!(table.is_empty());
    Ok(())
}

/// A part-of-speech layer shorter than the form layer is fatal
#[test]
fn test_align_tokens_withShortPosLayer_shouldFail() -> Result<()> {
    let document = single_block(
        BlockBuilder::new("ab1", "SPK1", "#T0", "#T2", "oui oui")
            .layer(LayerKind::TokenForm, &[("oui", "#T0", "#T1"), ("oui", "#T1", "#T2")])
            .layer(LayerKind::TokenPos, &[("ADV", "#T0", "#T1")])
            .layer(LayerKind::Lemma, &[("oui", "#T0", "#T1"), ("oui", "#T1", "#T2")]),
    )?;
    let frames = Timeline::new().resolve(&document.timeline)?;

    let result = align_tokens(&document.blocks[0], "SPK1", &frames, LemmaStrategy::Plain);
    match result {
        Err(ConversionError::MisalignedLayer { layer, index, len }) => {
            assert_eq!(layer, "SPK1[pos_min]");
            assert_eq!(index, 1);
            assert_eq!(len, 1);
        }
        other => panic!("expected a misaligned layer, got {:?}", other.map(|t| t.len())),
    }
    Ok(())
}

/// Extra form spans past the end of the lemma layer are fatal too
#[test]
fn test_align_tokens_withShortLemmaLayer_shouldFail() -> Result<()> {
    let document = single_block(
        BlockBuilder::new("ab1", "SPK1", "#T0", "#T2", "oui oui")
            .layer(LayerKind::TokenForm, &[("oui", "#T0", "#T1"), ("oui", "#T1", "#T2")])
            .layer(LayerKind::TokenPos, &[("ADV", "#T0", "#T1"), ("ADV", "#T1", "#T2")]),
    )?;
    let frames = Timeline::new().resolve(&document.timeline)?;

    let result = align_tokens(&document.blocks[0], "SPK1", &frames, LemmaStrategy::Plain);
    assert!(matches!(result, Err(ConversionError::MisalignedLayer { .. })));
    Ok(())
}

/// Token references must exist on the timeline
#[test]
fn test_align_tokens_withUnknownMarker_shouldFail() -> Result<()> {
    let document = single_block(
        BlockBuilder::new("ab1", "SPK1", "#T0", "#T1", "oui")
            .words(&[("oui", "ADV", "oui", "#T0", "#T9")]),
    )?;
    let frames = Timeline::new().resolve(&document.timeline)?;

    let result = align_tokens(&document.blocks[0], "SPK1", &frames, LemmaStrategy::Plain);
    assert!(matches!(result, Err(ConversionError::UnknownMarker(ref r)) if r == "#T9"));
    Ok(())
}

/// Composite lemmas are split into sub-fields
#[test]
fn test_align_tokens_withCompositeStrategy_shouldSplitLemma() -> Result<()> {
    let document = single_block(
        BlockBuilder::new("ab1", "SPK1", "#T0", "#T1", "est")
            .words(&[("est", "VER", "être|3s|||", "#T0", "#T1")]),
    )?;
    let frames = Timeline::new().resolve(&document.timeline)?;

    let table = align_tokens(&document.blocks[0], "SPK1", &frames, LemmaStrategy::Composite)?;
    let token = &table.tokens()[0];
    assert_eq!(token.lemma, "être");
    assert_eq!(token.extras.get("agreement").map(String::as_str), Some("3s"));
    assert_eq!(token.extras.len(), 1);
    Ok(())
}

/// Tokens whose starts go backwards mark the table as unordered
#[test]
fn test_align_tokens_withOutOfOrderMarkers_shouldReportUnordered() -> Result<()> {
    let document = single_block(
        BlockBuilder::new("ab1", "SPK1", "#T0", "#T3", "b a")
            .words(&[("b", "NOM", "b", "#T2", "#T3"), ("a", "NOM", "a", "#T0", "#T1")]),
    )?;
    let frames = Timeline::new().resolve(&document.timeline)?;

    let table = align_tokens(&document.blocks[0], "SPK1", &frames, LemmaStrategy::Plain)?;
    assert!(!table.is_time_ordered());
    assert_eq!(table.bounds(0)?, (2, 3));
    Ok(())
}
