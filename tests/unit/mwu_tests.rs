/*!
 * Tests for multi-word unit merging
 */

use anyhow::Result;
use tei2lcp::app_config::LemmaStrategy;
use tei2lcp::conversion::mwu::merge_mwus;
use tei2lcp::conversion::tokens::align_tokens;
use tei2lcp::conversion::Timeline;
use tei2lcp::corpus::Mwu;
use tei2lcp::errors::ConversionError;
use tei2lcp::tei::{LayerKind, TeiDocument};
use crate::common::{sample_document, BlockBuilder, TeiBuilder};

fn merge(document: &TeiDocument) -> Result<Vec<Mwu>, ConversionError> {
    let frames = Timeline::new().resolve(&document.timeline)?;
    let block = &document.blocks[0];
    let table = align_tokens(block, &block.who, &frames, LemmaStrategy::Plain)?;
    merge_mwus(block, &block.who, &table)
}

fn single_block(block: BlockBuilder) -> Result<TeiDocument> {
    let xml = TeiBuilder::new()
        .person("SPK1", &[])
        .markers_at(&[0, 400, 800, 1200, 1600])
        .end("#T4")
        .block(block)
        .build();
    Ok(TeiDocument::parse(&xml)?)
}

/// A unit matching a single token is skipped; a wider unit groups its tokens
#[test]
fn test_merge_mwus_withSampleDocument_shouldGroupCoveredTokens() -> Result<()> {
    let document = TeiDocument::parse(&sample_document("Sample").build())?;
    let mwus = merge(&document)?;

    assert_eq!(mwus.len(), 1);
    assert_eq!(mwus[0].form, "pomme de terre");
    assert_eq!(mwus[0].pos, "NOM");
    assert_eq!(mwus[0].members, vec![0, 1, 2]);
    Ok(())
}

/// Members are the tokens inside the unit's bounds only
#[test]
fn test_merge_mwus_withInnerUnit_shouldSelectContainedTokens() -> Result<()> {
    let document = single_block(
        BlockBuilder::new("ab1", "SPK1", "#T0", "#T4", "il y a eu")
            .words(&[
                ("il", "PRO", "il", "#T0", "#T1"),
                ("y", "PRO", "y", "#T1", "#T2"),
                ("a", "VER", "avoir", "#T2", "#T3"),
                ("eu", "VER", "avoir", "#T3", "#T4"),
            ])
            .units(&[("y a", "VER", "#T1", "#T3")]),
    )?;

    let mwus = merge(&document)?;
    assert_eq!(mwus.len(), 1);
    assert_eq!(mwus[0].members, vec![1, 2]);
    Ok(())
}

/// Units covering no token are dropped
#[test]
fn test_merge_mwus_withUnitOutsideTokens_shouldSkipIt() -> Result<()> {
    let document = single_block(
        BlockBuilder::new("ab1", "SPK1", "#T0", "#T4", "euh")
            .words(&[("euh", "INT", "euh", "#T0", "#T1")])
            .units(&[("rien", "NOM", "#T2", "#T4")]),
    )?;

    assert!(merge(&document)?.is_empty());
    Ok(())
}

/// Unordered tokens fall back to a containment scan
#[test]
fn test_merge_mwus_withUnorderedTokens_shouldStillFindMembers() -> Result<()> {
    let document = single_block(
        BlockBuilder::new("ab1", "SPK1", "#T0", "#T4", "c a b")
            .words(&[
                ("c", "NOM", "c", "#T3", "#T4"),
                ("a", "NOM", "a", "#T0", "#T1"),
                ("b", "NOM", "b", "#T1", "#T2"),
            ])
            .units(&[("a b", "NOM", "#T0", "#T2")]),
    )?;

    let mwus = merge(&document)?;
    assert_eq!(mwus.len(), 1);
    assert_eq!(mwus[0].members, vec![1, 2]);
    Ok(())
}

/// Unordered tokens whose contained set has a gap yield no unit
#[test]
fn test_merge_mwus_withUnorderedGappedTokens_shouldSkipUnit() -> Result<()> {
    let document = single_block(
        BlockBuilder::new("ab1", "SPK1", "#T0", "#T4", "a z b")
            .words(&[
                ("a", "NOM", "a", "#T0", "#T1"),
                ("z", "NOM", "z", "#T3", "#T4"),
                ("b", "NOM", "b", "#T1", "#T2"),
            ])
            .units(&[("a b", "NOM", "#T0", "#T2")]),
    )?;

    let mwus = merge(&document)?;
    assert!(mwus.is_empty());
    Ok(())
}

/// Every unit produced from unordered tokens is a gap-free run
#[test]
fn test_merge_mwus_withUnorderedTokens_shouldKeepMembersContiguous() -> Result<()> {
    let document = single_block(
        BlockBuilder::new("ab1", "SPK1", "#T0", "#T4", "z a b c")
            .words(&[
                ("z", "NOM", "z", "#T3", "#T4"),
                ("a", "NOM", "a", "#T0", "#T1"),
                ("b", "NOM", "b", "#T1", "#T2"),
                ("c", "NOM", "c", "#T2", "#T3"),
            ])
            .units(&[("a b c", "NOM", "#T0", "#T3"), ("b c z", "NOM", "#T1", "#T4")]),
    )?;

    let mwus = merge(&document)?;
    assert_eq!(mwus.len(), 1);
    assert_eq!(mwus[0].form, "a b c");
    assert_eq!(mwus[0].members, vec![1, 2, 3]);
    for mwu in &mwus {
        assert!(mwu.members.windows(2).all(|pair| pair[1] == pair[0] + 1));
    }
    Ok(())
}

/// A unit part-of-speech layer shorter than the unit layer is fatal
#[test]
fn test_merge_mwus_withShortPosLayer_shouldFail() -> Result<()> {
    let document = single_block(
        BlockBuilder::new("ab1", "SPK1", "#T0", "#T4", "a b")
            .words(&[("a", "NOM", "a", "#T0", "#T1"), ("b", "NOM", "b", "#T1", "#T2")])
            .layer(LayerKind::MwuForm, &[("a b", "#T0", "#T2")]),
    )?;

    assert!(matches!(merge(&document), Err(ConversionError::MisalignedLayer { .. })));
    Ok(())
}

/// Non-numeric unit references cannot be ordered
#[test]
fn test_merge_mwus_withNonNumericReference_shouldFail() -> Result<()> {
    let document = single_block(
        BlockBuilder::new("ab1", "SPK1", "#T0", "#T4", "a b")
            .words(&[("a", "NOM", "a", "#T0", "#T1"), ("b", "NOM", "b", "#T1", "#T2")])
            .units(&[("a b", "NOM", "#start", "#T2")]),
    )?;

    assert!(matches!(merge(&document), Err(ConversionError::InvalidMarkerReference(_))));
    Ok(())
}
