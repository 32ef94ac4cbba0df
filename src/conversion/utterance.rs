use log::debug;

use crate::app_config::LemmaStrategy;
use crate::conversion::agents::AgentRegistry;
use crate::conversion::mwu::merge_mwus;
use crate::conversion::timeline::FrameMap;
use crate::conversion::tokens::align_tokens;
use crate::corpus::model::Utterance;
use crate::errors::ConversionError;
use crate::tei::AnnotationBlock;

// @module: Utterance construction from annotation blocks

/// Build the utterance of one annotation block
///
/// Returns `Ok(None)` for placeholder turns, which produce neither an utterance nor tokens.
pub fn build_utterance(
    block: &AnnotationBlock,
    frames: &FrameMap,
    registry: &AgentRegistry,
    strategy: LemmaStrategy,
) -> Result<Option<Utterance>, ConversionError> {
    if block.is_placeholder() {
        debug!("Skipping placeholder block {}", block.id.as_deref().unwrap_or("?"));
        return Ok(None);
    }

    let span = frames.span(&block.start, &block.end)?;
    let agent = registry.require(&block.who)?;

    let table = align_tokens(block, &block.who, frames, strategy)?;
    let mwus = merge_mwus(block, &block.who, &table)?;

    Ok(Some(Utterance {
        text: block.text.clone(),
        xml_id: block.id.clone(),
        agent,
        ana: block.ana.clone(),
        span,
        tokens: table.into_tokens(),
        mwus,
    }))
}
