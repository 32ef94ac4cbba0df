/*!
 * Multi-word unit merging.
 *
 * The `[tok_mwu]` layer lists lexical units that may span several tokens. Each unit
 * is matched against the tokens already built for the block: a unit whose span is
 * exactly one token's span is already atomic and skipped, any other unit groups the
 * tokens lying within its marker bounds.
 */

use log::{debug, warn};

use crate::conversion::tokens::{layer_item, marker_ordinal, TokenTable};
use crate::corpus::model::Mwu;
use crate::errors::ConversionError;
use crate::tei::{AnnotationBlock, LayerKind};

/// Positions of the tokens covered by `[from, to]` (marker ordinals)
///
/// Time-ordered tables stop at the first token ending past the unit, which keeps the
/// members contiguous. Unordered tables are scanned completely with a containment test,
/// which may yield a gapped set.
fn member_positions(table: &TokenTable, from: u64, to: u64) -> Result<Vec<usize>, ConversionError> {
    let mut members = Vec::new();

    if table.is_time_ordered() {
        for index in 0..table.len() {
            let (token_from, token_to) = table.bounds(index)?;
            if token_to > to {
                break;
            }
            if token_from < from {
                continue;
            }
            members.push(index);
        }
    } else {
        warn!("Token markers are not in time order, scanning all tokens for multi-word unit");
        for index in 0..table.len() {
            let (token_from, token_to) = table.bounds(index)?;
            if token_from >= from && token_to <= to {
                members.push(index);
            }
        }
    }

    Ok(members)
}

/// Members must form one gap-free run of the block's tokens
fn is_contiguous(members: &[usize]) -> bool {
    members.windows(2).all(|pair| pair[1] == pair[0] + 1)
}

/// Build the multi-word units of `speaker` in `block` over its aligned tokens
pub fn merge_mwus(
    block: &AnnotationBlock,
    speaker: &str,
    table: &TokenTable,
) -> Result<Vec<Mwu>, ConversionError> {
    let units = block.layer(speaker, LayerKind::MwuForm);
    let unit_pos = block.layer(speaker, LayerKind::MwuPos);

    let mut mwus = Vec::new();
    for (n, unit) in units.iter().enumerate() {
        if table.position(&unit.from, &unit.to).is_some() {
            continue;
        }

        let from = marker_ordinal(&unit.from)?;
        let to = marker_ordinal(&unit.to)?;
        let members = member_positions(table, from, to)?;
        let pos = layer_item(&unit_pos, LayerKind::MwuPos, speaker, n)?;

        if members.is_empty() {
            debug!("Multi-word unit '{}' ({}..{}) covers no token", unit.text, unit.from, unit.to);
            continue;
        }
        if !is_contiguous(&members) {
            warn!(
                "Multi-word unit '{}' ({}..{}) covers tokens that are not adjacent, skipping it",
                unit.text, unit.from, unit.to
            );
            continue;
        }

        mwus.push(Mwu {
            form: unit.text.clone(),
            pos: pos.text.clone(),
            members,
        });
    }

    Ok(mwus)
}
