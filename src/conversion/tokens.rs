/*!
 * Token alignment.
 *
 * A speaker's `[tok_min]`, `[pos_min]` and `[lemma]` layers are index-aligned: the
 * n-th span of each describes the n-th token. The resulting tokens are kept in a
 * [`TokenTable`] in creation order, which the MWU merger scans afterwards.
 */

use std::collections::{BTreeMap, HashMap};

use crate::app_config::LemmaStrategy;
use crate::conversion::timeline::FrameMap;
use crate::corpus::model::Token;
use crate::errors::ConversionError;
use crate::tei::{AnnotationBlock, LayerKind, Span};

/// Names of the lemma sub-fields following the lemma proper in composite lemmas
pub const LEMMA_SUBFIELDS: [&str; 4] = ["agreement", "conjunction", "filler", "key"];

/// Numeric position of a marker reference: `#T12` is 12
pub fn marker_ordinal(reference: &str) -> Result<u64, ConversionError> {
    reference
        .trim()
        .trim_start_matches(['#', 'T'])
        .parse::<u64>()
        .map_err(|_| ConversionError::InvalidMarkerReference(reference.to_string()))
}

/// Split a lemma span according to the configured strategy
pub fn parse_lemma(strategy: LemmaStrategy, raw: &str) -> (String, BTreeMap<String, String>) {
    match strategy {
        LemmaStrategy::Plain => (raw.to_string(), BTreeMap::new()),
        LemmaStrategy::Composite => {
            let mut parts = raw.split('|');
            let lemma = parts.next().unwrap_or_default().to_string();
            let extras = LEMMA_SUBFIELDS
                .iter()
                .zip(parts)
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(name, value)| (name.to_string(), value.trim().to_string()))
                .collect();
            (lemma, extras)
        }
    }
}

/// Tokens of one utterance, in creation order, with lookup by raw `(from, to)` pair
#[derive(Debug, Default)]
pub struct TokenTable {
    tokens: Vec<Token>,
    // numeric (from, to) per token; None when a reference is not numeric
    bounds: Vec<Option<(u64, u64)>>,
    by_refs: HashMap<(String, String), usize>,
    ordered: bool,
}

impl TokenTable {
    pub fn new() -> Self {
        Self {
            ordered: true,
            ..Self::default()
        }
    }

    /// Append a token; its position is returned
    pub fn push(&mut self, token: Token) -> usize {
        let bounds = match (marker_ordinal(&token.from_ref), marker_ordinal(&token.to_ref)) {
            (Ok(from), Ok(to)) => Some((from, to)),
            _ => None,
        };

        // Early-stop scans are only valid while starts never go backwards
        match (self.bounds.last(), bounds) {
            (_, None) => self.ordered = false,
            (Some(Some((previous_from, _))), Some((from, _))) if from < *previous_from => {
                self.ordered = false
            }
            (Some(None), _) => self.ordered = false,
            _ => {}
        }

        let index = self.tokens.len();
        self.by_refs
            .entry((token.from_ref.clone(), token.to_ref.clone()))
            .or_insert(index);
        self.bounds.push(bounds);
        self.tokens.push(token);
        index
    }

    /// Position of the token with exactly these raw references
    pub fn position(&self, from: &str, to: &str) -> Option<usize> {
        self.by_refs.get(&(from.to_string(), to.to_string())).copied()
    }

    /// Whether token starts are non-decreasing in creation order
    pub fn is_time_ordered(&self) -> bool {
        self.ordered
    }

    /// Numeric bounds of the token at `index`
    pub fn bounds(&self, index: usize) -> Result<(u64, u64), ConversionError> {
        match self.bounds.get(index) {
            Some(Some(bounds)) => Ok(*bounds),
            _ => {
                let token = &self.tokens[index];
                Err(ConversionError::InvalidMarkerReference(format!(
                    "{}{}",
                    token.from_ref, token.to_ref
                )))
            }
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

/// Element `index` of a parallel layer, or a misalignment error
pub(crate) fn layer_item<'a>(
    layer: &[&'a Span],
    kind: LayerKind,
    speaker: &str,
    index: usize,
) -> Result<&'a Span, ConversionError> {
    layer
        .get(index)
        .copied()
        .ok_or_else(|| ConversionError::MisalignedLayer {
            layer: kind.layer_name(speaker),
            index,
            len: layer.len(),
        })
}

/// Build the tokens of `speaker` in `block`
pub fn align_tokens(
    block: &AnnotationBlock,
    speaker: &str,
    frames: &FrameMap,
    strategy: LemmaStrategy,
) -> Result<TokenTable, ConversionError> {
    let forms = block.layer(speaker, LayerKind::TokenForm);
    let pos = block.layer(speaker, LayerKind::TokenPos);
    let lemmas = block.layer(speaker, LayerKind::Lemma);

    let mut table = TokenTable::new();
    for (n, form) in forms.iter().enumerate() {
        let pos = layer_item(&pos, LayerKind::TokenPos, speaker, n)?;
        let lemma = layer_item(&lemmas, LayerKind::Lemma, speaker, n)?;
        let (lemma, extras) = parse_lemma(strategy, &lemma.text);

        table.push(Token {
            form: form.text.clone(),
            pos: pos.text.clone(),
            lemma,
            extras,
            span: frames.span(&form.from, &form.to)?,
            from_ref: form.from.clone(),
            to_ref: form.to.clone(),
        });
    }

    Ok(table)
}
