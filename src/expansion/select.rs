use super::ExpansionError;
use super::embedding::{Embedder, cosine};
use super::weights::TermWeights;

/// Candidates sharing the highest and second-highest distinct weight.
///
/// Both groups are built from distinct weight values, so they never overlap.
/// Members are in ascending lexical order.
#[derive(Debug, PartialEq)]
pub struct TieGroups {
    pub max: Vec<String>,
    pub second: Vec<String>,
}

impl TieGroups {
    pub fn from_weights(weights: &TermWeights) -> Option<Self> {
        let mut values: Vec<f64> = weights.values().copied().collect();
        values.sort_by(|a, b| b.total_cmp(a));
        values.dedup();

        let max_value = *values.first()?;
        let second_value = values.get(1).copied();

        let members = |target: f64| -> Vec<String> {
            weights
                .iter()
                .filter(|&(_, &weight)| weight == target)
                .map(|(term, _)| term.clone())
                .collect()
        };

        Some(Self {
            max: members(max_value),
            second: second_value.map(members).unwrap_or_default(),
        })
    }
}

/// Pick up to two terms, breaking ties by descending lexical order.
pub fn select_lexical(weights: &TermWeights) -> Vec<String> {
    let Some(groups) = TieGroups::from_weights(weights) else {
        return Vec::new();
    };
    let mut max = groups.max;
    if max.len() == 1 {
        let mut terms = max;
        if let Some(second) = groups.second.last() {
            terms.push(second.clone());
        }
        return terms;
    }
    let first = max.pop();
    let second = max.pop();
    first.into_iter().chain(second).collect()
}

/// Pick up to two terms, breaking ties by cosine similarity to the query.
///
/// The best max-group term comes first. The runner-up comes from the rest of
/// the max group, or from the second group when the max group is exhausted.
/// Equal similarities fall back to descending lexical order.
pub fn select_semantic(
    weights: &TermWeights,
    query: &str,
    embedder: &impl Embedder,
) -> Result<Vec<String>, ExpansionError> {
    let Some(groups) = TieGroups::from_weights(weights) else {
        return Ok(Vec::new());
    };
    let query_vector = embedder.embed_text(query)?;

    let mut ranked = rank_by_similarity(&groups.max, &query_vector, embedder)?.into_iter();
    let mut terms: Vec<String> = ranked.next().into_iter().collect();
    match ranked.next() {
        Some(runner_up) => terms.push(runner_up),
        None => {
            let second = rank_by_similarity(&groups.second, &query_vector, embedder)?;
            terms.extend(second.into_iter().next());
        }
    }
    Ok(terms)
}

fn rank_by_similarity(
    terms: &[String],
    query_vector: &[f32],
    embedder: &impl Embedder,
) -> Result<Vec<String>, ExpansionError> {
    let mut scored = terms
        .iter()
        .map(|term| Ok((term, cosine(&embedder.embed(term)?, query_vector))))
        .collect::<Result<Vec<_>, ExpansionError>>()?;
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(a.0)));
    Ok(scored.into_iter().map(|(term, _)| term.clone()).collect())
}
