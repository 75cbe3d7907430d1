//! Vector arithmetic shared by every encoder backend.

use super::types::{LexicalWeights, TokenVectors};

/// Dot product over the common prefix of `a` and `b`.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// `left @ right.T`, row-major (`left.len()` x `right.len()`).
pub fn dot_matrix(left: &[Vec<f32>], right: &[Vec<f32>]) -> Vec<f32> {
    let mut out = Vec::with_capacity(left.len() * right.len());
    for l in left {
        for r in right {
            out.push(dot(l, r));
        }
    }
    out
}

/// Sum of `w1[t] * w2[t]` over tokens present in both maps.
pub fn lexical_matching_score(a: &LexicalWeights, b: &LexicalWeights) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(token, w)| large.get(token).map(|other| w * other))
        .sum()
}

/// Mean over query tokens of the best dot product against any passage token.
pub fn colbert_score(query: &TokenVectors, passage: &TokenVectors) -> f32 {
    if query.is_empty() || passage.is_empty() {
        return 0.0;
    }

    let total: f32 = query
        .iter()
        .map(|q| {
            passage
                .iter()
                .map(|p| dot(q, p))
                .fold(f32::NEG_INFINITY, f32::max)
        })
        .sum();

    total / query.len() as f32
}

/// In-place L2 normalisation; zero vectors are left untouched.
pub fn normalize_l2(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
