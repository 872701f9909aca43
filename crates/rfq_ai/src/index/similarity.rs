use rfq_core::error::AppError;

pub fn l2_norm(v: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    for x in v {
        sum += x * x;
    }
    sum.sqrt()
}

pub fn cosine_similarity(a: &[f32], b: &[f32], a_norm: f32, b_norm: f32) -> f32 {
    let mut dot = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
    }
    dot / (a_norm * b_norm)
}

/// Best `k` candidates by cosine similarity, score descending, ties broken by
/// key ascending. Zero vectors never match.
pub fn rank_top_k<'a, K, I>(query: &[f32], candidates: I, k: usize) -> Result<Vec<(K, f32)>, AppError>
where
    K: Ord + Clone + 'a,
    I: IntoIterator<Item = (&'a K, &'a [f32])>,
{
    let qnorm = l2_norm(query);
    if qnorm == 0.0 {
        return Err(AppError::new(
            "AI_RETRIEVAL_FAILED",
            "Query embedding norm is zero",
        ));
    }

    let mut hits: Vec<(K, f32)> = Vec::new();
    for (key, v) in candidates {
        if v.len() != query.len() {
            return Err(AppError::new(
                "INDEX_DIMS_MISMATCH",
                "Query embedding dims do not match index dims",
            )
            .with_details(format!("index_dims={}; query_dims={}", v.len(), query.len())));
        }
        let vnorm = l2_norm(v);
        if vnorm == 0.0 {
            continue;
        }
        hits.push((key.clone(), cosine_similarity(query, v, qnorm, vnorm)));
    }

    hits.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    hits.truncate(k);
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_cosine_then_key() {
        let a = ("a".to_string(), vec![1.0f32, 0.0]);
        let b = ("b".to_string(), vec![0.0f32, 1.0]);
        let c = ("c".to_string(), vec![2.0f32, 0.0]);
        let zero = ("z".to_string(), vec![0.0f32, 0.0]);
        let items = [&a, &b, &c, &zero];

        let hits = rank_top_k(
            &[1.0, 0.0],
            items.iter().map(|(k, v)| (k, v.as_slice())),
            3,
        )
        .expect("rank");
        let keys: Vec<&str> = hits.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "c", "b"]);
    }

    #[test]
    fn rejects_zero_query_and_dims_mismatch() {
        let a = ("a".to_string(), vec![1.0f32, 0.0]);
        let err = rank_top_k(&[0.0, 0.0], [(&a.0, a.1.as_slice())], 3).expect_err("zero");
        assert_eq!(err.code, "AI_RETRIEVAL_FAILED");
        let err = rank_top_k(&[1.0, 0.0, 0.0], [(&a.0, a.1.as_slice())], 3).expect_err("dims");
        assert_eq!(err.code, "INDEX_DIMS_MISMATCH");
    }
}
