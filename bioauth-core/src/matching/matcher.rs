use crate::models::config::MatchConfig;
use crate::models::error::BioError;
use crate::models::identity::EnrolledIdentity;
use crate::models::match_result::{DistanceMetric, MatchResult};

/// Cosine distance: `1 - dot(a, b) / (|a| * |b|)`.
///
/// Zero-norm inputs are treated as orthogonal (distance 1.0).
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

/// Euclidean distance: `|a - b|`.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Cosine => cosine_distance(a, b),
        DistanceMetric::Euclidean => euclidean_distance(a, b),
    }
}

/// Identify `query` against `records` under the configured metric and
/// threshold.
///
/// Linear scan over every candidate: O(n) per query, an explicit scale
/// assumption at low thousands of enrolled identities. Exact distance ties
/// go to the record encountered earlier — `records` is insertion-ordered by
/// the template store, making the tie-break deterministic rather than an
/// accident of map iteration.
pub fn match_query(
    records: &[EnrolledIdentity],
    query: &[f32],
    config: &MatchConfig,
) -> Result<MatchResult, BioError> {
    config.validate().map_err(BioError::Validation)?;
    if query.is_empty() || query.iter().any(|v| !v.is_finite()) {
        return Err(BioError::Validation(
            "query vector must be non-empty and finite".into(),
        ));
    }
    if records.is_empty() {
        return Err(BioError::EmptyStore);
    }

    let mut best: Option<(&EnrolledIdentity, f32)> = None;
    for record in records {
        let candidate = match record.feature.as_embedding() {
            Some(v) if v.len() == query.len() => v,
            _ => {
                // Hardware templates and mismatched dimensions cannot be
                // compared under a vector metric.
                log::debug!("skipping candidate {} (not a comparable embedding)", record.id);
                continue;
            }
        };
        let d = distance(config.metric, query, candidate);
        // Strict < keeps the earlier record on exact ties.
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((record, d));
        }
    }

    let (record, best_distance) = best.ok_or(BioError::EmptyStore)?;

    if best_distance < config.threshold {
        let confidence = (1.0 - best_distance / config.threshold).clamp(0.0, 1.0);
        log::info!(
            "identified {} (distance {:.4}, confidence {:.3})",
            record.id,
            best_distance,
            confidence
        );
        Ok(MatchResult {
            identity_id: record.id,
            display_name: record.display_name.clone(),
            external_ref: record.external_ref.clone(),
            distance: best_distance,
            confidence,
        })
    } else {
        log::info!(
            "no match (best distance {:.4}, threshold {:.4})",
            best_distance,
            config.threshold
        );
        Err(BioError::NoMatch { best_distance })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identity::FeatureData;
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn enrolled(id: u64, vector: Vec<f32>) -> EnrolledIdentity {
        EnrolledIdentity {
            id,
            display_name: format!("user-{}", id),
            external_ref: format!("ref-{}", id),
            feature: FeatureData::Embedding(vector),
            enrolled_at: Utc::now(),
        }
    }

    fn cosine(threshold: f32) -> MatchConfig {
        MatchConfig {
            metric: DistanceMetric::Cosine,
            threshold,
        }
    }

    #[test]
    fn identical_vector_has_zero_distance_for_both_metrics() {
        let records = vec![enrolled(1, vec![0.3, -0.7, 0.2])];
        for metric in [DistanceMetric::Cosine, DistanceMetric::Euclidean] {
            for threshold in [0.001, 0.1, 1.0, 10.0] {
                let config = MatchConfig { metric, threshold };
                let result = match_query(&records, &[0.3, -0.7, 0.2], &config).unwrap();
                assert_eq!(result.identity_id, 1);
                assert_relative_eq!(result.distance, 0.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn empty_store_is_distinct_from_no_match() {
        let err = match_query(&[], &[1.0, 0.0], &cosine(0.5)).unwrap_err();
        assert_eq!(err, BioError::EmptyStore);
    }

    #[test]
    fn rejection_reports_best_distance() {
        let records = vec![enrolled(1, vec![1.0, 0.0, 0.0])];
        let err = match_query(&records, &[0.0, 1.0, 0.0], &cosine(0.1)).unwrap_err();
        match err {
            BioError::NoMatch { best_distance } => {
                assert_relative_eq!(best_distance, 1.0, epsilon = 1e-6)
            }
            other => panic!("expected NoMatch, got {:?}", other),
        }
    }

    #[test]
    fn accepts_near_vector_rejects_orthogonal() {
        let records = vec![enrolled(7, vec![1.0, 0.0, 0.0])];

        let accepted = match_query(&records, &[0.99, 0.01, 0.0], &cosine(0.1)).unwrap();
        assert_eq!(accepted.identity_id, 7);
        assert!(accepted.distance < 1e-3);
        assert!(accepted.confidence > 0.99);

        let rejected = match_query(&records, &[0.0, 1.0, 0.0], &cosine(0.1)).unwrap_err();
        assert!(matches!(rejected, BioError::NoMatch { .. }));
    }

    #[test]
    fn exact_tie_goes_to_earlier_record() {
        let records = vec![
            enrolled(10, vec![1.0, 0.0]),
            enrolled(20, vec![1.0, 0.0]),
        ];
        let result = match_query(&records, &[1.0, 0.0], &cosine(0.5)).unwrap();
        assert_eq!(result.identity_id, 10);
    }

    #[test]
    fn confidence_is_monotone_and_bounded() {
        let records = vec![
            enrolled(1, vec![1.0, 0.0]),
        ];
        let config = cosine(0.5);

        let mut last = f32::INFINITY;
        // Progressively rotate the query away from the candidate.
        for angle_deg in [0.0f32, 5.0, 15.0, 30.0] {
            let rad = angle_deg.to_radians();
            let query = [rad.cos(), rad.sin()];
            match match_query(&records, &query, &config) {
                Ok(result) => {
                    assert!((0.0..=1.0).contains(&result.confidence));
                    assert!(result.confidence <= last);
                    last = result.confidence;
                }
                Err(BioError::NoMatch { .. }) => break,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn euclidean_matches_norm_difference() {
        let records = vec![enrolled(1, vec![0.0, 0.0, 0.0])];
        let config = MatchConfig {
            metric: DistanceMetric::Euclidean,
            threshold: 10.0,
        };
        let result = match_query(&records, &[3.0, 4.0, 0.0], &config).unwrap();
        assert_relative_eq!(result.distance, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn skips_templates_and_mismatched_dimensions() {
        let mut with_template = enrolled(1, vec![]);
        with_template.feature = FeatureData::Template(vec![1, 2, 3]);
        let records = vec![
            with_template,
            enrolled(2, vec![1.0, 0.0, 0.0, 0.0]), // wrong dimension
            enrolled(3, vec![1.0, 0.0]),
        ];
        let result = match_query(&records, &[1.0, 0.0], &cosine(0.5)).unwrap();
        assert_eq!(result.identity_id, 3);
    }

    #[test]
    fn all_incomparable_candidates_behave_as_empty() {
        let mut record = enrolled(1, vec![]);
        record.feature = FeatureData::Template(vec![9, 9]);
        let err = match_query(&[record], &[1.0, 0.0], &cosine(0.5)).unwrap_err();
        assert_eq!(err, BioError::EmptyStore);
    }

    #[test]
    fn rejects_invalid_query() {
        let records = vec![enrolled(1, vec![1.0, 0.0])];
        assert!(matches!(
            match_query(&records, &[], &cosine(0.5)),
            Err(BioError::Validation(_))
        ));
        assert!(matches!(
            match_query(&records, &[f32::NAN, 0.0], &cosine(0.5)),
            Err(BioError::Validation(_))
        ));
    }

    #[test]
    fn zero_norm_query_is_orthogonal_to_everything() {
        let records = vec![enrolled(1, vec![1.0, 0.0])];
        let err = match_query(&records, &[0.0, 0.0], &cosine(0.5)).unwrap_err();
        assert_eq!(err, BioError::NoMatch { best_distance: 1.0 });
    }
}
