//! Comparator/Explainer: cohort-relative fact tokens and their template rendering.
//!
//! Facts compare each candidate's dimension score with the cohort median. For cohorts of
//! `STD_DEV_MIN_COHORT` or more candidates, the distance is expressed in standard
//! deviations; smaller cohorts get a rank-based tercile instead. Zero-confidence scores are
//! left out of the median, deviation and rank, and reported as `no_data`.

use crate::ranking::collaborators::Narrative;
use crate::ranking::models::{Dimension, DimensionScores, FactToken, Magnitude, Relation, Source};

pub const STD_DEV_MIN_COHORT: usize = 5;
const SLIGHT_MAX_SIGMA: f64 = 0.5;
const MODERATE_MAX_SIGMA: f64 = 1.0;
const EPSILON: f64 = 1e-9;

struct CohortStats {
    /// Informative values only, ascending.
    values: Vec<f64>,
    /// Every candidate in the run, informative or not.
    cohort_size: usize,
    median: f64,
    std_dev: f64,
}

impl CohortStats {
    fn new(mut values: Vec<f64>, cohort_size: usize) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let n = values.len();
        let median = if n % 2 == 1 {
            values[n / 2]
        } else {
            (values[n / 2 - 1] + values[n / 2]) / 2.0
        };
        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;

        Some(Self {
            values,
            cohort_size,
            median,
            std_dev: variance.sqrt(),
        })
    }

    fn describe(&self, dimension: Dimension, value: f64) -> FactToken {
        let delta = value - self.median;
        let relation = if delta.abs() <= EPSILON {
            Relation::AtMedian
        } else if delta > 0.0 {
            Relation::AboveMedian
        } else {
            Relation::BelowMedian
        };

        let magnitude = match relation {
            Relation::AtMedian | Relation::NoData => None,
            _ if self.cohort_size >= STD_DEV_MIN_COHORT && self.std_dev > EPSILON => {
                let sigmas = delta.abs() / self.std_dev;
                Some(if sigmas < SLIGHT_MAX_SIGMA {
                    Magnitude::Slight
                } else if sigmas < MODERATE_MAX_SIGMA {
                    Magnitude::Moderate
                } else {
                    Magnitude::Significant
                })
            }
            _ => Some(self.tercile(value)),
        };

        FactToken {
            dimension,
            relation,
            magnitude,
        }
    }

    /// Buckets the rank fraction `better / (n - 1)` at 1/3 and 2/3, so the best value is
    /// always top third and the worst always bottom third. Tied values share a tercile:
    /// rank counts only strictly better scores.
    fn tercile(&self, value: f64) -> Magnitude {
        let last = self.values.len().saturating_sub(1);
        if last == 0 {
            return Magnitude::TopThird;
        }
        let better = self.values.iter().filter(|v| **v > value + EPSILON).count();
        if better * 3 < last {
            Magnitude::TopThird
        } else if better * 3 < 2 * last {
            Magnitude::MiddleThird
        } else {
            Magnitude::BottomThird
        }
    }
}

/// Facts for every candidate, in the order given, each list in dimension order.
pub fn cohort_facts(cohort: &[DimensionScores]) -> Vec<Vec<FactToken>> {
    let mut facts: Vec<Vec<FactToken>> = vec![Vec::with_capacity(Dimension::ALL.len()); cohort.len()];

    for dimension in Dimension::ALL {
        let informative: Vec<f64> = cohort
            .iter()
            .map(|s| s.get(dimension))
            .filter(|s| s.confidence > 0.0)
            .map(|s| s.score)
            .collect();
        let stats = CohortStats::new(informative, cohort.len());

        for (candidate_facts, scores) in facts.iter_mut().zip(cohort) {
            let score = scores.get(dimension);
            let fact = match &stats {
                Some(stats) if score.confidence > 0.0 => stats.describe(dimension, score.score),
                _ => FactToken {
                    dimension,
                    relation: Relation::NoData,
                    magnitude: None,
                },
            };
            candidate_facts.push(fact);
        }
    }

    facts
}

fn label(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Price => "price",
        Dimension::Delivery => "delivery time",
        Dimension::SkillsMatch => "skills match",
        Dimension::Experience => "experience",
    }
}

fn magnitude_text(magnitude: Magnitude) -> &'static str {
    match magnitude {
        Magnitude::Slight => "slight",
        Magnitude::Moderate => "moderate",
        Magnitude::Significant => "significant",
        Magnitude::TopThird => "top third",
        Magnitude::MiddleThird => "middle third",
        Magnitude::BottomThird => "bottom third",
    }
}

fn render_fact(fact: &FactToken, relation: &str) -> String {
    match fact.magnitude {
        Some(m) => format!("{}: {relation} ({})", label(fact.dimension), magnitude_text(m)),
        None => format!("{}: {relation}", label(fact.dimension)),
    }
}

/// Minimal fallback rendering used when no narrator is configured or it fails.
pub fn render_template(facts: &[FactToken]) -> Narrative {
    let mut narrative = Narrative {
        strengths: Vec::new(),
        weaknesses: Vec::new(),
        source: Source::Heuristic,
    };

    for fact in facts {
        match fact.relation {
            Relation::AboveMedian => narrative
                .strengths
                .push(render_fact(fact, "above cohort median")),
            Relation::BelowMedian => narrative
                .weaknesses
                .push(render_fact(fact, "below cohort median")),
            Relation::NoData => narrative
                .weaknesses
                .push(render_fact(fact, "not provided")),
            Relation::AtMedian => {}
        }
    }

    narrative
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::models::DimensionScore;

    fn uniform(score: f64) -> DimensionScores {
        let s = DimensionScore::new(score, 1.0);
        DimensionScores {
            price: s,
            delivery: s,
            skills_match: s,
            experience: s,
        }
    }

    fn fact_for(facts: &[FactToken], dimension: Dimension) -> FactToken {
        *facts.iter().find(|f| f.dimension == dimension).unwrap()
    }

    #[test]
    fn test_single_candidate_is_at_median() {
        let facts = cohort_facts(&[uniform(70.0)]);
        assert_eq!(facts.len(), 1);
        assert!(facts[0].iter().all(|f| f.relation == Relation::AtMedian));
        let n = render_template(&facts[0]);
        assert!(n.strengths.is_empty());
        assert!(n.weaknesses.is_empty());
    }

    #[test]
    fn test_small_cohort_uses_terciles() {
        let cohort = [uniform(90.0), uniform(60.0), uniform(30.0)];
        let facts = cohort_facts(&cohort);

        let top = fact_for(&facts[0], Dimension::Price);
        assert_eq!(top.relation, Relation::AboveMedian);
        assert_eq!(top.magnitude, Some(Magnitude::TopThird));

        let middle = fact_for(&facts[1], Dimension::Price);
        assert_eq!(middle.relation, Relation::AtMedian);
        assert_eq!(middle.magnitude, None);

        let bottom = fact_for(&facts[2], Dimension::Price);
        assert_eq!(bottom.relation, Relation::BelowMedian);
        assert_eq!(bottom.magnitude, Some(Magnitude::BottomThird));
    }

    #[test]
    fn test_large_cohort_uses_standard_deviation() {
        // mean 50, population sd = sqrt(800) ≈ 28.28, median 50
        let cohort: Vec<DimensionScores> =
            [10.0, 30.0, 50.0, 70.0, 90.0].iter().map(|v| uniform(*v)).collect();
        let facts = cohort_facts(&cohort);

        // 40 / 28.28 ≈ 1.41σ
        assert_eq!(
            fact_for(&facts[4], Dimension::SkillsMatch).magnitude,
            Some(Magnitude::Significant)
        );
        // 20 / 28.28 ≈ 0.71σ
        assert_eq!(
            fact_for(&facts[1], Dimension::SkillsMatch).magnitude,
            Some(Magnitude::Moderate)
        );
        assert_eq!(
            fact_for(&facts[1], Dimension::SkillsMatch).relation,
            Relation::BelowMedian
        );
    }

    #[test]
    fn test_slight_magnitude() {
        let cohort: Vec<DimensionScores> = [0.0, 48.0, 50.0, 52.0, 100.0]
            .iter()
            .map(|v| uniform(*v))
            .collect();
        let facts = cohort_facts(&cohort);
        assert_eq!(
            fact_for(&facts[3], Dimension::Experience).magnitude,
            Some(Magnitude::Slight)
        );
    }

    #[test]
    fn test_zero_confidence_becomes_no_data_and_is_excluded() {
        let mut missing_price = uniform(80.0);
        missing_price.price = DimensionScore::neutral();
        let cohort = [missing_price, uniform(40.0), uniform(60.0)];
        let facts = cohort_facts(&cohort);

        let price = fact_for(&facts[0], Dimension::Price);
        assert_eq!(price.relation, Relation::NoData);
        // Median of informative prices is 50; 60 sits above it.
        assert_eq!(
            fact_for(&facts[2], Dimension::Price).relation,
            Relation::AboveMedian
        );

        let n = render_template(&facts[0]);
        assert!(n.weaknesses.contains(&"price: not provided".to_string()));
    }

    #[test]
    fn test_ties_share_tercile() {
        let cohort = [uniform(80.0), uniform(80.0), uniform(20.0), uniform(10.0)];
        let facts = cohort_facts(&cohort);
        assert_eq!(
            fact_for(&facts[0], Dimension::Delivery).magnitude,
            Some(Magnitude::TopThird)
        );
        assert_eq!(
            fact_for(&facts[0], Dimension::Delivery).magnitude,
            fact_for(&facts[1], Dimension::Delivery).magnitude
        );
    }

    #[test]
    fn test_two_candidate_cohort_splits_top_and_bottom() {
        let facts = cohort_facts(&[uniform(100.0), uniform(50.0)]);
        assert_eq!(
            fact_for(&facts[0], Dimension::Price),
            FactToken {
                dimension: Dimension::Price,
                relation: Relation::AboveMedian,
                magnitude: Some(Magnitude::TopThird),
            }
        );
        assert_eq!(
            fact_for(&facts[1], Dimension::Price),
            FactToken {
                dimension: Dimension::Price,
                relation: Relation::BelowMedian,
                magnitude: Some(Magnitude::BottomThird),
            }
        );
    }

    #[test]
    fn test_four_candidate_terciles() {
        let cohort = [uniform(80.0), uniform(60.0), uniform(40.0), uniform(20.0)];
        let facts = cohort_facts(&cohort);
        let magnitudes: Vec<Option<Magnitude>> = facts
            .iter()
            .map(|f| fact_for(f, Dimension::Delivery).magnitude)
            .collect();
        assert_eq!(
            magnitudes,
            vec![
                Some(Magnitude::TopThird),
                Some(Magnitude::MiddleThird),
                Some(Magnitude::BottomThird),
                Some(Magnitude::BottomThird),
            ]
        );
    }

    #[test]
    fn test_magnitude_mode_follows_cohort_size_not_informative_count() {
        // Six candidates, only three priced: still a standard-deviation cohort.
        let mut cohort: Vec<DimensionScores> = [10.0, 50.0, 90.0, 70.0, 70.0, 70.0]
            .iter()
            .map(|v| uniform(*v))
            .collect();
        for scores in cohort.iter_mut().skip(3) {
            scores.price = DimensionScore::neutral();
        }
        let facts = cohort_facts(&cohort);

        // Informative prices 10/50/90: median 50, population sd ≈ 32.66, so 40 is ≈ 1.22σ.
        assert_eq!(
            fact_for(&facts[2], Dimension::Price).magnitude,
            Some(Magnitude::Significant)
        );
        assert_eq!(
            fact_for(&facts[0], Dimension::Price).magnitude,
            Some(Magnitude::Significant)
        );
        assert_eq!(fact_for(&facts[4], Dimension::Price).relation, Relation::NoData);
    }

    #[test]
    fn test_template_rendering() {
        let facts = [
            FactToken {
                dimension: Dimension::SkillsMatch,
                relation: Relation::AboveMedian,
                magnitude: Some(Magnitude::Significant),
            },
            FactToken {
                dimension: Dimension::Delivery,
                relation: Relation::BelowMedian,
                magnitude: Some(Magnitude::BottomThird),
            },
        ];
        let n = render_template(&facts);
        assert_eq!(n.strengths, vec!["skills match: above cohort median (significant)"]);
        assert_eq!(n.weaknesses, vec!["delivery time: below cohort median (bottom third)"]);
        assert_eq!(n.source, Source::Heuristic);
    }
}
