//! Pure scoring rules for document and company ratings. No I/O.

use chrono::{DateTime, Utc};

use super::domain::{
    CompanyId, CompanyRating, DocumentRating, DocumentSignal, DocumentStatus, RatingLevel,
    ScoreBreakdown,
};

const CONFIDENCE_WEIGHT: f64 = 50.0;
const CONFIRMED_BONUS: f64 = 20.0;
const PENDING_BONUS: f64 = 5.0;
const META_WEIGHT: f64 = 20.0;
const SPEED_WEIGHT: f64 = 10.0;
const SPEED_WINDOW_SECONDS: f64 = 60.0;

/// Classify a numeric score into its letter grade.
///
/// Total over all reals; the lower bound of each band is inclusive.
pub fn grade(score: f64) -> RatingLevel {
    if score >= 85.0 {
        RatingLevel::A
    } else if score >= 70.0 {
        RatingLevel::B
    } else if score >= 50.0 {
        RatingLevel::C
    } else {
        RatingLevel::D
    }
}

/// Score a single document from its intake signals.
///
/// Four independent terms are summed, clamped to [0, 100], and rounded to two
/// decimals. The reported breakdown rounds each term separately from the
/// unrounded intermediates, so summing the breakdown can differ from the
/// score by a cent; the score is authoritative.
pub fn score_document(signal: &DocumentSignal, computed_at: DateTime<Utc>) -> DocumentRating {
    let confidence = (signal.classify_confidence.unwrap_or(0.0) * CONFIDENCE_WEIGHT)
        .clamp(0.0, CONFIDENCE_WEIGHT);

    let status_bonus = match signal.status {
        DocumentStatus::Confirmed => CONFIRMED_BONUS,
        DocumentStatus::Pending => PENDING_BONUS,
        _ => 0.0,
    };

    let meta_completeness = signal.meta.completeness() * META_WEIGHT;

    let speed_bonus = match (signal.uploaded_at, signal.classified_at) {
        (Some(uploaded), Some(classified)) => {
            let millis = classified.signed_duration_since(uploaded).num_milliseconds();
            // Negative turnaround means clock skew upstream; treat as instant.
            let delta_seconds = (millis as f64 / 1000.0).max(0.0);
            if delta_seconds < SPEED_WINDOW_SECONDS {
                ((SPEED_WINDOW_SECONDS - delta_seconds) / SPEED_WINDOW_SECONDS * SPEED_WEIGHT)
                    .clamp(0.0, SPEED_WEIGHT)
            } else {
                0.0
            }
        }
        _ => 0.0,
    };

    let total = confidence + status_bonus + meta_completeness + speed_bonus;
    let score = round2(total.clamp(0.0, 100.0));

    DocumentRating {
        document_id: signal.document_id.clone(),
        company_id: signal.company_id.clone(),
        score,
        level: grade(score),
        breakdown: ScoreBreakdown {
            confidence: round2(confidence),
            status_bonus: round2(status_bonus),
            meta_completeness: round2(meta_completeness),
            speed_bonus: round2(speed_bonus),
        },
        computed_at,
    }
}

/// Fold document ratings into the company aggregate.
///
/// The mean is taken over exactly the ratings passed in, never over
/// previously persisted scores. An empty batch scores zero.
pub fn aggregate_company(
    company_id: CompanyId,
    docs: &[DocumentRating],
    computed_at: DateTime<Utc>,
) -> CompanyRating {
    let score = if docs.is_empty() {
        0.0
    } else {
        round2(docs.iter().map(|doc| doc.score).sum::<f64>() / docs.len() as f64)
    };

    CompanyRating {
        company_id,
        score,
        level: grade(score),
        computed_at,
        docs: None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
