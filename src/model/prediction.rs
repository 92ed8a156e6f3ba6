//! Structured prediction output decoded from the generative backend.
//!
//! The backend is an untrusted data source: every field here is decoded
//! defensively, and the identity fields (`id`, `timestamp`) are always
//! overwritten after decoding regardless of what the model returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::crisis::Coordinates;

/// A single heatmap sample inside a prediction.
///
/// `intensity` is nominally in [0, 1] but out-of-range values from the
/// model are accepted as-is; consumers decide how to render them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub intensity: f64,
}

/// A predicted spread polygon: an ordered ring of coordinate pairs.
/// Rings with fewer than 3 vertices are dropped during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Coordinates>,
}

// The durable output unit of the prediction pipeline, cached by crisis id.
// - id: always equals the originating crisis id (overwritten post-decode)
// - timestamp: generation time (overwritten post-decode)
// - outlooks: short-term (6h) and medium-term (24h) free text
// Every other field is optional: a payload missing all of them still decodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisPrediction {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub prediction_narrative: String,
    #[serde(default)]
    pub six_hour_outlook: Option<String>,
    #[serde(default)]
    pub twenty_four_hour_outlook: Option<String>,
    #[serde(default)]
    pub estimated_new_affected_population: Option<u64>,
    #[serde(default)]
    pub critical_infrastructure_at_risk: Option<Vec<String>>,
    #[serde(default)]
    pub recommended_immediate_actions: Option<Vec<String>>,
    #[serde(default)]
    pub risk_heatmap_points: Option<Vec<HeatmapPoint>>,
    #[serde(default)]
    pub predicted_spread_polygons: Option<Vec<Polygon>>,
}

impl CrisisPrediction {
    /// Post-decode normalization: the trust boundary between the model's
    /// answer and the rest of the system.
    ///
    /// Forces `id` and `timestamp` to known-correct values (the model's own
    /// values for these fields are never trusted) and drops malformed
    /// polygons (fewer than 3 vertices) while keeping well-formed siblings.
    pub fn normalize(mut self, crisis_id: &str, now: DateTime<Utc>) -> Self {
        self.id = crisis_id.to_string();
        self.timestamp = now;

        if let Some(polygons) = self.predicted_spread_polygons.take() {
            let kept: Vec<Polygon> = polygons
                .into_iter()
                .filter(|p| {
                    if p.points.len() < 3 {
                        tracing::warn!(
                            crisis = %self.id,
                            vertices = p.points.len(),
                            "Dropping malformed spread polygon"
                        );
                        false
                    } else {
                        true
                    }
                })
                .collect();
            self.predicted_spread_polygons = if kept.is_empty() { None } else { Some(kept) };
        }

        self
    }

    /// Age of this prediction relative to `now`, in whole seconds.
    /// Negative ages (timestamp in the future) clamp to zero.
    pub fn age_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.timestamp).num_seconds().max(0) as u64
    }
}
