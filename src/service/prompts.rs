//! Prompt construction for the prediction pipeline
//!
//! Pure functions: no I/O, no randomness. The same crisis, signal bag, and
//! timestamp always render the same prompt, which is what makes the
//! pipeline's most fragile stage testable.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::model::{Crisis, SignalBag};

/// Build the final prediction prompt from the crisis and its aggregated
/// signal bag.
///
/// Embeds the output schema example with the exact crisis id and the passed
/// timestamp so the model is told precisely what to echo (those two fields
/// are overwritten after decoding regardless), instructions to use only the
/// supplied data, and every non-empty bag entry as a labeled line in stable
/// order. The crisis's static fields reach the prompt through the bag,
/// which the aggregator populates even when every live source failed.
pub fn build_prediction_prompt(crisis: &Crisis, bag: &SignalBag, now: DateTime<Utc>) -> String {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);

    let signal_lines = if bag.is_empty() {
        "No real-time signals were available for this crisis.".to_string()
    } else {
        bag.iter()
            .map(|(label, snippet)| format!("[{}]\n{}", label, snippet))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        r#"You are a disaster impact analyst. Predict the short-term development of the
crisis described below, using ONLY the supplied data. Do not invent facts,
casualty figures, or locations that are not supported by the data.

## Crisis
- id: {id}
- currently affected population: {affected_population}

## Crisis data and real-time signals
{signal_lines}

## Required output

Respond with a single JSON document and nothing else, following this schema
exactly (optional fields may be omitted when the data does not support them):

{{
  "id": "{id}",
  "timestamp": "{timestamp}",
  "predictionNarrative": "2-4 sentence summary of the expected development",
  "sixHourOutlook": "expected situation in the next 6 hours",
  "twentyFourHourOutlook": "expected situation in the next 24 hours",
  "estimatedNewAffectedPopulation": 0,
  "criticalInfrastructureAtRisk": ["names of roads, hospitals, utilities at risk"],
  "recommendedImmediateActions": ["concrete actions for responders"],
  "riskHeatmapPoints": [{{"latitude": 0.0, "longitude": 0.0, "intensity": 0.5}}],
  "predictedSpreadPolygons": [{{"points": [{{"latitude": 0.0, "longitude": 0.0}}]}}]
}}

Field rules:
- "id" and "timestamp" must be echoed back exactly as shown above.
- "predictionNarrative" is required; ground it in the signals section.
- "estimatedNewAffectedPopulation" is the additional population expected to
  be affected beyond the current figure; a non-negative integer.
- "intensity" values must be between 0.0 and 1.0.
- each polygon in "predictedSpreadPolygons" must have at least 3 points.
- omit any optional field rather than guessing."#,
        id = crisis.id,
        affected_population = crisis.affected_population,
        signal_lines = signal_lines,
        timestamp = timestamp,
    )
}

/// Build the secondary background-context prompt.
///
/// A deliberately small request: a few factual sentences about the area's
/// history with this kind of event, used as one more signal in the bag.
pub fn build_context_prompt(crisis: &Crisis) -> String {
    format!(
        r#"In 3-5 factual sentences, summarize relevant background for the following
emergency: historical precedent for this kind of event in the area, notable
geographic or structural risk factors, and typical progression. Plain text,
no speculation about the current event beyond the given description.

- name: {name}
- location: {location}
- description: {description}"#,
        name = crisis.name,
        location = crisis.location,
        description = crisis.description,
    )
}
