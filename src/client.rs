use std::fmt::Write;

use anyhow::Context;
use serde_json::json;

use crate::io_struct::PredictResponse;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/predict";

#[derive(Debug)]
pub enum QueryOutcome {
    Prediction(PredictResponse),
    /// The service answered with something that is not a prediction.
    Failed { status: u16, body: String },
}

/// POST `{"url": image_url}` to a running service.
pub async fn query(
    client: &reqwest::Client,
    endpoint: &str,
    image_url: &str,
) -> anyhow::Result<QueryOutcome> {
    let resp = client
        .post(endpoint)
        .json(&json!({ "url": image_url }))
        .send()
        .await
        .with_context(|| format!("failed to reach {}", endpoint))?;
    let status = resp.status();
    let body = resp.text().await.context("failed to read response body")?;

    if status.is_success() {
        if let Ok(prediction) = serde_json::from_str::<PredictResponse>(&body) {
            return Ok(QueryOutcome::Prediction(prediction));
        }
    }
    Ok(QueryOutcome::Failed {
        status: status.as_u16(),
        body,
    })
}

/// Human-readable summary: the top class, then every class in label order.
pub fn format_prediction(prediction: &PredictResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Top prediction: {} ({:.2}%)",
        prediction.top_class,
        prediction.top_probability * 100.0
    );
    let _ = writeln!(out);
    out.push_str(&format_distribution(prediction));
    out
}

/// Output of the one-shot `classify` command.
pub fn format_classification(prediction: &PredictResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Predicted: {} ({:.2}%)",
        prediction.top_class,
        prediction.top_probability * 100.0
    );
    out.push_str(&format_distribution(prediction));
    out
}

fn format_distribution(prediction: &PredictResponse) -> String {
    let mut out = String::from("All predictions:\n");
    for (label, probability) in &prediction.predictions {
        let _ = writeln!(out, "  {:12}: {:.2}%", label, probability * 100.0);
    }
    out
}
