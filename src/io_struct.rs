use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;
use crate::postprocess::Prediction;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictRequest {
    pub url: Url,
}

impl PredictRequest {
    /// Only absolute http(s) URLs with a host are accepted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ValidationError(format!(
                    "url scheme '{}' is not allowed, expected http or https",
                    other
                )));
            }
        }
        if self.url.host_str().is_none_or(str::is_empty) {
            return Err(ValidationError("url must contain a host".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PredictResponse {
    #[serde(with = "ordered_map")]
    pub predictions: Vec<(String, f64)>,
    pub top_class: String,
    pub top_probability: f64,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        PredictResponse {
            predictions: prediction.distribution,
            top_class: prediction.top_class,
            top_probability: prediction.top_probability,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub error_type: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>, error_type: &str) -> Self {
        ErrorResponse {
            detail: detail.into(),
            error_type: error_type.to_string(),
        }
    }
}

/// Serializes `(label, probability)` pairs as a JSON object, keeping label order.
mod ordered_map {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(entries: &[(String, f64)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (label, probability) in entries {
            map.serialize_entry(label, probability)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, f64)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Vec<(String, f64)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of class label to probability")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((label, probability)) = access.next_entry::<String, f64>()? {
                    entries.push((label, probability));
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
