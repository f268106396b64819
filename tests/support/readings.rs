use document_repo::Model;
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "readings";

/// Sensor sample; `value` may be any `f64`, including NaN and infinities.
#[derive(Debug, Clone, Deserialize, Model)]
#[model(data = ReadingData, patch = ReadingData)]
pub struct Reading {
    pub id: String,
    pub sensor: String,
    pub value: f64,
    #[serde(default)]
    pub samples: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadingData {
    pub sensor: String,
    pub value: f64,
    pub samples: Vec<f64>,
}

impl ReadingData {
    pub fn new(sensor: &str, value: f64) -> Self {
        Self {
            sensor: sensor.to_string(),
            value,
            samples: Vec::new(),
        }
    }
}
