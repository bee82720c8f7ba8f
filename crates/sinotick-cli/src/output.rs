//! Response envelope and JSON rendering.

use serde::Serialize;
use uuid::Uuid;

use sinotick_core::{CstDateTime, ProviderId, Records};

use crate::error::CliError;

/// Metadata block attached to every successful response.
#[derive(Debug, Serialize)]
pub struct EnvelopeMeta {
    pub request_id: Uuid,
    pub generated_at: CstDateTime,
    pub source: ProviderId,
    pub latency_ms: u64,
    pub warnings: Vec<String>,
}

/// The single output shape: metadata plus the fetched records.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub meta: EnvelopeMeta,
    pub data: Records,
}

impl Envelope {
    pub fn new(source: ProviderId, latency_ms: u64, warnings: Vec<String>, data: Records) -> Self {
        Self {
            meta: EnvelopeMeta {
                request_id: Uuid::new_v4(),
                generated_at: CstDateTime::now(),
                source,
                latency_ms,
                warnings,
            },
            data,
        }
    }
}

pub fn render(envelope: &Envelope, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };
    println!("{payload}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_meta_and_flat_data() {
        let envelope = Envelope::new(
            ProviderId::Tencent,
            7,
            vec![String::from("no bars in the requested range")],
            Records::Candles(Vec::new()),
        );
        let value = serde_json::to_value(&envelope).expect("must serialize");

        assert_eq!(value["meta"]["source"], "tencent");
        assert_eq!(value["meta"]["latency_ms"], 7);
        assert_eq!(value["meta"]["warnings"][0], "no bars in the requested range");
        assert!(value["meta"]["request_id"].is_string());
        // Records is untagged, so the candle list sits directly under data.
        assert!(value["data"].as_array().is_some_and(Vec::is_empty));
    }
}
