use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Canonical upstream provider identifiers.
///
/// Every outgoing request is attributed to exactly one provider; pacing and
/// retry policies are keyed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Tencent,
    #[serde(rename = "eastmoney")]
    EastMoney,
    Cls,
    Sina,
    Futu,
    Ths,
    Sse,
    Szse,
}

impl ProviderId {
    pub const ALL: [Self; 8] = [
        Self::Tencent,
        Self::EastMoney,
        Self::Cls,
        Self::Sina,
        Self::Futu,
        Self::Ths,
        Self::Sse,
        Self::Szse,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tencent => "tencent",
            Self::EastMoney => "eastmoney",
            Self::Cls => "cls",
            Self::Sina => "sina",
            Self::Futu => "futu",
            Self::Ths => "ths",
            Self::Sse => "sse",
            Self::Szse => "szse",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_ids_serialize_lowercase() {
        let json = serde_json::to_string(&ProviderId::EastMoney).expect("must serialize");
        assert_eq!(json, "\"eastmoney\"");
    }

    #[test]
    fn all_lists_every_provider_once() {
        let mut names: Vec<&str> = ProviderId::ALL.iter().map(|p| p.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ProviderId::ALL.len());
    }
}
