use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Bullish => "Bullish",
            Sentiment::Bearish => "Bearish",
            Sentiment::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wire forms follow the classifier's schema: "BUY (DCA)", "HOLD", "WAIT".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "BUY (DCA)")]
    Buy,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "WAIT")]
    Wait,
}

impl Recommendation {
    /// Alerts fire if and only if this is the BUY variant.
    pub fn is_buy(&self) -> bool {
        matches!(self, Recommendation::Buy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Buy => "BUY (DCA)",
            Recommendation::Hold => "HOLD",
            Recommendation::Wait => "WAIT",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured classifier output. All nine fields are required; a response
/// missing any of them never becomes a `Verdict` (it is rejected at the
/// classifier boundary as a malformed response).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub sentiment: Sentiment,
    pub recommendation: Recommendation,
    pub detected_pattern: String,
    #[serde(rename = "reasoning")]
    pub rationale: String,
    pub support_level: f64,
    pub resistance_level: f64,
    pub entry_point: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_wire_forms() {
        let buy: Recommendation = serde_json::from_str("\"BUY (DCA)\"").unwrap();
        assert!(buy.is_buy());
        let hold: Recommendation = serde_json::from_str("\"HOLD\"").unwrap();
        assert!(!hold.is_buy());
        let wait: Recommendation = serde_json::from_str("\"WAIT\"").unwrap();
        assert!(!wait.is_buy());

        assert_eq!(serde_json::to_string(&buy).unwrap(), "\"BUY (DCA)\"");
    }

    #[test]
    fn unknown_recommendation_is_rejected() {
        let res: Result<Recommendation, _> = serde_json::from_str("\"SELL\"");
        assert!(res.is_err());
    }

    #[test]
    fn verdict_requires_every_field() {
        // stopLoss omitted
        let partial = serde_json::json!({
            "sentiment": "Bullish",
            "recommendation": "BUY (DCA)",
            "detectedPattern": "Double bottom",
            "reasoning": "Higher lows into resistance.",
            "supportLevel": 64000.0,
            "resistanceLevel": 67000.0,
            "entryPoint": 64500.0,
            "takeProfit": 68000.0
        });
        let res: Result<Verdict, _> = serde_json::from_value(partial);
        assert!(res.is_err());
    }

    #[test]
    fn verdict_parses_when_complete() {
        let full = serde_json::json!({
            "sentiment": "Neutral",
            "recommendation": "WAIT",
            "detectedPattern": "Range",
            "reasoning": "No edge at current levels.",
            "supportLevel": 64000.0,
            "resistanceLevel": 67000.0,
            "entryPoint": 64500.0,
            "takeProfit": 68000.0,
            "stopLoss": 63000.0
        });
        let v: Verdict = serde_json::from_value(full).unwrap();
        assert_eq!(v.recommendation, Recommendation::Wait);
        assert_eq!(v.sentiment, Sentiment::Neutral);
        assert!((v.stop_loss - 63000.0).abs() < 1e-9);
    }
}
