//! Risk events
//!
//! Emitted on halts, resumes, and failed pre-trade checks so the
//! status feed and logs can observe risk activity.

use serde::{Deserialize, Serialize};
use types::ids::{Symbol, UserId};
use uuid::Uuid;

/// One risk-engine occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub event_id: Uuid,
    pub kind: RiskEventKind,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RiskEventKind {
    SymbolHalted { symbol: Symbol, reason: String },
    SymbolResumed { symbol: Symbol },
    MarketHalted { reason: String },
    MarketResumed,
    CheckFailed { user_id: UserId, check: String, reason: String },
}

impl RiskEvent {
    pub fn new(kind: RiskEventKind, timestamp: i64) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            kind,
            timestamp,
        }
    }

    /// The symbol this event concerns, if any.
    pub fn symbol(&self) -> Option<&Symbol> {
        match &self.kind {
            RiskEventKind::SymbolHalted { symbol, .. }
            | RiskEventKind::SymbolResumed { symbol } => Some(symbol),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_extraction() {
        let halt = RiskEvent::new(
            RiskEventKind::SymbolHalted {
                symbol: Symbol::new("AAPL"),
                reason: "price move".to_string(),
            },
            1,
        );
        assert_eq!(halt.symbol().unwrap().as_str(), "AAPL");

        let market = RiskEvent::new(
            RiskEventKind::MarketHalted {
                reason: "operator".to_string(),
            },
            2,
        );
        assert!(market.symbol().is_none());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let event = RiskEvent::new(
            RiskEventKind::CheckFailed {
                user_id: UserId::new(7),
                check: "order_size".to_string(),
                reason: "too large".to_string(),
            },
            3,
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: RiskEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
