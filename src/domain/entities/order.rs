use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Direction of a trade. Kept as a closed enum so an unrecognized side is
/// rejected at the parse boundary instead of propagating as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Wire name used by the exchange's `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            other => Err(format!("unrecognized order side: {}", other)),
        }
    }
}

/// Receipt returned by the exchange for an accepted order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderReceipt {
    /// Transaction ids assigned by the exchange.
    #[serde(default)]
    pub txid: Vec<String>,
    /// Human-readable order description.
    #[serde(default)]
    pub descr: OrderDescription,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderDescription {
    #[serde(default)]
    pub order: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_side_parse() {
        assert_eq!("buy".parse::<OrderSide>().unwrap(), OrderSide::Buy);
        assert_eq!("SELL".parse::<OrderSide>().unwrap(), OrderSide::Sell);
    }

    #[test]
    fn test_order_side_parse_unrecognized() {
        assert!("hodl".parse::<OrderSide>().is_err());
        assert!("".parse::<OrderSide>().is_err());
    }

    #[test]
    fn test_order_side_round_trip() {
        assert_eq!(OrderSide::Buy.as_str(), "buy");
        assert_eq!(OrderSide::Sell.to_string(), "sell");
    }

    #[test]
    fn test_order_receipt_deserialization() {
        let json = r#"{
            "txid": ["OUF4EM-FRGI2-MQMWZD"],
            "descr": {"order": "buy 1.25000000 XBTUSDT @ limit 27500.0"}
        }"#;
        let receipt: OrderReceipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.txid, vec!["OUF4EM-FRGI2-MQMWZD".to_string()]);
        assert!(receipt.descr.order.starts_with("buy"));
    }

    #[test]
    fn test_order_receipt_tolerates_missing_fields() {
        let receipt: OrderReceipt = serde_json::from_str("{}").unwrap();
        assert!(receipt.txid.is_empty());
        assert!(receipt.descr.order.is_empty());
    }
}
