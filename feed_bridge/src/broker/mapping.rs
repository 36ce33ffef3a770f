//! Broker name <-> exchange id mapping.
//!
//! Host-side source identifiers are upper-case broker names (`GATEIO`); the
//! exchange library underneath uses its own lower-case ids (`gate`). Names
//! without an explicit mapping are lowercased.

const BROKERS_TO_EXCHANGES: &[(&str, &str)] = &[
    ("BINANCE", "binance"),
    ("BINANCEUS", "binanceus"),
    ("HITBTC", "hitbtc"),
    ("BITFINEX", "bitfinex"),
    ("KRAKEN", "kraken"),
    ("GATEIO", "gate"),
];

/// Exchange id for a broker name.
pub fn exchange_name(broker: &str) -> String {
    BROKERS_TO_EXCHANGES
        .iter()
        .find(|(b, _)| *b == broker)
        .map(|(_, e)| e.to_string())
        .unwrap_or_else(|| broker.to_lowercase())
}

/// Returns `true` if the exchange id is one the broker can stream from.
pub fn is_supported_exchange(exchange: &str) -> bool {
    BROKERS_TO_EXCHANGES.iter().any(|(_, e)| *e == exchange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_map_to_exchange_ids() {
        assert_eq!(exchange_name("GATEIO"), "gate");
        assert_eq!(exchange_name("BINANCEUS"), "binanceus");
    }

    #[test]
    fn unknown_names_are_lowercased() {
        assert_eq!(exchange_name("OKX"), "okx");
        assert!(!is_supported_exchange("okx"));
        assert!(is_supported_exchange("kraken"));
    }
}
