//! Asset universe: parses the ticker list from configuration.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

/// Splits a comma-separated ticker list, trimming and upper-casing each
/// entry. Order is preserved; empty or repeated entries are rejected.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tickers_basic() {
        let result = parse_tickers("AAPL,JNJ,PG,JPM").unwrap();
        assert_eq!(result, vec!["AAPL", "JNJ", "PG", "JPM"]);
    }

    #[test]
    fn test_parse_tickers_with_whitespace() {
        let result = parse_tickers("  AAPL , JNJ ,PG,  KO  ").unwrap();
        assert_eq!(result, vec!["AAPL", "JNJ", "PG", "KO"]);
    }

    #[test]
    fn test_parse_tickers_uppercase() {
        let result = parse_tickers("aapl,msft").unwrap();
        assert_eq!(result, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_parse_tickers_empty_token() {
        assert_eq!(parse_tickers("AAPL,,KO"), Err(UniverseError::EmptyToken));
        assert_eq!(parse_tickers(""), Err(UniverseError::EmptyToken));
    }

    #[test]
    fn test_parse_tickers_duplicate() {
        let result = parse_tickers("AAPL,KO,aapl");
        assert!(matches!(result, Err(UniverseError::DuplicateTicker(s)) if s == "AAPL"));
    }
}
