use niftyswing_core::config::Settings;
use std::collections::HashSet;

/// NIFTY 50 constituents as Yahoo Finance symbols.
pub const NIFTY50_TICKERS: [&str; 48] = [
    "RELIANCE.NS", "TCS.NS", "HDFCBANK.NS", "ICICIBANK.NS",
    "INFY.NS", "HINDUNILVR.NS", "KOTAKBANK.NS", "SBIN.NS", "ASIANPAINT.NS",
    "AXISBANK.NS", "LT.NS", "MARUTI.NS", "BAJFINANCE.NS", "WIPRO.NS",
    "ONGC.NS", "TITAN.NS", "ULTRACEMCO.NS", "SUNPHARMA.NS", "NESTLEIND.NS",
    "TECHM.NS", "BHARTIARTL.NS", "TATASTEEL.NS", "POWERGRID.NS", "NTPC.NS",
    "INDUSINDBK.NS", "BAJAJ-AUTO.NS", "M&M.NS", "BRITANNIA.NS", "HCLTECH.NS",
    "DRREDDY.NS", "EICHERMOT.NS", "ADANIPORTS.NS", "JSWSTEEL.NS", "CIPLA.NS",
    "GRASIM.NS", "BAJAJFINSV.NS", "HEROMOTOCO.NS", "COALINDIA.NS", "DIVISLAB.NS",
    "ITC.NS", "SBILIFE.NS", "UPL.NS", "BPCL.NS", "HINDALCO.NS", "TATAMOTORS.NS",
    "APOLLOHOSP.NS", "ADANIENT.NS", "TATACONSUM.NS",
];

/// `TICKERS` override if set, otherwise the NIFTY 50 list. Symbols are upper-cased and
/// de-duplicated, first occurrence wins.
pub fn resolve_universe(settings: &Settings) -> Vec<String> {
    let raw: Vec<String> = match &settings.tickers {
        Some(list) => list.clone(),
        None => NIFTY50_TICKERS.iter().map(|s| s.to_string()).collect(),
    };

    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|t| t.trim().to_ascii_uppercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| map.get(k).cloned()).unwrap()
    }

    #[test]
    fn defaults_to_nifty50_list() {
        let u = resolve_universe(&settings(&[]));
        assert_eq!(u.len(), NIFTY50_TICKERS.len());
        assert_eq!(u[0], "RELIANCE.NS");
        assert!(u.iter().any(|t| t == "M&M.NS"));
        assert!(u.iter().all(|t| t.ends_with(".NS")));
    }

    #[test]
    fn default_list_has_no_duplicates() {
        let unique: HashSet<_> = NIFTY50_TICKERS.iter().collect();
        assert_eq!(unique.len(), NIFTY50_TICKERS.len());
    }

    #[test]
    fn override_is_normalised_and_deduplicated() {
        let u = resolve_universe(&settings(&[("TICKERS", "tcs.ns, INFY.NS,TCS.NS")]));
        assert_eq!(u, vec!["TCS.NS", "INFY.NS"]);
    }
}
