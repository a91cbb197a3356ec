use chrono_tz::{America::New_York, Asia::Taipei, Tz};

/// Canonical data-source code of the dollar index.
pub const DOLLAR_INDEX: &str = "DX-Y.NYB";

/// Dollar-index futures contract queried when the index itself returns nothing.
pub const DOLLAR_INDEX_FUTURES: &str = "DX=F";

/// Suffix appended to purely numeric local equity codes.
pub const DOMESTIC_SUFFIX: &str = ".TW";

static ALIASES: &[(&str, &str)] = &[
    ("DXY", DOLLAR_INDEX),
    ("USDIDX", DOLLAR_INDEX),
    ("GOLD", "GC=F"),
    ("BITCOIN", "BTC-USD"),
];

static DOMESTIC_SUFFIXES: &[&str] = &[".TW", ".TWO"];

static FALLBACKS: &[(&str, &str)] = &[(DOLLAR_INDEX, DOLLAR_INDEX_FUTURES)];

/// Map a user-typed code onto the data source's canonical symbol.
pub fn normalize_symbol(raw: &str) -> String {
    let code = raw.trim().to_uppercase();
    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == code) {
        return (*canonical).to_string();
    }
    if code.len() >= 3 && code.chars().all(|c| c.is_ascii_digit()) {
        return format!("{code}{DOMESTIC_SUFFIX}");
    }
    code
}

pub fn is_domestic_equity(symbol: &str) -> bool {
    DOMESTIC_SUFFIXES
        .iter()
        .any(|suffix| symbol.ends_with(suffix))
}

/// Alternate symbol to query once when `symbol` returns no rows.
pub fn fallback_symbol(symbol: &str) -> Option<&'static str> {
    FALLBACKS
        .iter()
        .find(|(primary, _)| *primary == symbol)
        .map(|(_, alternate)| *alternate)
}

pub fn exchange_timezone(symbol: &str) -> Tz {
    if is_domestic_equity(symbol) {
        Taipei
    } else {
        New_York
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_get_exchange_suffix() {
        assert_eq!(normalize_symbol("2330"), "2330.TW");
        assert_eq!(normalize_symbol(" 0050 "), "0050.TW");
        assert_eq!(normalize_symbol("12"), "12");
    }

    #[test]
    fn aliases_resolve_case_insensitively() {
        assert_eq!(normalize_symbol("dxy"), DOLLAR_INDEX);
        assert_eq!(normalize_symbol("UsdIdx"), DOLLAR_INDEX);
        assert_eq!(normalize_symbol("gold"), "GC=F");
        assert_eq!(normalize_symbol("Bitcoin "), "BTC-USD");
    }

    #[test]
    fn other_symbols_pass_through_uppercased() {
        assert_eq!(normalize_symbol("NVDA"), "NVDA");
        assert_eq!(normalize_symbol("tsla"), "TSLA");
        assert_eq!(normalize_symbol("^ixic"), "^IXIC");
        assert_eq!(normalize_symbol(""), "");
    }

    #[test]
    fn domestic_detection_and_timezone() {
        assert!(is_domestic_equity("2330.TW"));
        assert!(is_domestic_equity("6488.TWO"));
        assert!(!is_domestic_equity("NVDA"));
        assert_eq!(exchange_timezone("2330.TW"), Taipei);
        assert_eq!(exchange_timezone("GC=F"), New_York);
    }

    #[test]
    fn only_dollar_index_has_fallback() {
        assert_eq!(fallback_symbol(DOLLAR_INDEX), Some(DOLLAR_INDEX_FUTURES));
        assert_eq!(fallback_symbol("NVDA"), None);
    }
}
