//! Hostname parsing
//!
//! Hostnames follow `<region><building><delims><unit>`, where the region is a
//! direction letter (`e`/`w`) plus two digits, e.g. `e01a02--csw1`.

use regex::Regex;
use std::sync::LazyLock;

use super::types::ParsedHostname;

pub const UNKNOWN_PREFECTURE: &str = "unknown-pref";
pub const UNKNOWN_BUILDING: &str = "unknown-building";

/// Region prefix, non-greedy building token, one or more `-`, unit token
static HOSTNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^((e|w)(\d{2}))(.+?)-+(.+)$").unwrap());

/// Split a hostname into prefecture, building and unit codes.
///
/// Never fails: hostnames that do not follow the pattern get sentinel
/// prefecture/building codes and keep the whole hostname as the unit code.
pub fn parse_hostname(hostname: &str) -> ParsedHostname {
    let Some(captures) = HOSTNAME_RE.captures(hostname) else {
        return ParsedHostname {
            raw: hostname.to_string(),
            prefecture_code: UNKNOWN_PREFECTURE.to_string(),
            building_code: UNKNOWN_BUILDING.to_string(),
            unit_code: hostname.to_string(),
        };
    };

    let group = |i: usize| {
        captures
            .get(i)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default()
    };

    ParsedHostname {
        raw: hostname.to_string(),
        prefecture_code: group(1),
        building_code: group(4),
        unit_code: group(5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_building_host() {
        let parsed = parse_hostname("e01a02--csw1");
        assert_eq!(parsed.raw, "e01a02--csw1");
        assert_eq!(parsed.prefecture_code, "e01");
        assert_eq!(parsed.building_code, "a02");
        assert_eq!(parsed.unit_code, "csw1");
    }

    #[test]
    fn test_parse_lowercases_codes_but_keeps_raw() {
        let parsed = parse_hostname("W03CORE-GWR2");
        assert_eq!(parsed.raw, "W03CORE-GWR2");
        assert_eq!(parsed.prefecture_code, "w03");
        assert_eq!(parsed.building_code, "core");
        assert_eq!(parsed.unit_code, "gwr2");
    }

    #[test]
    fn test_building_token_is_non_greedy() {
        // First delimiter run ends the building token; later dashes stay in the unit
        let parsed = parse_hostname("e02b10---asw-1");
        assert_eq!(parsed.building_code, "b10");
        assert_eq!(parsed.unit_code, "asw-1");
    }

    #[test]
    fn test_unparseable_hostname_gets_sentinels() {
        for hostname in ["router1", "x01a01--sw1", "e1a01--sw1", "e01a01", ""] {
            let parsed = parse_hostname(hostname);
            assert_eq!(parsed.prefecture_code, UNKNOWN_PREFECTURE, "{hostname}");
            assert_eq!(parsed.building_code, UNKNOWN_BUILDING, "{hostname}");
            assert_eq!(parsed.unit_code, hostname);
        }
    }
}
