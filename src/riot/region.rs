//! Platform regions and their regional routing values

use crate::error::{BotError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Routing cluster serving account-v1 lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionalRoute {
    Americas,
    Europe,
    Asia,
}

impl RegionalRoute {
    pub fn host(self) -> &'static str {
        match self {
            RegionalRoute::Americas => "americas",
            RegionalRoute::Europe => "europe",
            RegionalRoute::Asia => "asia",
        }
    }
}

/// Platform a League account lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlatformRegion {
    Na1,
    Br1,
    La1,
    La2,
    Euw1,
    Eun1,
    Tr1,
    Me1,
    Oc1,
    Ru1,
    Jp1,
    Kr,
    Ph2,
    Sg2,
    Tw2,
    Th2,
    Vn2,
}

impl PlatformRegion {
    pub const ALL: [PlatformRegion; 17] = [
        PlatformRegion::Na1,
        PlatformRegion::Br1,
        PlatformRegion::La1,
        PlatformRegion::La2,
        PlatformRegion::Euw1,
        PlatformRegion::Eun1,
        PlatformRegion::Tr1,
        PlatformRegion::Me1,
        PlatformRegion::Oc1,
        PlatformRegion::Ru1,
        PlatformRegion::Jp1,
        PlatformRegion::Kr,
        PlatformRegion::Ph2,
        PlatformRegion::Sg2,
        PlatformRegion::Tw2,
        PlatformRegion::Th2,
        PlatformRegion::Vn2,
    ];

    /// Accept platform ids (`euw1`) and the short names players type (`euw`, `eune`)
    pub fn normalize(input: &str) -> Result<Self> {
        let lowered = input.trim().to_lowercase();
        let platform = match lowered.as_str() {
            "na" => "na1",
            "euw" => "euw1",
            "eune" => "eun1",
            "br" => "br1",
            "jp" => "jp1",
            "oc" => "oc1",
            "ru" => "ru1",
            "tr" => "tr1",
            "la" => "la1",
            other => other,
        };

        Self::ALL
            .iter()
            .copied()
            .find(|region| region.as_str() == platform)
            .ok_or_else(|| {
                BotError::InvalidRegion {
                    region: input.trim().to_string(),
                }
                .into()
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlatformRegion::Na1 => "na1",
            PlatformRegion::Br1 => "br1",
            PlatformRegion::La1 => "la1",
            PlatformRegion::La2 => "la2",
            PlatformRegion::Euw1 => "euw1",
            PlatformRegion::Eun1 => "eun1",
            PlatformRegion::Tr1 => "tr1",
            PlatformRegion::Me1 => "me1",
            PlatformRegion::Oc1 => "oc1",
            PlatformRegion::Ru1 => "ru1",
            PlatformRegion::Jp1 => "jp1",
            PlatformRegion::Kr => "kr",
            PlatformRegion::Ph2 => "ph2",
            PlatformRegion::Sg2 => "sg2",
            PlatformRegion::Tw2 => "tw2",
            PlatformRegion::Th2 => "th2",
            PlatformRegion::Vn2 => "vn2",
        }
    }

    pub fn route(self) -> RegionalRoute {
        match self {
            PlatformRegion::Na1
            | PlatformRegion::Br1
            | PlatformRegion::La1
            | PlatformRegion::La2 => RegionalRoute::Americas,
            PlatformRegion::Euw1
            | PlatformRegion::Eun1
            | PlatformRegion::Tr1
            | PlatformRegion::Me1 => RegionalRoute::Europe,
            PlatformRegion::Oc1
            | PlatformRegion::Ru1
            | PlatformRegion::Jp1
            | PlatformRegion::Kr
            | PlatformRegion::Ph2
            | PlatformRegion::Sg2
            | PlatformRegion::Tw2
            | PlatformRegion::Th2
            | PlatformRegion::Vn2 => RegionalRoute::Asia,
        }
    }

    /// Region segment of op.gg profile URLs (`euw1` -> `euw`)
    pub fn opgg_slug(self) -> &'static str {
        self.as_str().trim_end_matches(|c: char| c.is_ascii_digit())
    }
}

impl fmt::Display for PlatformRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformRegion {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::normalize(value)
    }
}

impl TryFrom<String> for PlatformRegion {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::normalize(&value)
    }
}

impl From<PlatformRegion> for String {
    fn from(region: PlatformRegion) -> Self {
        region.as_str().to_string()
    }
}

/// op.gg profile link for a Riot ID
pub fn opgg_url(region: PlatformRegion, game_name: &str, tag_line: &str) -> String {
    format!(
        "https://www.op.gg/summoners/{}/{}-{}",
        region.opgg_slug(),
        encode_path_segment(game_name),
        encode_path_segment(tag_line)
    )
}

/// Percent-encode everything outside the URI unreserved set
pub fn encode_path_segment(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names_normalize() {
        assert_eq!(PlatformRegion::normalize("na").unwrap(), PlatformRegion::Na1);
        assert_eq!(PlatformRegion::normalize("EUW").unwrap(), PlatformRegion::Euw1);
        assert_eq!(PlatformRegion::normalize("eune").unwrap(), PlatformRegion::Eun1);
        assert_eq!(PlatformRegion::normalize(" kr ").unwrap(), PlatformRegion::Kr);
        assert_eq!(PlatformRegion::normalize("la").unwrap(), PlatformRegion::La1);
    }

    #[test]
    fn test_platform_ids_pass_through() {
        for region in PlatformRegion::ALL {
            assert_eq!(PlatformRegion::normalize(region.as_str()).unwrap(), region);
        }
    }

    #[test]
    fn test_unknown_region_rejected() {
        let err = PlatformRegion::normalize("atlantis").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BotError>(),
            Some(BotError::InvalidRegion { region }) if region == "atlantis"
        ));
    }

    #[test]
    fn test_routes() {
        assert_eq!(PlatformRegion::Na1.route(), RegionalRoute::Americas);
        assert_eq!(PlatformRegion::La2.route(), RegionalRoute::Americas);
        assert_eq!(PlatformRegion::Me1.route(), RegionalRoute::Europe);
        assert_eq!(PlatformRegion::Tr1.route(), RegionalRoute::Europe);
        assert_eq!(PlatformRegion::Oc1.route(), RegionalRoute::Asia);
        assert_eq!(PlatformRegion::Vn2.route(), RegionalRoute::Asia);
        assert_eq!(PlatformRegion::Kr.route().host(), "asia");
    }

    #[test]
    fn test_opgg_url() {
        assert_eq!(
            opgg_url(PlatformRegion::Euw1, "Some Name", "EUW"),
            "https://www.op.gg/summoners/euw/Some%20Name-EUW"
        );
        assert_eq!(PlatformRegion::Kr.opgg_slug(), "kr");
    }

    #[test]
    fn test_serde_uses_platform_id() {
        let json = serde_json::to_string(&PlatformRegion::Eun1).unwrap();
        assert_eq!(json, "\"eun1\"");
        let region: PlatformRegion = serde_json::from_str("\"eune\"").unwrap();
        assert_eq!(region, PlatformRegion::Eun1);
        assert!(serde_json::from_str::<PlatformRegion>("\"mars\"").is_err());
    }
}
