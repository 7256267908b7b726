//! Facility type codes used by WMDR and OSCAR/Surface.
//!
//! WMDR records reference a facility type by a code (the last segment of
//! a `codes.wmo.int` URL); the OSCAR REST API speaks human labels. This
//! table maps one to the other and is also the set of values the CLI
//! accepts for `--station-type`.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::OscarError;

/// Physical siting classification of an observing facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
#[value(rename_all = "camelCase")]
pub enum FacilityType {
    SeaMobile,
    UnderwaterFixed,
    UnderwaterMobile,
    AirMobile,
    LakeRiverMobile,
    SeaOnIce,
    LandMobile,
    LandFixed,
    LakeRiverFixed,
    SeaFixed,
    AirFixed,
    LandOnIce,
}

impl FacilityType {
    /// Every facility type, in table order.
    pub const ALL: [FacilityType; 12] = [
        Self::SeaMobile,
        Self::UnderwaterFixed,
        Self::UnderwaterMobile,
        Self::AirMobile,
        Self::LakeRiverMobile,
        Self::SeaOnIce,
        Self::LandMobile,
        Self::LandFixed,
        Self::LakeRiverFixed,
        Self::SeaFixed,
        Self::AirFixed,
        Self::LandOnIce,
    ];

    /// Short code as it appears in WMDR code-list URLs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::SeaMobile => "seaMobile",
            Self::UnderwaterFixed => "underwaterFixed",
            Self::UnderwaterMobile => "underwaterMobile",
            Self::AirMobile => "airMobile",
            Self::LakeRiverMobile => "lakeRiverMobile",
            Self::SeaOnIce => "seaOnIce",
            Self::LandMobile => "landMobile",
            Self::LandFixed => "landFixed",
            Self::LakeRiverFixed => "lakeRiverFixed",
            Self::SeaFixed => "seaFixed",
            Self::AirFixed => "airFixed",
            Self::LandOnIce => "landOnIce",
        }
    }

    /// Human-readable label used by the OSCAR REST API.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::SeaMobile => "Sea (mobile)",
            Self::UnderwaterFixed => "Underwater (fixed)",
            Self::UnderwaterMobile => "Underwater (mobile)",
            Self::AirMobile => "Air (mobile)",
            Self::LakeRiverMobile => "Lake/River (mobile)",
            Self::SeaOnIce => "Sea (on ice)",
            Self::LandMobile => "Land (mobile)",
            Self::LandFixed => "Land (fixed)",
            Self::LakeRiverFixed => "Lake/River (fixed)",
            Self::SeaFixed => "Sea (fixed)",
            Self::AirFixed => "Air (fixed)",
            Self::LandOnIce => "Land (on ice)",
        }
    }

    /// Iterate over `(code, label)` pairs.
    pub fn entries() -> impl Iterator<Item = (&'static str, &'static str)> {
        Self::ALL.iter().map(|t| (t.code(), t.label()))
    }
}

impl FromStr for FacilityType {
    type Err = OscarError;

    /// Resolve a short code; unknown codes are a lookup failure.
    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or_else(|| OscarError::UnknownFacilityType(code.to_string()))
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Resolve a facility type code to its label.
///
/// # Examples
/// ```
/// use oscar_client::facility::facility_type_label;
///
/// assert_eq!(facility_type_label("landFixed").unwrap(), "Land (fixed)");
/// assert!(facility_type_label("moonFixed").is_err());
/// ```
pub fn facility_type_label(code: &str) -> crate::error::Result<&'static str> {
    code.parse::<FacilityType>().map(|t| t.label())
}
