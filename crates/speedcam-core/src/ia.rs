//! The `Ia` identifier — `"<ISD>-<AS>"`, e.g. `"1-7"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// An opaque Autonomous System identifier, parsed from `"<ISD>-<AS>"`.
///
/// `Ia` is a plain value type: it implements `Eq`/`Hash`/`Ord` so it can be used
/// directly as a map key, and cloning it is cheap (two `u64`s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ia {
    isd: u64,
    asn: u64,
}

impl Ia {
    pub fn new(isd: u64, asn: u64) -> Self {
        Self { isd, asn }
    }

    pub fn isd(&self) -> u64 {
        self.isd
    }

    pub fn asn(&self) -> u64 {
        self.asn
    }
}

impl fmt::Display for Ia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.isd, self.asn)
    }
}

impl FromStr for Ia {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (isd_part, asn_part) = s.split_once('-').ok_or_else(|| {
            Error::InvalidInput(format!("IA '{s}' is not of the form '<ISD>-<AS>'"))
        })?;
        let isd = isd_part
            .parse::<u64>()
            .map_err(|_| Error::InvalidInput(format!("IA '{s}' has a non-numeric ISD")))?;
        let asn = asn_part
            .parse::<u64>()
            .map_err(|_| Error::InvalidInput(format!("IA '{s}' has a non-numeric AS")))?;
        Ok(Ia { isd, asn })
    }
}

impl TryFrom<String> for Ia {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Ia> for String {
    fn from(ia: Ia) -> Self {
        ia.to_string()
    }
}
