use serde::{Deserialize, Serialize};

/// Downstream purpose of a preprocessing pass.
///
/// Selects which configured step lists apply and which track's images a
/// request returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Usage {
    Detection,
    Recognition,
}

impl Usage {
    pub const ALL: &[Usage] = &[Usage::Detection, Usage::Recognition];
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Usage::Detection => write!(f, "detection"),
            Usage::Recognition => write!(f, "recognition"),
        }
    }
}

impl std::str::FromStr for Usage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "detection" => Ok(Usage::Detection),
            "recognition" => Ok(Usage::Recognition),
            other => Err(format!("unknown usage '{other}' (expected detection or recognition)")),
        }
    }
}
