use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;

pub const NETWORK_NAME_MAX_LEN: usize = 20;
pub const DEFAULT_NETWORK: &str = "twitter";

/// Name of the social network a post or account belongs to.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct Network(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The network name is invalid: {0:?}")]
pub struct InvalidNetworkError(String);

impl Network {
    pub fn new(name: String) -> Result<Self, InvalidNetworkError> {
        if name.is_empty() || name.chars().count() > NETWORK_NAME_MAX_LEN {
            Err(InvalidNetworkError(name))
        } else {
            Ok(Network(name))
        }
    }

    #[must_use]
    pub fn twitter() -> Self {
        Network(DEFAULT_NETWORK.to_owned())
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::twitter()
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Network {
    type Err = InvalidNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::new(s.to_owned())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Network::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"Network"))
    }
}
