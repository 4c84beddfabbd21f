use serde::{Deserialize, Serialize};

/// URL found in a post, with whatever expansion the crawler managed.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Link {
    pub url: String,
    pub expanded_url: Option<String>,
    pub title: Option<String>,
    pub image_src: Option<String>,
}
