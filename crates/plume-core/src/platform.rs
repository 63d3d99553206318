//! Supported social platforms and their post templates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlumeError;

const FACEBOOK_TEMPLATE: &str = "\
You are an experienced Facebook community manager. Write an engaging Facebook post about the topic below.
Facebook posts read warmly, invite sharing, may tell a longer story or give more detail, and end with a clear call to action.

Topic: {{topic}}
Style: {{style}}";

const INSTAGRAM_TEMPLATE: &str = "\
You are an Instagram visual marketing specialist. Write an engaging Instagram post about the topic below.
Open with a hook in the first line, keep the tone lively, use plenty of emoji, keep paragraphs short, and finish with 5-10 relevant hashtags.

Topic: {{topic}}
Style: {{style}}";

const THREADS_TEMPLATE: &str = "\
You are a Threads creator. Write an engaging Threads post about the topic below.
Threads posts are direct and conversational, carry a point of view or some humour, stay short, and invite replies.

Topic: {{topic}}
Style: {{style}}";

/// A social platform Plume can write for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Facebook page post.
    Facebook,
    /// Instagram caption.
    Instagram,
    /// Threads post.
    Threads,
}

impl Platform {
    /// Every supported platform.
    pub const ALL: [Self; 3] = [Self::Facebook, Self::Instagram, Self::Threads];

    /// Lowercase identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Threads => "threads",
        }
    }

    /// Post template with `{{topic}}` and `{{style}}` placeholders.
    pub const fn template(self) -> &'static str {
        match self {
            Self::Facebook => FACEBOOK_TEMPLATE,
            Self::Instagram => INSTAGRAM_TEMPLATE,
            Self::Threads => THREADS_TEMPLATE,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PlumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "facebook" => Ok(Self::Facebook),
            "instagram" => Ok(Self::Instagram),
            "threads" => Ok(Self::Threads),
            _ => Err(PlumeError::UnsupportedPlatform(s.to_string())),
        }
    }
}
