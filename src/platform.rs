use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Mobile platform the host application runs on. Sent to the server in the `platform` header.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Android.
    #[display(fmt = "android")]
    Android,
    /// iOS.
    #[display(fmt = "ios")]
    Ios,
}

impl Platform {
    /// Detect platform from the compilation target. Returns `None` on anything other than Android
    /// or iOS.
    pub fn detect() -> Option<Platform> {
        if cfg!(target_os = "android") {
            Some(Platform::Android)
        } else if cfg!(target_os = "ios") {
            Some(Platform::Ios)
        } else {
            None
        }
    }

    /// Header value for this platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            _ => Err(Error::InvalidPlatform(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Platform;
    use crate::Error;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("android".parse::<Platform>().unwrap(), Platform::Android);
        assert_eq!("iOS".parse::<Platform>().unwrap(), Platform::Ios);
    }

    #[test]
    fn rejects_other_platforms() {
        assert!(matches!(
            "web".parse::<Platform>(),
            Err(Error::InvalidPlatform(p)) if p == "web"
        ));
    }

    #[test]
    fn displays_as_header_value() {
        assert_eq!(Platform::Ios.to_string(), "ios");
        assert_eq!(Platform::Android.to_string(), Platform::Android.as_str());
    }

    #[test]
    fn no_detection_on_host_targets() {
        if !cfg!(any(target_os = "android", target_os = "ios")) {
            assert_eq!(Platform::detect(), None);
        }
    }
}
