//! Device-tree compatible strings.
//!
//! A device lists its compatible strings from most specific to most
//! generic, e.g. `"oneplus,fajita"` followed by `"qcom,sdm845"`.

use crate::{Error, Result};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Locations of the root node's compatible property, in lookup order.
pub const DEVICE_TREE_PATHS: [&str; 2] = [
    "/sys/firmware/devicetree/base/compatible",
    "/proc/device-tree/compatible",
];

/// A single validated compatible string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Compatible(String);

impl Compatible {
    /// Validates and wraps a compatible string.
    ///
    /// The string must be non-empty and contain no whitespace or control
    /// characters.
    pub fn new(s: &str) -> Result<Self> {
        if is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidCompatible(s.to_string()))
        }
    }

    /// Returns the string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the vendor prefix (the part before the first comma), if any.
    pub fn vendor(&self) -> Option<&str> {
        self.0.split_once(',').map(|(vendor, _)| vendor)
    }
}

pub(crate) fn is_valid(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c.is_control())
}

impl FromStr for Compatible {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Compatible::new(s)
    }
}

impl AsRef<str> for Compatible {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Compatible {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered, non-empty list of compatible strings, most specific first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compatibles(Vec<Compatible>);

impl Compatibles {
    /// Builds a candidate list, validating every entry.
    pub fn new<I, S>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = items
            .into_iter()
            .map(|s| Compatible::new(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if list.is_empty() {
            return Err(Error::InvalidCompatible(String::new()));
        }
        Ok(Self(list))
    }

    /// Parses the raw value of a device-tree `compatible` property.
    ///
    /// The property is a list of NUL-terminated strings. Empty entries are
    /// skipped. An entry that is not UTF-8 rejects the whole property.
    pub fn from_device_tree_bytes(bytes: &[u8]) -> Result<Self> {
        let items = bytes
            .split(|b| *b == 0)
            .filter(|s| !s.is_empty())
            .map(|s| {
                std::str::from_utf8(s)
                    .map(str::to_string)
                    .map_err(|_| Error::InvalidCompatible(String::from_utf8_lossy(s).into_owned()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(items)
    }

    /// Reads the running system's compatible strings from the device tree.
    pub fn from_device_tree() -> Result<Self> {
        let mut last_err = None;
        for path in DEVICE_TREE_PATHS {
            match Self::from_device_tree_path(path) {
                Ok(list) => return Ok(list),
                Err(e) => {
                    debug!("No compatible property at {}: {}", path, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| Error::InvalidCompatible(String::new())))
    }

    /// Reads compatible strings from a specific device-tree property file.
    pub fn from_device_tree_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::DeviceTree {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_device_tree_bytes(&bytes)
    }

    /// Iterates the candidates in priority order.
    pub fn iter(&self) -> std::slice::Iter<'_, Compatible> {
        self.0.iter()
    }

    /// Returns the most specific candidate.
    pub fn primary(&self) -> &Compatible {
        &self.0[0]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|c| c.0.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a Compatibles {
    type Item = &'a Compatible;
    type IntoIter = std::slice::Iter<'a, Compatible>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_compatible() {
        let c = Compatible::new("oneplus,fajita").unwrap();
        assert_eq!(c.as_str(), "oneplus,fajita");
        assert_eq!(c.vendor(), Some("oneplus"));
        assert_eq!(Compatible::new("simple-panel").unwrap().vendor(), None);
    }

    #[test]
    fn test_invalid_compatible() {
        assert!(Compatible::new("").is_err());
        assert!(Compatible::new("one plus").is_err());
        assert!(Compatible::new("tab\there").is_err());
        assert!("bad\0nul".parse::<Compatible>().is_err());
    }

    #[test]
    fn test_empty_list_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            Compatibles::new(empty),
            Err(Error::InvalidCompatible(_))
        ));
    }

    #[test]
    fn test_order_preserved() {
        let list = Compatibles::new(["oneplus,fajita", "qcom,sdm845"]).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.primary().as_str(), "oneplus,fajita");
        let names: Vec<_> = list.iter().map(Compatible::as_str).collect();
        assert_eq!(names, ["oneplus,fajita", "qcom,sdm845"]);
    }

    #[test]
    fn test_device_tree_bytes() {
        let raw = b"oneplus,fajita\0qcom,sdm845\0";
        let list = Compatibles::from_device_tree_bytes(raw).unwrap();
        assert_eq!(list.to_strings(), ["oneplus,fajita", "qcom,sdm845"]);

        assert!(Compatibles::from_device_tree_bytes(b"\0\0").is_err());
    }

    #[test]
    fn test_device_tree_missing_file() {
        let err = Compatibles::from_device_tree_path("/nonexistent/compatible").unwrap_err();
        assert!(matches!(err, Error::DeviceTree { .. }));
        assert!(!err.is_load());
    }

    #[test]
    fn test_device_tree_invalid_utf8() {
        let raw = b"oneplus,faj\xffita\0qcom,sdm845\0";
        let err = Compatibles::from_device_tree_bytes(raw).unwrap_err();
        assert!(matches!(err, Error::InvalidCompatible(_)));
    }
}
