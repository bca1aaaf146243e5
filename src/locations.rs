//! Resource location resolution
//!
//! Schema and document locations are file paths or URLs. Relative
//! references, such as those in an `xsi:schemaLocation` hint, are resolved
//! against the location of the referring resource.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use url::Url;

use crate::error::{Error, Result};

/// Resource location - a file path or a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// URL with a non-file scheme (http, https, ftp, ...)
    Url(Url),
}

impl Location {
    /// Location of a local file
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Location::Path(path.into())
    }

    /// Resolve `reference` relative to this location
    pub fn resolve(&self, reference: &str) -> Result<Location> {
        let reference = reference.trim();
        if let Ok(url) = Url::parse(reference) {
            return Self::from_url(url);
        }
        let path = Path::new(reference);
        if path.is_absolute() {
            return Ok(Location::Path(path.to_path_buf()));
        }
        match self {
            Location::Path(base) => {
                let dir = base.parent().unwrap_or_else(|| Path::new(""));
                Ok(Location::Path(dir.join(path)))
            }
            Location::Url(base) => Ok(Location::Url(base.join(reference)?)),
        }
    }

    fn from_url(url: Url) -> Result<Location> {
        if url.scheme() == "file" {
            url.to_file_path()
                .map(Location::Path)
                .map_err(|_| Error::Resource(format!("'{}' is not a valid file URL", url)))
        } else {
            Ok(Location::Url(url))
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        matches!(self, Location::Path(_))
    }

    /// Last path segment, used to label schema sources
    pub fn file_name(&self) -> String {
        match self {
            Location::Path(p) => p
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.to_string_lossy().into_owned()),
            Location::Url(u) => u
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| u.to_string()),
        }
    }
}

impl FromStr for Location {
    type Err = Error;

    /// Parse a URL (`file:` URLs become paths) or a plain path
    fn from_str(s: &str) -> Result<Self> {
        match Url::parse(s) {
            Ok(url) => Self::from_url(url),
            Err(_) => Ok(Location::Path(PathBuf::from(s))),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path(p) => write!(f, "{}", p.display()),
            Location::Url(u) => write!(f, "{}", u),
        }
    }
}
