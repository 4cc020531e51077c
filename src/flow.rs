//! Comma-separated handler name lists.
//!
//! A [`Flow`] is how a configuration file names the handlers of a chain,
//! e.g. `"decode, auth, gzip"`. Parsing trims each name and drops empty
//! segments, so stray whitespace and leading/trailing commas are harmless.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Separator between names in the string form.
pub const FLOW_DELIMITER: char = ',';

/// Ordered list of handler names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Flow {
    names: Vec<String>,
}

impl Flow {
    /// Parse a comma-separated list of names.
    pub fn parse(s: &str) -> Self {
        s.split(FLOW_DELIMITER).collect()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Append a name; blank names are ignored.
    pub fn push(&mut self, name: impl AsRef<str>) {
        let name = name.as_ref().trim();
        if !name.is_empty() {
            self.names.push(name.to_string());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for Flow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut flow = Flow::default();
        for name in iter {
            flow.push(name);
        }
        flow
    }
}

impl FromStr for Flow {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", FLOW_DELIMITER)?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

impl From<&str> for Flow {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl Serialize for Flow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Flow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}
