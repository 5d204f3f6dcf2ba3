//! Snapshot sampling within a day.
//!
//! A strategy turns the number of snapshots listed for a day into the indices
//! to probe, in probe order. The result depends only on `(n, strategy)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A position within a day's listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOffset {
    First,
    /// `n / 2`
    Middle,
    /// `n - 1`
    Last,
    Index(usize),
}

impl SampleOffset {
    /// Resolve against a listing of length `n`; `None` when out of range.
    pub fn resolve(&self, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        let index = match self {
            SampleOffset::First => 0,
            SampleOffset::Middle => n / 2,
            SampleOffset::Last => n - 1,
            SampleOffset::Index(i) => *i,
        };
        (index < n).then_some(index)
    }
}

impl fmt::Display for SampleOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleOffset::First => write!(f, "first"),
            SampleOffset::Middle => write!(f, "middle"),
            SampleOffset::Last => write!(f, "last"),
            SampleOffset::Index(i) => write!(f, "{i}"),
        }
    }
}

impl FromStr for SampleOffset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(SampleOffset::First),
            "middle" | "mid" => Ok(SampleOffset::Middle),
            "last" => Ok(SampleOffset::Last),
            other => other
                .parse()
                .map(SampleOffset::Index)
                .map_err(|_| format!("unknown sample offset '{s}'")),
        }
    }
}

/// Which of a day's snapshots to probe.
///
/// Written in profiles as `all`, `every:K`, `midpoint` or
/// `fixed:first,middle,last,3`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SamplingStrategy {
    #[default]
    All,
    /// Indices `0, k, 2k, ...`; `k = 0` behaves as 1.
    EveryK(usize),
    /// Explicit offsets, out-of-range ones dropped, duplicates removed.
    FixedIndices(Vec<SampleOffset>),
    MidpointOnly,
}

impl SamplingStrategy {
    /// Indices to probe for a listing of length `n`, in probe order.
    pub fn reduce(&self, n: usize) -> Vec<usize> {
        match self {
            SamplingStrategy::All => (0..n).collect(),
            SamplingStrategy::EveryK(k) => (0..n).step_by((*k).max(1)).collect(),
            SamplingStrategy::FixedIndices(offsets) => {
                let mut picked = Vec::with_capacity(offsets.len());
                for index in offsets.iter().filter_map(|o| o.resolve(n)) {
                    if !picked.contains(&index) {
                        picked.push(index);
                    }
                }
                picked
            }
            SamplingStrategy::MidpointOnly => {
                if n == 0 {
                    Vec::new()
                } else {
                    vec![n / 2]
                }
            }
        }
    }

    /// Select items from a listing.
    pub fn apply<'a, T>(&self, items: &'a [T]) -> Vec<&'a T> {
        self.reduce(items.len())
            .into_iter()
            .map(|i| &items[i])
            .collect()
    }

    /// Reject strategies that only make sense by accident.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            SamplingStrategy::EveryK(0) => Err("every:K needs K >= 1".to_string()),
            SamplingStrategy::FixedIndices(offsets) if offsets.is_empty() => {
                Err("fixed sampling needs at least one offset".to_string())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingStrategy::All => write!(f, "all"),
            SamplingStrategy::EveryK(k) => write!(f, "every:{k}"),
            SamplingStrategy::MidpointOnly => write!(f, "midpoint"),
            SamplingStrategy::FixedIndices(offsets) => {
                let parts: Vec<String> = offsets.iter().map(ToString::to_string).collect();
                write!(f, "fixed:{}", parts.join(","))
            }
        }
    }
}

impl FromStr for SamplingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (s, None),
        };

        match (name.to_ascii_lowercase().as_str(), arg) {
            ("all", None) => Ok(SamplingStrategy::All),
            ("midpoint", None) => Ok(SamplingStrategy::MidpointOnly),
            ("every", Some(k)) => k
                .parse()
                .map(SamplingStrategy::EveryK)
                .map_err(|_| format!("invalid step in '{s}'")),
            ("fixed", Some(list)) => list
                .split(',')
                .filter(|p| !p.trim().is_empty())
                .map(str::parse)
                .collect::<Result<Vec<_>, _>>()
                .map(SamplingStrategy::FixedIndices),
            _ => Err(format!("unknown sampling strategy '{s}'")),
        }
    }
}

impl TryFrom<String> for SamplingStrategy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SamplingStrategy> for String {
    fn from(value: SamplingStrategy) -> Self {
        value.to_string()
    }
}
