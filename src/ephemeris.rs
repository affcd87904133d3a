//! Precomputed ephemeris loaded from JSON.
//!
//! A table holds time-stamped samples of apparent RA/Dec/distance per body and
//! an optional list of rise/set events. Positions between samples are linearly
//! interpolated; nothing here computes orbits.

use crate::bodies;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Observation {
    pub(crate) ra_deg: f64,
    pub(crate) dec_deg: f64,
    pub(crate) distance_km: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Sample {
    pub(crate) time: DateTime<Utc>,
    pub(crate) bodies: BTreeMap<String, Observation>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum EventKind {
    Rise,
    Set,
}

impl EventKind {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s {
            "rise" => Some(Self::Rise),
            "set" => Some(Self::Set),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Rise => "rise",
            Self::Set => "set",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Event {
    pub(crate) body: String,
    pub(crate) kind: EventKind,
    /// Kept in the offset it was written with, for display.
    pub(crate) time: DateTime<FixedOffset>,
}

/// Observer the table was generated for.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Site {
    pub(crate) lat: f64,
    pub(crate) long: f64,
    #[serde(default)]
    pub(crate) elevation: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct EphemerisTable {
    #[serde(default)]
    pub(crate) observer: Option<Site>,
    #[serde(default)]
    pub(crate) timezone: Option<String>,
    pub(crate) samples: Vec<Sample>,
    #[serde(default)]
    pub(crate) events: Vec<Event>,
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum EphemerisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid ephemeris JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid ephemeris table (empty samples)")]
    Empty,

    #[error("ephemeris samples not in ascending time order at index {0}")]
    Unsorted(usize),

    #[error("requested time {time} outside table range [{start}, {end}]")]
    OutOfRange {
        time: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("no ephemeris data for {0}")]
    UnknownBody(String),

    #[error("ephemeris sample at {time} has no entry for {body}")]
    MissingBody { body: String, time: DateTime<Utc> },
}

/// Offset from `a` toward `b` along the shorter arc, in `(-180, 180]`.
fn shortest_arc(a: f64, b: f64) -> f64 {
    let d = (b - a).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

impl EphemerisTable {
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self, EphemerisError> {
        let s = fs::read_to_string(path)?;
        Self::from_json(&s)
    }

    pub(crate) fn from_json(s: &str) -> Result<Self, EphemerisError> {
        let table: Self = serde_json::from_str(s)?;
        if table.samples.is_empty() {
            return Err(EphemerisError::Empty);
        }
        if let Some(i) = table.samples.windows(2).position(|w| w[0].time >= w[1].time) {
            return Err(EphemerisError::Unsorted(i + 1));
        }
        Ok(table)
    }

    pub(crate) fn start(&self) -> DateTime<Utc> {
        self.samples[0].time
    }

    pub(crate) fn end(&self) -> DateTime<Utc> {
        self.samples[self.samples.len() - 1].time
    }

    /// Name under which `body` is stored: the plain name, else its barycenter alias.
    fn key_for(&self, body: &str) -> Result<String, EphemerisError> {
        let stored = |k: &str| self.samples.iter().any(|s| s.bodies.contains_key(k));
        if stored(body) {
            return Ok(body.to_string());
        }
        match bodies::barycenter_key(body) {
            Some(alias) if stored(&alias) => Ok(alias),
            _ => Err(EphemerisError::UnknownBody(body.to_string())),
        }
    }

    fn entry(sample: &Sample, key: &str) -> Result<Observation, EphemerisError> {
        sample
            .bodies
            .get(key)
            .copied()
            .ok_or_else(|| EphemerisError::MissingBody {
                body: key.to_string(),
                time: sample.time,
            })
    }

    /// Apparent position of `body` at `time`, interpolated between samples.
    pub(crate) fn observe(&self, body: &str, time: DateTime<Utc>) -> Result<Observation, EphemerisError> {
        let (start, end) = (self.start(), self.end());
        if time < start || time > end {
            return Err(EphemerisError::OutOfRange { time, start, end });
        }
        let key = self.key_for(body)?;

        // first sample strictly after `time`; at least 1 since time >= start
        let j = self.samples.partition_point(|s| s.time <= time);
        let a = &self.samples[j - 1];
        if j == self.samples.len() || a.time == time {
            return Self::entry(a, &key);
        }
        let b = &self.samples[j];
        let oa = Self::entry(a, &key)?;
        let ob = Self::entry(b, &key)?;

        let span = (b.time - a.time).num_milliseconds() as f64;
        let u = (time - a.time).num_milliseconds() as f64 / span;
        Ok(Observation {
            ra_deg: (oa.ra_deg + shortest_arc(oa.ra_deg, ob.ra_deg) * u).rem_euclid(360.0),
            dec_deg: oa.dec_deg + (ob.dec_deg - oa.dec_deg) * u,
            distance_km: oa.distance_km + (ob.distance_km - oa.distance_km) * u,
        })
    }

    /// Events of `kind` for `body` in `[from, until)`, earliest first.
    pub(crate) fn events(
        &self,
        body: &str,
        kind: EventKind,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Vec<DateTime<FixedOffset>> {
        let mut found: Vec<DateTime<FixedOffset>> = self
            .events
            .iter()
            .filter(|e| e.body == body && e.kind == kind)
            .map(|e| e.time)
            .filter(|t| {
                let t = t.with_timezone(&Utc);
                t >= from && t < until
            })
            .collect();
        found.sort();
        found
    }
}
