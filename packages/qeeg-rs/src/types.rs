use crate::error::{ChannelError, QeegError, Result};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::sync::OnceLock;

/// Named frequency interval `[low_hz, high_hz]` in Hz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub name: String,
    pub low_hz: f64,
    pub high_hz: f64,
}

impl FrequencyBand {
    pub fn new(name: impl Into<String>, low_hz: f64, high_hz: f64) -> Result<Self> {
        let band = Self {
            name: name.into(),
            low_hz,
            high_hz,
        };
        band.validate()?;
        Ok(band)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(QeegError::InvalidBand("band name must not be empty".to_string()));
        }
        if !(self.low_hz.is_finite() && self.high_hz.is_finite()) {
            return Err(QeegError::InvalidBand(format!(
                "{}: edges must be finite",
                self.name
            )));
        }
        if self.low_hz <= 0.0 || self.low_hz >= self.high_hz {
            return Err(QeegError::InvalidBand(format!(
                "{}: expected 0 < low < high, got [{}, {}]",
                self.name, self.low_hz, self.high_hz
            )));
        }
        Ok(())
    }

    /// Check whether a frequency falls inside the band (both edges inclusive)
    #[inline]
    pub fn contains(&self, freq: f64) -> bool {
        freq >= self.low_hz && freq <= self.high_hz
    }
}

/// Lower edge of the broadband range used for filtering and normalization
pub const BROADBAND_LOW_HZ: f64 = 1.0;
/// Upper edge of the broadband range used for filtering and normalization
pub const BROADBAND_HIGH_HZ: f64 = 45.0;

const CANONICAL_BAND_EDGES: [(&str, f64, f64); 5] = [
    ("Delta", 1.0, 4.0),
    ("Theta", 4.0, 8.0),
    ("Alpha", 8.0, 12.0),
    ("Beta", 12.0, 30.0),
    ("High Beta", 30.0, 45.0),
];

static CANONICAL_BANDS: OnceLock<Vec<FrequencyBand>> = OnceLock::new();

/// The canonical band registry, in report order
pub fn canonical_bands() -> &'static [FrequencyBand] {
    CANONICAL_BANDS.get_or_init(|| {
        CANONICAL_BAND_EDGES
            .iter()
            .map(|&(name, low_hz, high_hz)| FrequencyBand {
                name: name.to_string(),
                low_hz,
                high_hz,
            })
            .collect()
    })
}

/// The broadband interval every band is normalized against
pub fn broadband() -> FrequencyBand {
    FrequencyBand {
        name: "Broadband".to_string(),
        low_hz: BROADBAND_LOW_HZ,
        high_hz: BROADBAND_HIGH_HZ,
    }
}

/// Serializes `(key, value)` pairs as a map without reordering them.
struct OrderedMap<'a, V>(&'a [(String, V)]);

impl<V: Serialize> Serialize for OrderedMap<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Relative power per band for one channel, in band-registry order
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBandProfile {
    relative_power: Vec<(String, f64)>,
    broadband_power: f64,
}

impl ChannelBandProfile {
    pub fn new(broadband_power: f64) -> Self {
        Self {
            relative_power: Vec::new(),
            broadband_power,
        }
    }

    pub fn push(&mut self, band: impl Into<String>, relative_power: f64) {
        self.relative_power.push((band.into(), relative_power));
    }

    pub fn get(&self, band: &str) -> Option<f64> {
        self.relative_power
            .iter()
            .find(|(name, _)| name == band)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.relative_power
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.relative_power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relative_power.is_empty()
    }

    pub fn broadband_power(&self) -> f64 {
        self.broadband_power
    }

    /// True when the broadband integral was zero (or negative), in which case
    /// every relative power is reported as 0
    pub fn is_zero_broadband(&self) -> bool {
        !(self.broadband_power > 0.0)
    }
}

impl Serialize for ChannelBandProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChannelBandProfile", 3)?;
        state.serialize_field("relative_power", &OrderedMap(&self.relative_power))?;
        state.serialize_field("broadband_power", &self.broadband_power)?;
        state.serialize_field("zero_broadband", &self.is_zero_broadband())?;
        state.end()
    }
}

/// Channel label -> profile, in recording channel order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    channels: Vec<(String, ChannelBandProfile)>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a channel. Labels are expected to be unique; a repeated label
    /// replaces the earlier profile in place.
    pub fn insert(&mut self, label: impl Into<String>, profile: ChannelBandProfile) {
        let label = label.into();
        if let Some(slot) = self.channels.iter_mut().find(|(l, _)| *l == label) {
            slot.1 = profile;
        } else {
            self.channels.push((label, profile));
        }
    }

    pub fn get(&self, label: &str) -> Option<&ChannelBandProfile> {
        self.channels
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, profile)| profile)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChannelBandProfile)> {
        self.channels.iter().map(|(l, p)| (l.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        OrderedMap(&self.channels).serialize(serializer)
    }
}

/// A channel that could not be analyzed, with the reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelFailure {
    pub channel: String,
    pub message: String,
    #[serde(skip)]
    pub error: ChannelError,
}

impl ChannelFailure {
    pub fn new(channel: impl Into<String>, error: ChannelError) -> Self {
        Self {
            channel: channel.into(),
            message: error.to_string(),
            error,
        }
    }
}

/// Everything one analysis invocation produces
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub failures: Vec<ChannelFailure>,
    pub bands: Vec<FrequencyBand>,
    pub analyzed_at: String,
}

impl AnalysisOutcome {
    pub fn new(
        result: AnalysisResult,
        failures: Vec<ChannelFailure>,
        bands: Vec<FrequencyBand>,
    ) -> Self {
        Self {
            result,
            failures,
            bands,
            analyzed_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Every channel produced a profile
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Some channels failed but at least one succeeded
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty() && !self.result.is_empty()
    }

    pub fn failed_labels(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.channel.as_str()).collect()
    }
}

/// A (channel, band) pair whose relative power crossed the interpretation
/// threshold, joined with the channel's anatomical regions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationEvent {
    pub channel: String,
    pub band: String,
    pub relative_power: f64,
    pub regions: Vec<String>,
}
