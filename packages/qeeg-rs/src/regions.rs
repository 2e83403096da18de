/// Maps a channel label to the anatomical regions it overlies
pub trait RegionAnnotator: Send + Sync {
    /// Region identifiers for `channel_label`; empty when the label is unmapped
    fn regions_for(&self, channel_label: &str) -> Vec<String>;
}

/// 10-20 electrode -> Brodmann areas
const BRODMANN_MAP: &[(&str, &[&str])] = &[
    ("Fp1", &["BA10", "BA11"]),
    ("Fp2", &["BA10", "BA11"]),
    ("F3", &["BA6", "BA8"]),
    ("F4", &["BA6", "BA8"]),
    ("C3", &["BA1", "BA2", "BA3", "BA4"]),
    ("C4", &["BA1", "BA2", "BA3", "BA4"]),
    ("O1", &["BA17", "BA18"]),
    ("O2", &["BA17", "BA18"]),
];

/// Strip the decorations EDF montages commonly add to electrode names:
/// a leading `EEG ` and a reference suffix (`Fp1-REF`, `O2-A1`).
pub fn normalize_label(label: &str) -> &str {
    let label = label.trim();
    let label = match label.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("EEG ") => label[4..].trim_start(),
        _ => label,
    };
    label.split('-').next().unwrap_or(label).trim()
}

/// Brodmann-area annotator backed by a fixed table
#[derive(Debug, Clone, Copy, Default)]
pub struct BrodmannAnnotator;

impl BrodmannAnnotator {
    pub fn new() -> Self {
        Self
    }

    fn lookup(label: &str) -> Option<&'static [&'static str]> {
        BRODMANN_MAP
            .iter()
            .find(|(electrode, _)| *electrode == label)
            .or_else(|| {
                let normalized = normalize_label(label);
                BRODMANN_MAP
                    .iter()
                    .find(|(electrode, _)| electrode.eq_ignore_ascii_case(normalized))
            })
            .map(|(_, areas)| *areas)
    }

    /// Electrodes present in the table
    pub fn electrodes() -> impl Iterator<Item = &'static str> {
        BRODMANN_MAP.iter().map(|(electrode, _)| *electrode)
    }
}

impl RegionAnnotator for BrodmannAnnotator {
    fn regions_for(&self, channel_label: &str) -> Vec<String> {
        Self::lookup(channel_label)
            .map(|areas| areas.iter().map(|a| a.to_string()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup() {
        let annotator = BrodmannAnnotator::new();
        assert_eq!(annotator.regions_for("Fp1"), vec!["BA10", "BA11"]);
        assert_eq!(annotator.regions_for("C4"), vec!["BA1", "BA2", "BA3", "BA4"]);
        assert_eq!(annotator.regions_for("O2"), vec!["BA17", "BA18"]);
    }

    #[test]
    fn test_unmapped_label() {
        let annotator = BrodmannAnnotator::new();
        assert!(annotator.regions_for("Cz").is_empty());
        assert!(annotator.regions_for("").is_empty());
        assert!(annotator.regions_for("ECG").is_empty());
    }

    #[test]
    fn test_normalized_lookup() {
        let annotator = BrodmannAnnotator::new();
        assert_eq!(annotator.regions_for("EEG Fp1-REF"), vec!["BA10", "BA11"]);
        assert_eq!(annotator.regions_for("FP2"), vec!["BA10", "BA11"]);
        assert_eq!(annotator.regions_for("o1-a2"), vec!["BA17", "BA18"]);
        // Disambiguated duplicates are not matched
        assert!(annotator.regions_for("F3#2").is_empty());
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("EEG F3-LE"), "F3");
        assert_eq!(normalize_label("  C3 "), "C3");
        assert_eq!(normalize_label("eeg O2"), "O2");
    }

    #[test]
    fn test_table_covers_eight_electrodes() {
        assert_eq!(BrodmannAnnotator::electrodes().count(), 8);
    }
}
