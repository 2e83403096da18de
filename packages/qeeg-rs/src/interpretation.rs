use crate::regions::RegionAnnotator;
use crate::types::{AnalysisResult, AnnotationEvent};

/// Default relative-power threshold for flagging a (channel, band) pair
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Emit an event for every (channel, band) whose relative power is strictly
/// above `threshold`, joined with the channel's regions.
///
/// Events follow result order for channels and profile order for bands.
pub fn interpret(
    result: &AnalysisResult,
    annotator: &dyn RegionAnnotator,
    threshold: f64,
) -> Vec<AnnotationEvent> {
    let mut events = Vec::new();
    for (channel, profile) in result.iter() {
        let mut regions: Option<Vec<String>> = None;
        for (band, relative_power) in profile.iter() {
            if relative_power > threshold {
                let tags = regions.get_or_insert_with(|| annotator.regions_for(channel));
                events.push(AnnotationEvent {
                    channel: channel.to_string(),
                    band: band.to_string(),
                    relative_power,
                    regions: tags.clone(),
                });
            }
        }
    }
    log::debug!("{} annotation events above {}", events.len(), threshold);
    events
}
