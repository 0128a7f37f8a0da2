//! The event loop of the analysis

use crate::{
    config::Configuration,
    cutflow::StageAccumulator,
    evcut::{CutFlowDecision, EventSelector},
    resfin::CutFlowResults,
    source::EventSource,
    Result,
};

use eyre::WrapErr;

/// Run every event of a source through the cut-flow, once
///
/// Progress is reported on the standard output every `progress_period`
/// events. Returns the finalized cut-flow statistics.
///
pub fn run(cfg: &Configuration, source: &mut impl EventSource) -> Result<CutFlowResults> {
    let selector = EventSelector::new(cfg);
    let mut accumulator = StageAccumulator::new();
    let num_events = source.num_events();

    let mut entry = 0;
    while let Some(event) = source
        .next_event()
        .wrap_err_with(|| format!("Failed to read event {}", entry))?
    {
        if entry % cfg.progress_period == 0 {
            println!("On event {} / {}", entry, num_events);
        }

        let decision = selector.evaluate(&event);
        log::trace!("Event {}: {:?}", entry, decision);
        if let CutFlowDecision::Undetermined(stage) = decision {
            log::warn!(
                "Event {} has no missing energy record, it cannot reach stage {} ({})",
                entry,
                stage.index(),
                stage
            );
        }
        accumulator.record(decision);
        entry += 1;
    }

    if entry != num_events {
        log::warn!(
            "Expected {} events, but the source provided {}",
            num_events,
            entry
        );
    }
    Ok(accumulator.finalize())
}
