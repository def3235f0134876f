use crate::{
    engine::{ImagingEngine, StackHandle},
    enums::ImageClassification,
    error::ScanError,
    initiator::InitiatorFile,
};

use tracing::{debug, info};

pub struct StackBuilder;

impl StackBuilder {
    /// Import the scan and reduce the engine's results to one stack titled
    /// `<basename>_raw`.
    ///
    /// Multi-series sources can yield stray single-frame results next to the
    /// real acquisition. When more than one result comes back, every result
    /// with exactly one frame is closed; exactly one stack must remain.
    ///
    /// # Errors
    ///
    /// `ScanError::Engine` when the import fails, `ScanError::AmbiguousStack`
    /// when zero or several stacks survive.
    pub fn build<E: ImagingEngine + ?Sized>(
        engine: &mut E,
        initiator: &InitiatorFile,
        classification: ImageClassification,
    ) -> Result<StackHandle, ScanError> {
        let order = classification.axis_order();
        info!(
            "Opening {} as {}",
            initiator.path.display(),
            order.as_str()
        );
        let mut results = engine.import(&initiator.path, order)?;

        if results.len() > 1 {
            let (partial, kept): (Vec<_>, Vec<_>) =
                results.into_iter().partition(|stack| stack.shape.frames == 1);
            for stack in partial {
                debug!("Closing partial result {}", stack.title);
                engine.close(stack);
            }
            results = kept;
        }

        if results.len() != 1 {
            return Err(ScanError::AmbiguousStack {
                found: results.len(),
            });
        }

        let mut stack = results.remove(0);
        engine.rename(&mut stack, &format!("{}_raw", initiator.basename))?;
        Ok(stack)
    }
}
