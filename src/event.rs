use crate::gemini::{GenerationError, GenerationPayload};
use crate::panel::RequestKind;

/// Messages posted from background generation tasks to the UI thread. Drained
/// once per frame; each completion applies a single state update to its panel.
#[derive(Debug, Clone)]
pub enum AppEvent {
    GenerationFinished {
        kind: RequestKind,
        outcome: Result<GenerationPayload, GenerationError>,
    },
}
