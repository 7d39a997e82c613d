use crate::gemini::{GenerationError, GenerationPayload};
use crate::prompt;

/// Error message shown when a submission is attempted without a configured key.
pub const MISSING_KEY_MESSAGE: &str = "Missing API Key.";

/// The five investigation personas. Each maps to one prompt template and one
/// generate-content call; `EvidenceImage` is the only image-producing kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    PsychAnalysis,
    ScriptConstruction,
    EvidenceImage,
    SeoStrategy,
    MarketFunnel,
}

impl RequestKind {
    pub const ALL: [RequestKind; 5] = [
        RequestKind::PsychAnalysis,
        RequestKind::ScriptConstruction,
        RequestKind::EvidenceImage,
        RequestKind::SeoStrategy,
        RequestKind::MarketFunnel,
    ];

    pub fn index(self) -> usize {
        match self {
            RequestKind::PsychAnalysis => 0,
            RequestKind::ScriptConstruction => 1,
            RequestKind::EvidenceImage => 2,
            RequestKind::SeoStrategy => 3,
            RequestKind::MarketFunnel => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RequestKind::PsychAnalysis => "1. MIND HUNTER",
            RequestKind::ScriptConstruction => "2. CASE FILE",
            RequestKind::EvidenceImage => "3. CRIME SCENE",
            RequestKind::SeoStrategy => "4. DARK WEB SEO",
            RequestKind::MarketFunnel => "5. BLACK MARKET",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            RequestKind::PsychAnalysis => "Profile The Unknown",
            RequestKind::ScriptConstruction => "Construct The Narrative",
            RequestKind::EvidenceImage => "Visual Evidence",
            RequestKind::SeoStrategy => "Viral Investigation",
            RequestKind::MarketFunnel => "Defense & Security",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            RequestKind::PsychAnalysis => "Mind Hunter: Behavioral Profiling",
            RequestKind::ScriptConstruction => "Script Construction (Pro)",
            RequestKind::EvidenceImage => "Studio: Visual Evidence",
            RequestKind::SeoStrategy => "Dark Web SEO: Viral Strategy",
            RequestKind::MarketFunnel => "Black Market: Monetization Funnel",
        }
    }

    pub fn topic_hint(self) -> &'static str {
        match self {
            RequestKind::PsychAnalysis => {
                "Paste Channel URL or Topic (e.g., Stoicism, Dark Psychology)..."
            }
            RequestKind::ScriptConstruction => {
                "Ex: Healing the inner child, Stoicism for beginners..."
            }
            RequestKind::EvidenceImage => {
                "Describe the scene (e.g., A dark interrogation room with a single light bulb)..."
            }
            RequestKind::SeoStrategy => "Enter video topic...",
            RequestKind::MarketFunnel => "Niche (e.g., True Crime, Self Defense)...",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            RequestKind::PsychAnalysis => "PROFILE TARGET",
            RequestKind::ScriptConstruction => "CONSTRUCT NARRATIVE",
            RequestKind::EvidenceImage => "GENERATE",
            RequestKind::SeoStrategy => "RUN INVESTIGATION",
            RequestKind::MarketFunnel => "BUILD FUNNEL",
        }
    }
}

/// Per-panel form input. `topic` is the single required field for every kind
/// (it doubles as the scene description on the image panel); the remaining
/// fields are only read by `ScriptConstruction`.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelForm {
    pub topic: String,
    pub duration_minutes: f32,
    pub language: String,
    pub style: String,
}

impl Default for PanelForm {
    fn default() -> Self {
        Self {
            topic: String::new(),
            duration_minutes: 1.0,
            language: "Vietnamese".to_string(),
            style: "Dark/Mystery".to_string(),
        }
    }
}

impl PanelForm {
    /// Estimated scene count for the script panel, at roughly 8 seconds a shot.
    pub fn estimated_scenes(&self) -> u32 {
        (self.duration_minutes * 7.5).ceil().max(0.0) as u32
    }

    /// Estimated word count for the script panel at a spoken pace.
    pub fn estimated_words(&self) -> u32 {
        (self.duration_minutes * 130.0).ceil().max(0.0) as u32
    }
}

/// Request lifecycle for one panel. `Pending` means exactly one generation
/// call is outstanding; the terminal states hold the whole result and are
/// replaced, never merged, on the next attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelPhase {
    Idle,
    Pending,
    Succeeded(GenerationPayload),
    Failed(String),
}

/// Seam between the panel state machine and the generation transport, so the
/// lifecycle can be exercised against a recording fake.
pub trait GenerationDispatch {
    fn dispatch(&self, kind: RequestKind, api_key: &str, prompt: String);
}

/// One view instance: its form, its lifecycle phase, and the submit guards
/// shared by all five personas.
#[derive(Debug, Clone)]
pub struct Panel {
    pub kind: RequestKind,
    pub form: PanelForm,
    phase: PanelPhase,
}

impl Panel {
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            form: PanelForm::default(),
            phase: PanelPhase::Idle,
        }
    }

    pub fn phase(&self) -> &PanelPhase {
        &self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase == PanelPhase::Pending
    }

    fn form_is_valid(&self) -> bool {
        if self.form.topic.trim().is_empty() {
            return false;
        }
        if self.kind == RequestKind::ScriptConstruction {
            let duration = self.form.duration_minutes;
            if !duration.is_finite() || duration <= 0.0 {
                return false;
            }
        }
        true
    }

    /// Whether the submit trigger should be enabled in the UI. The guards in
    /// `submit` are re-checked regardless.
    pub fn can_submit(&self) -> bool {
        !self.is_pending() && self.form_is_valid()
    }

    /// Submit the current form. Guard order:
    /// a request already in flight or an invalid form is a silent no-op; a
    /// missing credential fails locally and never reaches the dispatcher;
    /// otherwise the panel enters `Pending` and exactly one call is issued.
    pub fn submit(&mut self, api_key: &str, dispatch: &dyn GenerationDispatch) {
        if self.is_pending() {
            return;
        }
        if !self.form_is_valid() {
            return;
        }
        if api_key.is_empty() {
            self.phase = PanelPhase::Failed(MISSING_KEY_MESSAGE.to_string());
            return;
        }

        self.phase = PanelPhase::Pending;
        let prompt = prompt::build(self.kind, &self.form);
        dispatch.dispatch(self.kind, api_key, prompt);
    }

    /// Apply a completed generation call. Completions arriving while the panel
    /// is not `Pending` are stale (the panel was reset underneath them) and
    /// are dropped rather than resurrecting an abandoned attempt.
    pub fn finish(&mut self, outcome: Result<GenerationPayload, GenerationError>) {
        if !self.is_pending() {
            return;
        }
        self.phase = match outcome {
            Ok(payload) => PanelPhase::Succeeded(payload),
            Err(err) => PanelPhase::Failed(err.to_string()),
        };
    }

    /// Explicit reset back to `Idle` with no payload. Editing or clearing the
    /// form never does this implicitly.
    pub fn reset(&mut self) {
        self.phase = PanelPhase::Idle;
    }
}
