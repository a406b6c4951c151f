//! Orchestrates one AI expansion: prompt assembly, reference resolution,
//! streaming consumption, and the explicit apply step that merges the
//! parsed draft into the tree.

use crate::errors::ExpandError;
use crate::model::{Document, Node};
use crate::parser;
use crate::reference::ReferenceResolver;
use crate::state::MindMapState;
use crate::store::DocumentStore;
use serde_json::Value;
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

/// Settings the modal lets the user pick. `options` is an opaque blob
/// the core forwards to the generation service without interpreting it.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model_id: String,
    /// Optional persona block prepended to the instruction.
    pub persona: Option<String>,
    /// Optional constraints block appended to the instruction.
    pub constraints: Option<String>,
    pub options: Value,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model_id: "default".to_string(),
            persona: None,
            constraints: None,
            options: Value::Null,
        }
    }
}

pub struct GenerationRequest<'a> {
    pub settings: &'a Value,
    /// The target node's label.
    pub primary_context: &'a str,
    /// Resolved reference block, when the prompt carried tags.
    pub reference_block: Option<&'a str>,
    /// Persona + user prompt + constraints.
    pub instruction: &'a str,
    pub model_id: &'a str,
}

/// The opaque streaming text-generation collaborator. Chunks are pushed
/// through the callback as they arrive; the call returns when the stream
/// ends and errors on stream failure. Timeout/retry policy lives behind
/// this trait, not in the orchestrator.
pub trait StreamingGenerationService {
    fn generate(
        &mut self,
        request: GenerationRequest<'_>,
        on_chunk: &mut dyn FnMut(&str),
    ) -> anyhow::Result<()>;
}

/// Set when the modal closes mid-stream. The in-flight request may run to
/// completion, but late chunks are dropped instead of being applied to a
/// discarded draft.
#[derive(Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandPhase {
    /// Modal open (or closed), nothing streaming.
    Idle,
    Generating,
    /// A complete draft is waiting for apply.
    Ready,
}

pub struct AiExpansionOrchestrator {
    phase: ExpandPhase,
    target: Option<(String, String)>, // (node id, label)
    pub prompt: String,
    draft: String,
    error: Option<String>,
    settings: GenerationSettings,
    cancel: CancelToken,
}

impl AiExpansionOrchestrator {
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            phase: ExpandPhase::Idle,
            target: None,
            prompt: String::new(),
            draft: String::new(),
            error: None,
            settings,
            cancel: CancelToken::default(),
        }
    }

    pub fn phase(&self) -> ExpandPhase {
        self.phase
    }

    pub fn target_id(&self) -> Option<&str> {
        self.target.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Apply is only offered once the stream has fully arrived.
    pub fn can_apply(&self) -> bool {
        self.phase == ExpandPhase::Ready
    }

    /// A token the surrounding shell can hold to stop chunk consumption
    /// when the modal closes while `Generating`.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Opens the modal for a target node, seeding the default prompt from
    /// its label and clearing any previous draft or error.
    pub fn open_for(&mut self, node: &Node) {
        self.target = Some((node.id.clone(), node.label.clone()));
        self.prompt = format!("Expand on \"{}\".", node.label);
        self.draft.clear();
        self.error = None;
        self.phase = ExpandPhase::Idle;
        self.cancel = CancelToken::default();
    }

    fn assemble_instruction(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(persona) = self.settings.persona.as_deref() {
            parts.push(persona);
        }
        parts.push(&self.prompt);
        if let Some(constraints) = self.settings.constraints.as_deref() {
            parts.push(constraints);
        }
        parts.join("\n\n")
    }

    /// Resolves references, invokes the streaming service, and
    /// accumulates chunks into the draft, surfacing each through
    /// `on_progress`. Completion moves to `Ready`; a stream error records
    /// the message, returns to `Idle`, and keeps the partial draft so the
    /// user loses no work.
    pub fn generate<S: DocumentStore>(
        &mut self,
        resolver: &mut ReferenceResolver<S>,
        doc: &Document,
        service: &mut dyn StreamingGenerationService,
        mut on_progress: impl FnMut(&str),
    ) -> Result<(), ExpandError> {
        let (_, label) = self.target.clone().ok_or(ExpandError::NotReady)?;
        self.phase = ExpandPhase::Generating;
        self.error = None;
        self.draft.clear();

        let reference_block = resolver.resolve(&self.prompt, doc);
        let instruction = self.assemble_instruction();
        debug!(
            target_label = %label,
            has_references = reference_block.is_some(),
            model_id = %self.settings.model_id,
            "starting expansion stream"
        );

        let token = self.cancel.clone();
        let mut draft = String::new();
        let result = service.generate(
            GenerationRequest {
                settings: &self.settings.options,
                primary_context: &label,
                reference_block: reference_block.as_deref(),
                instruction: &instruction,
                model_id: &self.settings.model_id,
            },
            &mut |chunk| {
                if token.is_cancelled() {
                    return;
                }
                draft.push_str(chunk);
                on_progress(chunk);
            },
        );

        if token.is_cancelled() {
            // Modal was closed mid-stream; whatever arrived is discarded.
            self.phase = ExpandPhase::Idle;
            return Ok(());
        }
        self.draft = draft;
        match result {
            Ok(()) => {
                self.phase = ExpandPhase::Ready;
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.error = Some(message.clone());
                self.phase = ExpandPhase::Idle;
                Err(ExpandError::Stream(message))
            }
        }
    }

    /// Parses the draft as a bullet outline and appends the resulting
    /// forest under the target node as one history entry. A draft with no
    /// valid bullet lines fails and is preserved unconsumed so the user
    /// can edit the prompt and retry.
    pub fn apply(&mut self, state: &mut MindMapState) -> Result<usize, ExpandError> {
        if self.phase != ExpandPhase::Ready {
            return Err(ExpandError::NotReady);
        }
        let (target_id, _) = self.target.clone().ok_or(ExpandError::NotReady)?;
        let forest = parser::parse_outline(&self.draft);
        if forest.is_empty() {
            return Err(ExpandError::UnparseableDraft);
        }
        let count = forest.len();
        state.append_subtrees(&target_id, forest)?;
        self.draft.clear();
        self.target = None;
        self.phase = ExpandPhase::Idle;
        Ok(count)
    }

    /// Discards the draft and target and closes the modal. No mutation
    /// ever happens without an explicit `apply`.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.draft.clear();
        self.target = None;
        self.error = None;
        self.phase = ExpandPhase::Idle;
    }
}
