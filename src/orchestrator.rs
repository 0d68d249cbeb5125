//! Analysis orchestrator - one per console session
//!
//! IDLE → submit → BUSY → ladder completes → IDLE
//!
//! The session state (transcript, current analysis, busy flag) lives in one
//! container. The busy flag is taken together with the user's message and
//! released by a guard, so every exit path returns the session to idle.

use crate::classifier::{AnalysisTarget, Submission};
use crate::config::ConsoleConfig;
use crate::conversation::ConversationStore;
use crate::fallback::{FallbackPolicy, LadderOutcome, LadderOutcomeKind, NoticeSink};
use crate::formatter::{format_analysis, format_demo_catalog, format_demo_fallback, AnalysisPanel};
use crate::gateway::AnalysisGateway;
use crate::models::{CompanyAnalysis, Message, Sender};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};
use uuid::Uuid;

pub const GREETING: &str = "¡Hola! 👋 Soy tu asistente de análisis de riesgo crediticio para PyMEs. \
Puedes preguntarme sobre cualquier empresa escribiendo su RUC o nombre. También puedo ayudarte con:\n\n\
🔍 Búsqueda en Super de Compañías\n\
📱 Análisis de huella digital\n\
📊 Simulaciones de escenarios\n\
⚡ Scoring alternativo con IA\n\n\
¿Qué empresa te gustaría analizar?";

pub const DEMO_UNAVAILABLE: &str = "❌ Error al obtener datos de demostración";

#[derive(Debug, Default)]
struct SessionState {
    conversation: ConversationStore,
    current_analysis: Option<CompanyAnalysis>,
    busy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    EmptyInput,
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Rejected(RejectReason),
    Completed(LadderOutcome),
}

impl SubmitOutcome {
    /// `None` when the submission was rejected
    pub fn kind(&self) -> Option<LadderOutcomeKind> {
        match self {
            SubmitOutcome::Rejected(_) => None,
            SubmitOutcome::Completed(outcome) => Some(outcome.kind()),
        }
    }
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Time of the last transcript entry
    pub updated_at: DateTime<Utc>,
    pub conversation: Vec<Message>,
    pub current_analysis: Option<CompanyAnalysis>,
    pub panel: Option<AnalysisPanel>,
    pub busy: bool,
}

pub struct AnalysisOrchestrator {
    session_id: Uuid,
    gateway: Arc<dyn AnalysisGateway>,
    policy: FallbackPolicy,
    backend_url: String,
    state: Mutex<SessionState>,
}

impl AnalysisOrchestrator {
    pub fn new(
        gateway: Arc<dyn AnalysisGateway>,
        policy: FallbackPolicy,
        backend_url: impl Into<String>,
    ) -> Self {
        let mut state = SessionState::default();
        state.conversation.append_system(GREETING);

        let session_id = Uuid::new_v4();
        debug!(%session_id, "Session mounted");

        Self {
            session_id,
            gateway,
            policy,
            backend_url: backend_url.into(),
            state: Mutex::new(state),
        }
    }

    pub fn from_config(gateway: Arc<dyn AnalysisGateway>, config: &ConsoleConfig) -> Self {
        Self::new(
            gateway,
            FallbackPolicy::new(config.max_analysis_attempts),
            config.api_base_url.clone(),
        )
    }

    pub fn with_session_id(mut self, session_id: Uuid) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Single entry point for free text and quick actions.
    ///
    /// Blank input and submissions while busy are rejected without touching
    /// the transcript. Otherwise the ladder runs on its own task, so dropping
    /// the returned future (a client hanging up) never cuts it short; the
    /// call returns once that task finished.
    pub async fn submit(self: &Arc<Self>, submission: Submission) -> SubmitOutcome {
        let Some((user_text, target)) = submission.resolve() else {
            debug!(session_id = %self.session_id, "Rejected blank submission");
            return SubmitOutcome::Rejected(RejectReason::EmptyInput);
        };

        let Some(busy) = self.try_acquire(user_text) else {
            debug!(session_id = %self.session_id, "Rejected submission while busy");
            return SubmitOutcome::Rejected(RejectReason::Busy);
        };

        info!(
            session_id = %self.session_id,
            target = target_kind(&target),
            "Submission accepted"
        );

        let session = Arc::clone(self);
        let ladder = tokio::spawn(async move {
            let _busy = busy;
            session.run_ladder(&target).await
        });

        let outcome = match ladder.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(session_id = %self.session_id, error = %e, "Ladder task aborted");
                let outcome = LadderOutcome::Unreachable;
                self.complete(&outcome);
                outcome
            }
        };

        info!(
            session_id = %self.session_id,
            outcome = outcome.kind().as_str(),
            "Submission completed"
        );

        SubmitOutcome::Completed(outcome)
    }

    async fn run_ladder(&self, target: &AnalysisTarget) -> LadderOutcome {
        let mut sink = TranscriptSink { state: &self.state };
        let outcome = self
            .policy
            .run(self.gateway.as_ref(), target, &mut sink)
            .await;

        self.complete(&outcome);
        outcome
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    pub fn conversation(&self) -> Vec<Message> {
        self.lock().conversation.all().to_vec()
    }

    /// Messages appended after the first `offset` ones
    pub fn messages_since(&self, offset: usize) -> Vec<Message> {
        self.lock().conversation.since(offset).to_vec()
    }

    pub fn current_analysis(&self) -> Option<CompanyAnalysis> {
        self.lock().current_analysis.clone()
    }

    /// Time of the last transcript entry
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.lock().conversation.updated_at()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            session_id: self.session_id,
            created_at: state.conversation.created_at(),
            updated_at: state.conversation.updated_at(),
            conversation: state.conversation.all().to_vec(),
            current_analysis: state.current_analysis.clone(),
            panel: state.current_analysis.as_ref().map(AnalysisPanel::from),
            busy: state.busy,
        }
    }

    /// Take the busy flag and record the user's message in one step
    fn try_acquire(self: &Arc<Self>, user_text: String) -> Option<BusyGuard> {
        let mut state = self.lock();
        if state.busy {
            return None;
        }
        state.busy = true;
        state.conversation.append_user(user_text);

        Some(BusyGuard {
            session: Arc::clone(self),
        })
    }

    fn complete(&self, outcome: &LadderOutcome) {
        let mut state = self.lock();

        match outcome {
            LadderOutcome::Analysis(analysis) => {
                state.conversation.append(
                    Sender::System,
                    format_analysis(analysis),
                    Some(analysis.clone()),
                );
                state.current_analysis = Some(analysis.clone());
            }
            LadderOutcome::DemoFallback(companies) => {
                state.conversation.append_system(format_demo_fallback(companies));
            }
            LadderOutcome::DemoCatalog(companies) => {
                state.conversation.append_system(format_demo_catalog(companies));
            }
            LadderOutcome::Unreachable => {
                state.conversation.append_system(format!(
                    "❌ No se pudo conectar con el servidor. Verifica que el backend esté ejecutándose en {}",
                    self.backend_url
                ));
            }
            LadderOutcome::DemoUnavailable => {
                state.conversation.append_system(DEMO_UNAVAILABLE);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn target_kind(target: &AnalysisTarget) -> &'static str {
    match target {
        AnalysisTarget::Lookup { .. } => "tax_id",
        AnalysisTarget::Named { .. } => "name",
        AnalysisTarget::Prefilled { .. } => "quick_action",
        AnalysisTarget::DemoListing => "demo",
    }
}

/// Releases the busy flag when dropped
struct BusyGuard {
    session: Arc<AnalysisOrchestrator>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.session.lock().busy = false;
        debug!(session_id = %self.session.session_id, "Session idle");
    }
}

/// Appends ladder notices to the session transcript as they happen
struct TranscriptSink<'a> {
    state: &'a Mutex<SessionState>,
}

impl NoticeSink for TranscriptSink<'_> {
    fn notice(&mut self, text: String) {
        lock_state(self.state).conversation.append_system(text);
    }
}
