// Audit metadata travelling with every repository call.
//
// The repository only reads `tenant_id` (partition scope) from it; everything else is
// persisted verbatim under `_last_event_ctx` for downstream audit consumers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    #[serde(rename = "user_id")]
    pub actor_id: String,
    pub tenant_id: String,
    pub action: String,
    pub description: Option<String>,
    pub container_id: String,
    pub session_id: Option<String>,
}

impl EventContext {
    pub fn new(
        container_id: impl Into<String>,
        action: impl Into<String>,
        actor_id: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            tenant_id: tenant_id.into(),
            action: action.into(),
            description: None,
            container_id: container_id.into(),
            session_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Same actor and tenant, different action. Used when one operation performs
    /// a secondary write (for example clamping the previous entry).
    pub fn for_action(&self, action: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            description: Some(description.into()),
            ..self.clone()
        }
    }
}
