//! Agent registry
//!
//! Holds one factory per agent id plus the display metadata derived when the
//! agent was registered. `get` builds a fresh agent on every call, so agents
//! never share request state.

use crate::agent::Agent;
use crate::agents::{EducationAgent, NewsSummarizerAgent};
use crate::error::AgentError;
use crate::gemini::{GeminiClient, ModelClient};
use crate::models::{AgentContext, AgentOutput, AgentType};
use crate::persona::{AckmanAgent, BuffettAgent, GrahamAgent, LynchAgent, MungerAgent};
use crate::Result;
use futures::future::join_all;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

const DEFAULT_EMOJI: &str = "🤖";

/// Builds one agent around the registry's model client.
pub type AgentFactory = Arc<dyn Fn(Arc<dyn ModelClient>) -> Result<Box<dyn Agent>> + Send + Sync>;

/// Display-facing description of a registered agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    pub id: String,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    pub name: String,
    pub description: String,
    pub emoji: String,
    pub is_available: bool,
    pub requires_premium: bool,
    pub tags: Vec<String>,
}

impl AgentMetadata {
    /// Name falls back from persona name to display name to the title-cased id.
    pub fn from_agent(agent: &dyn Agent) -> Self {
        let name = agent
            .persona_name()
            .or_else(|| agent.display_name())
            .map(str::to_string)
            .unwrap_or_else(|| title_case_id(agent.agent_id()));

        Self {
            id: agent.agent_id().to_string(),
            agent_type: agent.agent_type(),
            name,
            description: agent.description().to_string(),
            emoji: agent.emoji().unwrap_or(DEFAULT_EMOJI).to_string(),
            is_available: true,
            requires_premium: agent.requires_premium(),
            tags: agent.tags(),
        }
    }
}

fn title_case_id(id: &str) -> String {
    id.split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[derive(Default)]
struct Entries {
    factories: HashMap<String, AgentFactory>,
    metadata: HashMap<String, AgentMetadata>,
    order: Vec<String>,
}

pub struct AgentRegistry {
    client: Arc<dyn ModelClient>,
    entries: RwLock<Entries>,
}

impl AgentRegistry {
    /// Empty registry; agents built from it share `client`.
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            entries: RwLock::new(Entries::default()),
        }
    }

    /// Registry with every built-in agent discovered.
    pub fn with_builtin_agents(client: Arc<dyn ModelClient>) -> Self {
        let registry = Self::new(client);
        registry.discover_builtin_agents();
        registry
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn discover_builtin_agents(&self) {
        let outcomes = [
            ("buffett", self.register(factory(BuffettAgent::new))),
            ("munger", self.register(factory(MungerAgent::new))),
            ("lynch", self.register(factory(LynchAgent::new))),
            ("graham", self.register(factory(GrahamAgent::new))),
            ("ackman", self.register(factory(AckmanAgent::new))),
            ("news_summarizer", self.register(factory(NewsSummarizerAgent::new))),
            ("education", self.register(factory(EducationAgent::new))),
        ];

        let mut registered = 0;
        for (name, outcome) in outcomes {
            match outcome {
                Ok(true) => registered += 1,
                Ok(false) => {}
                Err(e) => error!(agent = name, error = %e, "Failed to register built-in agent"),
            }
        }

        info!(registered, total = self.read().order.len(), "Agent discovery complete");
    }

    /// Register an agent factory.
    ///
    /// The factory runs once to read the agent's identity. Returns `Ok(false)`
    /// when the id is already taken; the first registration is kept.
    pub fn register<F>(&self, factory: F) -> Result<bool>
    where
        F: Fn(Arc<dyn ModelClient>) -> Result<Box<dyn Agent>> + Send + Sync + 'static,
    {
        let sample = factory(Arc::clone(&self.client))?;
        let metadata = AgentMetadata::from_agent(sample.as_ref());
        let id = metadata.id.clone();

        let mut entries = self.write();
        if entries.factories.contains_key(&id) {
            warn!(agent_id = %id, "Agent already registered, skipping");
            return Ok(false);
        }

        entries.factories.insert(id.clone(), Arc::new(factory));
        entries.metadata.insert(id.clone(), metadata);
        entries.order.push(id.clone());

        debug!(agent_id = %id, "Registered agent");
        Ok(true)
    }

    pub fn unregister(&self, id: &str) -> bool {
        let mut entries = self.write();
        let removed = entries.factories.remove(id).is_some();
        entries.metadata.remove(id);
        entries.order.retain(|existing| existing != id);

        if removed {
            info!(agent_id = id, "Unregistered agent");
        }
        removed
    }

    /// Fresh agent instance for `id`.
    pub fn get(&self, id: &str) -> Result<Box<dyn Agent>> {
        let factory = {
            let entries = self.read();
            match entries.factories.get(id) {
                Some(factory) => Arc::clone(factory),
                None => return Err(AgentError::agent_not_found(id, entries.order.clone())),
            }
        };

        factory(Arc::clone(&self.client))
    }

    pub fn has(&self, id: &str) -> bool {
        self.read().factories.contains_key(id)
    }

    /// Registered ids in registration order.
    pub fn list_ids(&self) -> Vec<String> {
        self.read().order.clone()
    }

    /// Fresh instances of every agent of `agent_type`. Factories that fail are skipped.
    pub fn list_by_type(&self, agent_type: AgentType) -> Vec<Box<dyn Agent>> {
        let ids: Vec<String> = self
            .list_metadata(Some(agent_type), false)
            .into_iter()
            .map(|m| m.id)
            .collect();

        ids.iter()
            .filter_map(|id| match self.get(id) {
                Ok(agent) => Some(agent),
                Err(e) => {
                    warn!(agent_id = %id, error = %e, "Could not build agent");
                    None
                }
            })
            .collect()
    }

    pub fn list_personas(&self) -> Vec<AgentMetadata> {
        self.list_metadata(Some(AgentType::Persona), false)
    }

    pub fn get_metadata(&self, id: &str) -> Option<AgentMetadata> {
        self.read().metadata.get(id).cloned()
    }

    /// Metadata in registration order, optionally filtered.
    pub fn list_metadata(&self, agent_type: Option<AgentType>, available_only: bool) -> Vec<AgentMetadata> {
        let entries = self.read();
        entries
            .order
            .iter()
            .filter_map(|id| entries.metadata.get(id))
            .filter(|m| agent_type.map_or(true, |t| m.agent_type == t))
            .filter(|m| !available_only || m.is_available)
            .cloned()
            .collect()
    }

    /// Available personas as JSON objects.
    pub fn personas_for_api(&self) -> Result<Vec<Value>> {
        self.list_metadata(Some(AgentType::Persona), true)
            .iter()
            .map(|m| serde_json::to_value(m).map_err(AgentError::from))
            .collect()
    }

    /// Fails with `VAL_3003` naming the valid ids.
    pub fn validate_agent_id(&self, id: &str) -> Result<()> {
        if self.has(id) {
            Ok(())
        } else {
            Err(AgentError::invalid_persona(id, self.list_ids()))
        }
    }

    /// Returns false when `id` is not registered.
    pub fn set_available(&self, id: &str, available: bool) -> bool {
        match self.write().metadata.get_mut(id) {
            Some(metadata) => {
                metadata.is_available = available;
                true
            }
            None => false,
        }
    }

    /// Resolve and run one agent. Lookup failures never reach `execute`.
    pub async fn execute(&self, id: &str, context: &AgentContext) -> Result<AgentOutput> {
        let agent = self.get(id)?;
        agent.execute(context).await
    }

    /// Run the same context against several agents.
    ///
    /// Sequential mode finishes each agent before starting the next. Parallel
    /// mode starts them all at once. Each id gets its own independent result.
    pub async fn execute_multiple<S: AsRef<str>>(
        &self,
        ids: &[S],
        context: &AgentContext,
        parallel: bool,
    ) -> HashMap<String, Result<AgentOutput>> {
        info!(
            request_id = %context.request_id,
            agents = ids.len(),
            parallel,
            "Executing multiple agents"
        );

        if parallel {
            let runs = ids.iter().map(|id| async move {
                let id = id.as_ref();
                (id.to_string(), self.execute(id, context).await)
            });
            return join_all(runs).await.into_iter().collect();
        }

        let mut results = HashMap::new();
        for id in ids {
            let id = id.as_ref();
            let outcome = self.execute(id, context).await;
            results.insert(id.to_string(), outcome);
        }
        results
    }
}

fn factory<A, F>(build: F) -> impl Fn(Arc<dyn ModelClient>) -> Result<Box<dyn Agent>> + Send + Sync + 'static
where
    A: Agent + 'static,
    F: Fn(Arc<dyn ModelClient>) -> A + Send + Sync + 'static,
{
    move |client| Ok(Box::new(build(client)) as Box<dyn Agent>)
}

static GLOBAL_REGISTRY: OnceCell<Arc<AgentRegistry>> = OnceCell::new();

/// Process-wide registry backed by Gemini, built on first call.
pub fn global_registry() -> Result<Arc<AgentRegistry>> {
    GLOBAL_REGISTRY
        .get_or_try_init(|| {
            let client: Arc<dyn ModelClient> = Arc::new(GeminiClient::from_env()?);
            Ok(Arc::new(AgentRegistry::with_builtin_agents(client)))
        })
        .map(Arc::clone)
}
