/*!
 * Speaker registry shared by all documents of a run.
 */

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::debug;

use crate::corpus::model::Agent;
use crate::errors::ConversionError;
use crate::tei::Person;

/// Deduplicated speakers, keyed by speaker id
///
/// The first definition of a speaker wins; a later document describing the same id
/// with different notes does not update it.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing agent for `id`, or a new one built from `metadata`
    ///
    /// The returned flag is true when the agent was created by this call.
    pub fn get_or_create<F>(&mut self, id: &str, metadata: F) -> (Arc<Agent>, bool)
    where
        F: FnOnce() -> BTreeMap<String, String>,
    {
        if let Some(agent) = self.agents.get(id) {
            return (Arc::clone(agent), false);
        }

        let agent = Arc::new(Agent {
            id: id.to_string(),
            metadata: metadata(),
        });
        self.agents.insert(id.to_string(), Arc::clone(&agent));
        (agent, true)
    }

    /// Register every person of a participant list, returning the newly created agents
    pub fn register_persons(&mut self, persons: &[Person]) -> Vec<Arc<Agent>> {
        let mut created = Vec::new();
        for person in persons {
            let (agent, is_new) = self.get_or_create(&person.id, || person_metadata(person));
            if is_new {
                created.push(agent);
            } else {
                debug!("Speaker {} already registered, keeping first definition", person.id);
            }
        }
        created
    }

    /// Agent of an utterance's speaker
    pub fn require(&self, id: &str) -> Result<Arc<Agent>, ConversionError> {
        self.agents
            .get(id)
            .cloned()
            .ok_or_else(|| ConversionError::UnknownSpeaker(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Agent>> {
        self.agents.get(id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

fn person_metadata(person: &Person) -> BTreeMap<String, String> {
    person
        .notes
        .iter()
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}
