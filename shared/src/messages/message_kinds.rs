use crate::types::MessageKindIndex;

use super::error::MessageKindsError;

/// Ordered registry of the distinct message kinds a component declares.
///
/// Registration order determines the wire-level message-kind index, so the
/// registry is sealed once the owning object enters a scene and stays
/// immutable for the component's lifetime.
#[derive(Clone, Debug, Default)]
pub struct MessageKinds {
    kinds: Vec<String>,
    sealed: bool,
}

impl MessageKinds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new kind, returning its assigned index.
    pub fn register(&mut self, kind: &str) -> Result<MessageKindIndex, MessageKindsError> {
        if self.sealed {
            return Err(MessageKindsError::RegistrySealed { kind: kind.to_string() });
        }
        if self.kinds.iter().any(|k| k == kind) {
            return Err(MessageKindsError::AlreadyRegistered { kind: kind.to_string() });
        }
        if self.kinds.len() > MessageKindIndex::MAX as usize {
            return Err(MessageKindsError::RegistryFull { kind: kind.to_string() });
        }
        let index = self.kinds.len() as MessageKindIndex;
        self.kinds.push(kind.to_string());
        Ok(index)
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }

    pub fn index_of(&self, kind: &str) -> Result<MessageKindIndex, MessageKindsError> {
        self.kinds
            .iter()
            .position(|k| k == kind)
            .map(|index| index as MessageKindIndex)
            .ok_or_else(|| MessageKindsError::KindNotFound { kind: kind.to_string() })
    }

    pub fn name_of(&self, index: MessageKindIndex) -> Result<&str, MessageKindsError> {
        self.kinds
            .get(index as usize)
            .map(String::as_str)
            .ok_or(MessageKindsError::IndexNotFound { index })
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// (kind, index) pairs in registration order, for debug headers.
    pub fn entries(&self) -> Vec<(String, MessageKindIndex)> {
        self.kinds
            .iter()
            .enumerate()
            .map(|(index, kind)| (kind.clone(), index as MessageKindIndex))
            .collect()
    }
}
