use std::collections::BTreeSet;
use std::fmt;

use shared_types::ModuleName;

use super::errors::ManagerError;

/// Lifecycle phase with its own ordering list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Genesis,
    BeginBlock,
    EndBlock,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Genesis, Phase::BeginBlock, Phase::EndBlock];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Genesis => write!(f, "genesis"),
            Self::BeginBlock => write!(f, "begin-block"),
            Self::EndBlock => write!(f, "end-block"),
        }
    }
}

/// Ordered module names for one phase. Never contains a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderingList {
    names: Vec<ModuleName>,
}

impl OrderingList {
    /// Build a list, rejecting repeated names.
    pub fn new<I, N>(phase: Phase, names: I) -> Result<Self, ManagerError>
    where
        I: IntoIterator<Item = N>,
        N: Into<ModuleName>,
    {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        for name in names {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(ManagerError::DuplicateInOrder { phase, name });
            }
            ordered.push(name);
        }
        Ok(Self { names: ordered })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleName> {
        self.names.iter()
    }

    pub fn contains(&self, name: &ModuleName) -> bool {
        self.names.contains(name)
    }

    pub fn as_slice(&self) -> &[ModuleName] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_preserves_sequence() {
        let list = OrderingList::new(Phase::BeginBlock, ["bank", "asset", "auth"]).unwrap();
        let names: Vec<&str> = list.iter().map(ModuleName::as_str).collect();
        assert_eq!(names, vec!["bank", "asset", "auth"]);
    }

    #[test]
    fn test_ordering_rejects_duplicates() {
        let err = OrderingList::new(Phase::EndBlock, ["staking", "asset", "staking"]).unwrap_err();
        assert!(matches!(
            err,
            ManagerError::DuplicateInOrder { phase: Phase::EndBlock, ref name } if name.as_str() == "staking"
        ));
    }
}
