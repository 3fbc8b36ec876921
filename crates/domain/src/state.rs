use derive_more::Display;

/// Where an entity stands relative to its stored record.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum EntityState {
    /// Never saved; the next save inserts it.
    #[default]
    #[display("new")]
    New,
    /// Matches the store; saving writes nothing.
    #[display("clean")]
    Clean,
    /// Changed since it was loaded; the next save updates it.
    #[display("dirty")]
    Dirty,
}

impl EntityState {
    /// State of an entity built with this identity: `0` has never been stored.
    pub fn for_id(id: i64) -> Self {
        if id == 0 { Self::New } else { Self::Clean }
    }

    /// The one transition every setter goes through.
    ///
    /// A new entity stays new, so its first save is still a single insert.
    #[must_use]
    pub fn mutated(self) -> Self {
        match self {
            Self::New => Self::New,
            Self::Clean | Self::Dirty => Self::Dirty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EntityState::New, EntityState::New)]
    #[case(EntityState::Clean, EntityState::Dirty)]
    #[case(EntityState::Dirty, EntityState::Dirty)]
    fn test_mutated(#[case] from: EntityState, #[case] to: EntityState) {
        assert_eq!(from.mutated(), to);
    }

    #[rstest]
    #[case(0, EntityState::New)]
    #[case(1, EntityState::Clean)]
    #[case(42, EntityState::Clean)]
    fn test_for_id(#[case] id: i64, #[case] state: EntityState) {
        assert_eq!(EntityState::for_id(id), state);
    }
}
