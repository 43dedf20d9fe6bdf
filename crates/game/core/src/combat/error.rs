use super::{CombatantId, Side};
use crate::error::{ErrorSeverity, GameError};

/// Errors raised by encounter operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    #[error("combatant {0} is not part of this encounter")]
    UnknownCombatant(CombatantId),

    #[error("combatant {0} is down")]
    Defeated(CombatantId),

    #[error("combatant {combatant} is immune to {effect}")]
    Immune {
        combatant: CombatantId,
        effect: String,
    },

    #[error("encounter has no living {0} combatants")]
    MissingSide(Side),

    #[error("encounter has not started")]
    NotStarted,

    #[error("encounter is already over")]
    EncounterOver,

    #[error("combatant {0} cannot afford that")]
    InsufficientResources(CombatantId),
}

impl GameError for CombatError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Defeated(_) | Self::InsufficientResources(_) => ErrorSeverity::Recoverable,
            Self::UnknownCombatant(_)
            | Self::Immune { .. }
            | Self::MissingSide(_)
            | Self::NotStarted
            | Self::EncounterOver => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCombatant(_) => "COMBAT_UNKNOWN_COMBATANT",
            Self::Defeated(_) => "COMBAT_DEFEATED",
            Self::Immune { .. } => "COMBAT_IMMUNE",
            Self::MissingSide(_) => "COMBAT_MISSING_SIDE",
            Self::NotStarted => "COMBAT_NOT_STARTED",
            Self::EncounterOver => "COMBAT_ENCOUNTER_OVER",
            Self::InsufficientResources(_) => "COMBAT_INSUFFICIENT_RESOURCES",
        }
    }
}
