use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The global election stage.
///
/// Transitions are operator-triggered and deliberately unguarded: any phase
/// may be set from any phase, but every transition is audited. Only vote
/// casting is phase-gated; verification is allowed in any phase so that
/// voters can be screened ahead of the voting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionPhase {
    #[default]
    Pre,
    Voting,
    Counting,
    Results,
}

impl Display for ElectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElectionPhase::Pre => "pre",
            ElectionPhase::Voting => "voting",
            ElectionPhase::Counting => "counting",
            ElectionPhase::Results => "results",
        };
        write!(f, "{name}")
    }
}
