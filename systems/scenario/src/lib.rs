#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scripted scenarios layered over the action state machine.
//!
//! A scenario is a list of [`ScenarioStep`]s. Each step narrows what the
//! player may do through its [`StepAllowances`] and names the action that
//! completes it. The [`ScenarioGate`] checks every transition against the
//! active step before the machine sees it, and a [`SimulatedAuthority`]
//! resolves approved actions in place of the contract.

mod authority;
mod gate;
pub mod tutorial;

use warpflow_core::{ActionIntent, ActionKind, Command, Position, ShipId, TargetChoice};

pub use crate::authority::SimulatedAuthority;
pub use crate::gate::{GateOutcome, GateRejection, ScenarioGate};

/// Player action as seen by a scenario step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TutorialAction {
    /// A ship was selected.
    SelectShip {
        /// Selected ship.
        ship: ShipId,
    },
    /// A ship ended its turn on a new cell.
    MoveShip {
        /// Moving ship.
        ship: ShipId,
        /// Destination cell.
        to: Position,
    },
    /// A ship fired its primary weapon.
    Shoot {
        /// Shooting ship.
        ship: ShipId,
        /// Hit ship.
        target: ShipId,
    },
    /// A ship used its special ability.
    UseSpecial {
        /// Acting ship.
        ship: ShipId,
        /// Affected ship or area.
        target: TargetChoice,
    },
    /// A ship restored a disabled friendly ship.
    Assist {
        /// Acting ship.
        ship: ShipId,
        /// Restored ship.
        target: ShipId,
    },
    /// A ship claimed the scoring cell it stands on.
    ClaimPoints {
        /// Claiming ship.
        ship: ShipId,
    },
    /// A ship left the battle.
    Retreat {
        /// Retreating ship.
        ship: ShipId,
    },
}

impl TutorialAction {
    /// Splits a committed intent into the actions a step reasons about.
    ///
    /// A move is reported separately from the action taken at the
    /// destination. A pass without moving yields nothing.
    #[must_use]
    pub fn from_intent(intent: &ActionIntent, origin: Position) -> Vec<Self> {
        let ship = intent.ship;
        let mut actions = Vec::with_capacity(2);
        if intent.destination != origin {
            actions.push(Self::MoveShip {
                ship,
                to: intent.destination,
            });
        }
        match intent.action {
            ActionKind::Pass => {}
            ActionKind::Shoot { target } => actions.push(Self::Shoot { ship, target }),
            ActionKind::Special { target } => actions.push(Self::UseSpecial { ship, target }),
            ActionKind::Assist { target } => actions.push(Self::Assist { ship, target }),
            ActionKind::ClaimPoints => actions.push(Self::ClaimPoints { ship }),
            ActionKind::Retreat => actions.push(Self::Retreat { ship }),
        }
        actions
    }
}

/// Destinations a ship may move to during a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveAllowance {
    /// Ship allowed to move.
    pub ship: ShipId,
    /// Permitted destinations.
    pub destinations: Vec<Position>,
}

/// Ships a ship may target during a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetAllowance {
    /// Acting ship.
    pub ship: ShipId,
    /// Permitted targets.
    pub targets: Vec<ShipId>,
}

impl TargetAllowance {
    fn permits(&self, ship: ShipId, target: ShipId) -> bool {
        self.ship == ship && self.targets.contains(&target)
    }
}

/// Everything the player may do while a step is active. The default allows nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepAllowances {
    /// Ships that may be selected.
    pub selectable: Vec<ShipId>,
    /// Permitted move.
    pub movement: Option<MoveAllowance>,
    /// Permitted primary weapon shot.
    pub shoot: Option<TargetAllowance>,
    /// Permitted special ability use.
    pub special: Option<TargetAllowance>,
    /// Permitted assist.
    pub assist: Option<TargetAllowance>,
    /// Whether scoring cells may be claimed explicitly.
    pub claim_points: bool,
    /// Whether ships may retreat.
    pub retreat: bool,
}

impl StepAllowances {
    /// Reports whether the ship may be selected.
    #[must_use]
    pub fn may_select(&self, ship: ShipId) -> bool {
        self.selectable.contains(&ship)
    }

    /// Reports whether the ship may move to the cell.
    #[must_use]
    pub fn may_move(&self, ship: ShipId, to: Position) -> bool {
        self.movement
            .as_ref()
            .is_some_and(|allowance| allowance.ship == ship && allowance.destinations.contains(&to))
    }

    /// Reports whether the ship may pick the target with any permitted action.
    #[must_use]
    pub fn may_target(&self, ship: ShipId, target: TargetChoice) -> bool {
        match target {
            TargetChoice::Ship(target) => [&self.shoot, &self.special, &self.assist]
                .into_iter()
                .flatten()
                .any(|allowance| allowance.permits(ship, target)),
            TargetChoice::AreaEffect => self
                .special
                .as_ref()
                .is_some_and(|allowance| allowance.ship == ship),
        }
    }

    /// Reports whether the action is permitted.
    #[must_use]
    pub fn permits(&self, action: &TutorialAction) -> bool {
        match *action {
            TutorialAction::SelectShip { ship } => self.may_select(ship),
            TutorialAction::MoveShip { ship, to } => self.may_move(ship, to),
            TutorialAction::Shoot { ship, target } => self
                .shoot
                .as_ref()
                .is_some_and(|allowance| allowance.permits(ship, target)),
            TutorialAction::UseSpecial { ship, target } => {
                self.special.as_ref().is_some_and(|allowance| match target {
                    TargetChoice::Ship(target) => allowance.permits(ship, target),
                    TargetChoice::AreaEffect => allowance.ship == ship,
                })
            }
            TutorialAction::Assist { ship, target } => self
                .assist
                .as_ref()
                .is_some_and(|allowance| allowance.permits(ship, target)),
            TutorialAction::ClaimPoints { .. } => self.claim_points,
            TutorialAction::Retreat { .. } => self.retreat,
        }
    }
}

/// Condition that completes a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Informational step, complete as soon as it is shown.
    Acknowledge,
    /// Any of the listed ships gets selected.
    Select {
        /// Ships whose selection completes the step.
        ships: Vec<ShipId>,
    },
    /// The ship ends its turn on one of the listed cells.
    Move {
        /// Moving ship.
        ship: ShipId,
        /// Cells that complete the step.
        to: Vec<Position>,
    },
    /// The exact action is performed.
    Perform(TutorialAction),
}

impl Completion {
    /// Reports whether the action completes the step.
    #[must_use]
    pub fn is_satisfied_by(&self, action: &TutorialAction) -> bool {
        match (self, action) {
            (Self::Acknowledge, _) => true,
            (Self::Select { ships }, TutorialAction::SelectShip { ship }) => ships.contains(ship),
            (Self::Move { ship, to }, TutorialAction::MoveShip { ship: moved, to: cell }) => {
                ship == moved && to.contains(cell)
            }
            (Self::Perform(expected), performed) => expected == performed,
            _ => false,
        }
    }
}

/// One step of a scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioStep {
    /// Stable identifier.
    pub id: &'static str,
    /// Heading shown to the player.
    pub title: &'static str,
    /// Instructions shown to the player.
    pub description: &'static str,
    /// Permitted transitions.
    pub allowances: StepAllowances,
    /// Completion condition.
    pub completion: Completion,
    /// Commits wait for an explicit approval.
    pub requires_transaction: bool,
    /// Commits apply immediately and the approval confirms them afterwards.
    pub show_transaction_after: bool,
    /// World commands applied when the step becomes active.
    pub setup: Vec<Command>,
}
