//! Step-aware wrapper around the action state machine.

use log::{debug, info};
use thiserror::Error;
use warpflow_core::{
    ActionIntent, Command, Event, IllegalTransition, Position, ShipId, Side, TargetChoice,
    WeaponMode,
};
use warpflow_system_actions::{ActionMachine, CommitKind, Selection};
use warpflow_world::{self as world, query, World};

use crate::{ScenarioStep, SimulatedAuthority, StepAllowances, TutorialAction};

const SELECTION_LOCKED: &str = "Ship selection not allowed in this step";
const SHIP_LOCKED: &str = "This ship cannot be selected in this step";
const POSITION_LOCKED: &str = "This position is not allowed in this step";
const TARGET_LOCKED: &str = "This target is not allowed in this step";
const ACTION_LOCKED: &str = "This action is not allowed in this step";
const TRANSACTION_PENDING: &str = "Approve or reject the pending transaction first";
const NOTHING_PENDING: &str = "No transaction is pending";

/// Refusal of a transition. The gate and its machine are left untouched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GateRejection {
    /// Explanation shown to the player.
    pub message: String,
    /// Machine error behind the rejection, when the step allowed the transition.
    pub cause: Option<IllegalTransition>,
}

impl GateRejection {
    fn locked(message: &str) -> Self {
        Self {
            message: message.to_owned(),
            cause: None,
        }
    }
}

impl From<IllegalTransition> for GateRejection {
    fn from(cause: IllegalTransition) -> Self {
        Self {
            message: cause.to_string(),
            cause: Some(cause),
        }
    }
}

/// Result of a commit that passed the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateOutcome {
    /// The action was resolved.
    Applied(ActionIntent),
    /// The action waits for [`ScenarioGate::approve_transaction`].
    AwaitingApproval(ActionIntent),
}

impl GateOutcome {
    /// Intent behind the outcome.
    #[must_use]
    pub const fn intent(&self) -> ActionIntent {
        match self {
            Self::Applied(intent) | Self::AwaitingApproval(intent) => *intent,
        }
    }
}

#[derive(Clone, Debug)]
struct PendingTransaction {
    kind: CommitKind,
    intent: ActionIntent,
    actions: Vec<TutorialAction>,
    rollback: Option<Box<Rollback>>,
}

/// State saved before a transaction that is applied ahead of its approval.
#[derive(Clone, Debug)]
struct Rollback {
    world: World,
    machine: ActionMachine,
    /// Length of the event queue before the transaction ran.
    queued_events: usize,
}

/// Action state machine constrained by a scripted list of steps.
#[derive(Clone, Debug)]
pub struct ScenarioGate {
    steps: Vec<ScenarioStep>,
    index: usize,
    initial: World,
    world: World,
    machine: ActionMachine,
    authority: SimulatedAuthority,
    pending: Option<PendingTransaction>,
    completed: bool,
    events: Vec<Event>,
}

impl ScenarioGate {
    /// Creates a gate on the first step, applying its setup to `initial`.
    #[must_use]
    pub fn new(
        steps: Vec<ScenarioStep>,
        initial: World,
        acting_side: Side,
        authority: SimulatedAuthority,
    ) -> Self {
        let mut gate = Self {
            steps,
            index: 0,
            world: initial.clone(),
            initial,
            machine: ActionMachine::new(acting_side),
            authority,
            pending: None,
            completed: false,
            events: Vec::new(),
        };
        gate.rebuild();
        gate
    }

    /// World as the player currently sees it.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Wrapped action state machine.
    #[must_use]
    pub const fn machine(&self) -> &ActionMachine {
        &self.machine
    }

    /// All steps of the scenario.
    #[must_use]
    pub fn steps(&self) -> &[ScenarioStep] {
        &self.steps
    }

    /// Index of the active step.
    #[must_use]
    pub const fn step_index(&self) -> usize {
        self.index
    }

    /// Active step, or `None` for an empty scenario.
    #[must_use]
    pub fn current_step(&self) -> Option<&ScenarioStep> {
        self.steps.get(self.index)
    }

    /// Intent waiting for approval.
    #[must_use]
    pub fn pending_intent(&self) -> Option<ActionIntent> {
        self.pending.as_ref().map(|pending| pending.intent)
    }

    /// Reports whether the active step's completion condition was met.
    #[must_use]
    pub fn is_step_complete(&self) -> bool {
        self.completed
    }

    /// Hands out the world events produced since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Selects a ship the active step allows.
    pub fn select_ship(&mut self, ship: ShipId) -> Result<Selection, GateRejection> {
        self.ensure_idle()?;
        self.check_selectable(ship)?;
        let selection = self.machine.select_ship(&self.world, ship)?;
        self.record(&[TutorialAction::SelectShip { ship }]);
        Ok(selection)
    }

    /// Clears the selection. Always allowed outside a pending transaction.
    pub fn deselect(&mut self) -> Result<(), GateRejection> {
        self.ensure_idle()?;
        self.machine.deselect();
        Ok(())
    }

    /// Stages a destination the active step allows.
    pub fn preview_move(&mut self, destination: Position) -> Result<(), GateRejection> {
        self.ensure_idle()?;
        self.check_destination(destination)?;
        self.machine.preview_move(&self.world, destination)?;
        Ok(())
    }

    /// Drops the staged destination.
    pub fn cancel_preview(&mut self) -> Result<(), GateRejection> {
        self.ensure_idle()?;
        self.machine.cancel_preview()?;
        Ok(())
    }

    /// Switches between primary weapon and special ability.
    pub fn switch_weapon_mode(&mut self, mode: WeaponMode) -> Result<(), GateRejection> {
        self.ensure_idle()?;
        self.machine.switch_weapon_mode(&self.world, mode)?;
        Ok(())
    }

    /// Picks a target the active step allows.
    pub fn select_target(&mut self, target: TargetChoice) -> Result<(), GateRejection> {
        self.ensure_idle()?;
        if let Some(selection) = self.machine.selection() {
            if !self.allowances().may_target(selection.ship, target) {
                debug!("target {target:?} locked in step {}", self.index);
                return Err(GateRejection::locked(TARGET_LOCKED));
            }
        }
        self.machine.select_target(&self.world, target)?;
        Ok(())
    }

    /// Drops the picked target.
    pub fn clear_target(&mut self) -> Result<(), GateRejection> {
        self.ensure_idle()?;
        self.machine.clear_target();
        Ok(())
    }

    /// Starts dragging a ship the active step allows.
    pub fn begin_drag(&mut self, ship: ShipId) -> Result<(), GateRejection> {
        self.ensure_idle()?;
        self.check_selectable(ship)?;
        self.machine.begin_drag(&self.world, ship)?;
        Ok(())
    }

    /// Moves the drag pointer. Returns whether the cell is a legal drop.
    pub fn drag_over(&mut self, cell: Position) -> Result<bool, GateRejection> {
        self.ensure_idle()?;
        let legal = self.machine.drag_over(&self.world, cell)?;
        Ok(legal && self.destination_allowed(cell))
    }

    /// Drops the dragged ship on a cell the active step allows.
    pub fn drop(&mut self, cell: Position) -> Result<(), GateRejection> {
        self.ensure_idle()?;
        self.check_destination(cell)?;
        self.machine.drop(&self.world, cell)?;
        Ok(())
    }

    /// Abandons the drag in progress.
    pub fn cancel_drag(&mut self) -> Result<(), GateRejection> {
        self.ensure_idle()?;
        self.machine.cancel_drag();
        Ok(())
    }

    /// Commits the selected ship's turn if the active step allows the action.
    ///
    /// Steps that require a transaction either hold the commit until it is
    /// approved, or apply it right away and keep a rollback copy when the
    /// step shows the transaction afterwards.
    pub fn commit(&mut self, kind: CommitKind) -> Result<GateOutcome, GateRejection> {
        self.ensure_idle()?;
        let intent = self.machine.plan_commit(&self.world, kind)?;
        let origin = query::ship(&self.world, intent.ship)
            .map_or(intent.destination, |ship| ship.position);
        let actions = TutorialAction::from_intent(&intent, origin);
        let allowances = self.allowances();
        if actions.is_empty() || !actions.iter().all(|action| allowances.permits(action)) {
            debug!("commit {kind:?} of ship {} locked in step {}", intent.ship, self.index);
            return Err(GateRejection::locked(ACTION_LOCKED));
        }

        let (requires_transaction, show_after) = self
            .current_step()
            .map_or((false, false), |step| {
                (step.requires_transaction, step.show_transaction_after)
            });
        if !requires_transaction {
            let intent = self.execute(kind)?;
            self.record(&actions);
            return Ok(GateOutcome::Applied(intent));
        }

        let rollback = if show_after {
            let saved = Box::new(Rollback {
                world: self.world.clone(),
                machine: self.machine.clone(),
                queued_events: self.events.len(),
            });
            let _ = self.execute(kind)?;
            Some(saved)
        } else {
            None
        };
        self.pending = Some(PendingTransaction {
            kind,
            intent,
            actions,
            rollback,
        });
        info!("transaction for ship {} awaiting approval", intent.ship);
        Ok(GateOutcome::AwaitingApproval(intent))
    }

    /// Confirms the pending transaction.
    pub fn approve_transaction(&mut self) -> Result<ActionIntent, GateRejection> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| GateRejection::locked(NOTHING_PENDING))?;
        let intent = if pending.rollback.is_some() {
            pending.intent
        } else {
            match self.execute(pending.kind) {
                Ok(intent) => intent,
                Err(rejection) => {
                    self.pending = Some(pending);
                    return Err(rejection);
                }
            }
        };
        self.record(&pending.actions);
        info!("transaction for ship {} approved", intent.ship);
        Ok(intent)
    }

    /// Abandons the pending transaction, restoring any optimistic changes.
    pub fn reject_transaction(&mut self) -> Result<ActionIntent, GateRejection> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| GateRejection::locked(NOTHING_PENDING))?;
        if let Some(saved) = pending.rollback {
            self.restore(*saved);
        }
        info!("transaction for ship {} rejected", pending.intent.ship);
        Ok(pending.intent)
    }

    /// Advances to the next step. Returns `false` on the last step.
    pub fn next_step(&mut self) -> bool {
        if self.index + 1 >= self.steps.len() {
            return false;
        }
        self.drop_pending();
        self.index += 1;
        if let Some(step) = self.steps.get(self.index) {
            let setup = step.setup.clone();
            self.apply_all(setup);
        }
        self.enter_step();
        true
    }

    /// Returns to the previous step. Returns `false` on the first step.
    ///
    /// The world is rebuilt from the initial state and the setup of every
    /// step up to the new one.
    pub fn previous_step(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        self.rebuild();
        true
    }

    /// Restarts the scenario from its first step.
    pub fn reset(&mut self) {
        self.index = 0;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.drop_pending();
        self.world = self.initial.clone();
        let setup: Vec<Command> = self
            .steps
            .iter()
            .take(self.index + 1)
            .flat_map(|step| step.setup.iter().cloned())
            .collect();
        self.apply_all(setup);
        self.enter_step();
    }

    fn enter_step(&mut self) {
        self.machine.reset();
        self.completed = self
            .current_step()
            .is_some_and(|step| step.completion == crate::Completion::Acknowledge);
        if let Some(step) = self.current_step() {
            info!("scenario step {} ({})", self.index, step.id);
        }
    }

    fn drop_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            if let Some(saved) = pending.rollback {
                self.restore(*saved);
            }
        }
    }

    /// Puts back the state saved before an optimistic transaction and
    /// forgets the events it queued.
    fn restore(&mut self, saved: Rollback) {
        self.world = saved.world;
        self.machine = saved.machine;
        self.events.truncate(saved.queued_events);
    }

    fn execute(&mut self, kind: CommitKind) -> Result<ActionIntent, GateRejection> {
        let mut optimistic = Vec::new();
        let intent = self.machine.commit(&self.world, kind, &mut optimistic)?;
        self.apply_all(optimistic);

        let mut confirmed = Vec::new();
        self.authority.resolve(&self.world, &intent, &mut confirmed);
        self.apply_all(confirmed);
        self.machine.reconcile(&self.world);
        Ok(intent)
    }

    fn apply_all(&mut self, commands: Vec<Command>) {
        for command in commands {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    fn record(&mut self, actions: &[TutorialAction]) {
        let Some(step) = self.current_step() else {
            return;
        };
        if actions
            .iter()
            .any(|action| step.completion.is_satisfied_by(action))
        {
            if !self.completed {
                info!("scenario step {} ({}) complete", self.index, step.id);
            }
            self.completed = true;
        }
    }

    fn allowances(&self) -> StepAllowances {
        self.current_step()
            .map(|step| step.allowances.clone())
            .unwrap_or_default()
    }

    fn ensure_idle(&self) -> Result<(), GateRejection> {
        if self.pending.is_some() {
            return Err(GateRejection::locked(TRANSACTION_PENDING));
        }
        Ok(())
    }

    fn check_selectable(&self, ship: ShipId) -> Result<(), GateRejection> {
        let allowances = self.allowances();
        if allowances.selectable.is_empty() {
            return Err(GateRejection::locked(SELECTION_LOCKED));
        }
        if !allowances.may_select(ship) {
            debug!("ship {ship} locked in step {}", self.index);
            return Err(GateRejection::locked(SHIP_LOCKED));
        }
        Ok(())
    }

    fn destination_allowed(&self, destination: Position) -> bool {
        let Some(selection) = self.machine.selection() else {
            return true;
        };
        let staying = query::ship(&self.world, selection.ship)
            .is_some_and(|ship| ship.position == destination);
        staying || self.allowances().may_move(selection.ship, destination)
    }

    fn check_destination(&self, destination: Position) -> Result<(), GateRejection> {
        if self.destination_allowed(destination) {
            Ok(())
        } else {
            debug!("destination {destination} locked in step {}", self.index);
            Err(GateRejection::locked(POSITION_LOCKED))
        }
    }
}
