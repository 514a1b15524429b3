use std::{fmt, io::Write};

use anyhow::{Context, Result};
use log::{debug, info};
use warpflow_core::{Position, Scores, ShipId, TargetChoice, WeaponMode};
use warpflow_rendering::{build_scene, RenderingBackend};
use warpflow_system_actions::CommitKind;
use warpflow_system_scenario::{
    tutorial::{self, DISABLED_ENEMY, EMP_VESSEL, ENEMY_FIGHTER, SCOUT, SUPPORT},
    GateOutcome, ScenarioGate,
};
use warpflow_world::query;

use crate::ascii::AsciiBackend;

/// Player input replayed against the tutorial gate.
#[derive(Clone, Copy, Debug)]
enum Order {
    Next,
    Select(ShipId),
    Stage(Position),
    Mode(WeaponMode),
    Target(TargetChoice),
    Commit(CommitKind),
    Approve,
    Reject,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => write!(f, "next step"),
            Self::Select(ship) => write!(f, "select {ship}"),
            Self::Stage(cell) => write!(f, "stage move to {cell}"),
            Self::Mode(WeaponMode::Primary) => write!(f, "switch to primary weapon"),
            Self::Mode(WeaponMode::Special) => write!(f, "switch to special ability"),
            Self::Target(TargetChoice::Ship(ship)) => write!(f, "target {ship}"),
            Self::Target(TargetChoice::AreaEffect) => write!(f, "target area"),
            Self::Commit(kind) => write!(f, "commit {kind:?}"),
            Self::Approve => write!(f, "approve transaction"),
            Self::Reject => write!(f, "reject transaction"),
        }
    }
}

/// Result of a scripted tutorial run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WalkthroughSummary {
    /// Index of the step the run ended on.
    pub(crate) final_step: usize,
    /// Inputs the gate refused.
    pub(crate) rejections: usize,
    /// Scores after the last step.
    pub(crate) scores: Scores,
}

/// Plays the scripted tutorial, printing every step and the outcome of each input.
pub(crate) fn run<W: Write>(out: &mut W, show_grid: bool) -> Result<WalkthroughSummary> {
    let mut gate = tutorial::gate();
    let mut rejections = 0;

    announce_step(out, &gate)?;
    for order in script() {
        if matches!(order, Order::Next) {
            if show_grid {
                let scene = build_scene(gate.world(), gate.machine());
                AsciiBackend::new(&mut *out).present(&scene)?;
            }
            if !gate.next_step() {
                debug!("walkthrough script ran past the final step");
                break;
            }
            announce_step(out, &gate)?;
            continue;
        }

        let written = match apply(&mut gate, order) {
            Ok(outcome) => writeln!(out, "  > {order}: {outcome}"),
            Err(message) => {
                rejections += 1;
                writeln!(out, "  > {order}: refused ({message})")
            }
        };
        written.context("failed to write walkthrough line")?;

        for event in gate.take_events() {
            writeln!(out, "    {event:?}").context("failed to write event")?;
        }
    }

    let summary = WalkthroughSummary {
        final_step: gate.step_index(),
        rejections,
        scores: query::scores(gate.world()),
    };
    info!(
        "tutorial finished on step {} with {} refused inputs",
        summary.final_step, summary.rejections
    );
    Ok(summary)
}

fn announce_step<W: Write>(out: &mut W, gate: &ScenarioGate) -> Result<()> {
    let Some(step) = gate.current_step() else {
        return Ok(());
    };
    writeln!(
        out,
        "\n[{}/{}] {}\n{}",
        gate.step_index() + 1,
        gate.steps().len(),
        step.title,
        step.description
    )
    .context("failed to write step heading")
}

fn apply(gate: &mut ScenarioGate, order: Order) -> Result<String, String> {
    let outcome = match order {
        Order::Next => return Ok("advanced".to_owned()),
        Order::Select(ship) => gate.select_ship(ship).map(|_| "selected".to_owned()),
        Order::Stage(cell) => gate.preview_move(cell).map(|()| "staged".to_owned()),
        Order::Mode(mode) => gate.switch_weapon_mode(mode).map(|()| "switched".to_owned()),
        Order::Target(target) => gate.select_target(target).map(|()| "picked".to_owned()),
        Order::Commit(kind) => gate.commit(kind).map(|outcome| match outcome {
            GateOutcome::Applied(_) => "applied".to_owned(),
            GateOutcome::AwaitingApproval(_) => "awaiting approval".to_owned(),
        }),
        Order::Approve => gate.approve_transaction().map(|_| "approved".to_owned()),
        Order::Reject => gate.reject_transaction().map(|_| "rolled back".to_owned()),
    };
    outcome.map_err(|rejection| rejection.message)
}

fn script() -> Vec<Order> {
    vec![
        Order::Next,
        Order::Next,
        Order::Select(SCOUT),
        Order::Next,
        Order::Select(SCOUT),
        Order::Stage(Position::new(5, 7)),
        Order::Commit(CommitKind::Pass),
        Order::Reject,
        Order::Commit(CommitKind::Pass),
        Order::Approve,
        Order::Next,
        Order::Select(SCOUT),
        Order::Stage(Position::new(5, 8)),
        Order::Commit(CommitKind::Pass),
        Order::Approve,
        Order::Next,
        Order::Select(SCOUT),
        Order::Target(TargetChoice::Ship(DISABLED_ENEMY)),
        Order::Target(TargetChoice::Ship(ENEMY_FIGHTER)),
        Order::Commit(CommitKind::Shoot),
        Order::Approve,
        Order::Next,
        Order::Select(EMP_VESSEL),
        Order::Mode(WeaponMode::Special),
        Order::Target(TargetChoice::Ship(ENEMY_FIGHTER)),
        Order::Commit(CommitKind::Special),
        Order::Approve,
        Order::Next,
        Order::Select(SUPPORT),
        Order::Mode(WeaponMode::Special),
        Order::Target(TargetChoice::Ship(SCOUT)),
        Order::Commit(CommitKind::Special),
        Order::Approve,
        Order::Next,
        Order::Select(SUPPORT),
        Order::Target(TargetChoice::Ship(SCOUT)),
        Order::Commit(CommitKind::Assist),
        Order::Approve,
        Order::Next,
        Order::Select(SCOUT),
        Order::Target(TargetChoice::Ship(DISABLED_ENEMY)),
        Order::Commit(CommitKind::Shoot),
        Order::Approve,
        Order::Next,
    ]
}
