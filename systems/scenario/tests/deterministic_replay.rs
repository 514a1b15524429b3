use warpflow_core::{Event, GameSnapshot, Position, TargetChoice, WeaponMode};
use warpflow_system_actions::CommitKind;
use warpflow_system_scenario::tutorial::{
    self, DISABLED_ENEMY, EMP_VESSEL, ENEMY_FIGHTER, SCOUT, SUPPORT,
};
use warpflow_world::query;

#[derive(Clone, Copy, Debug)]
enum Input {
    Next,
    Select(warpflow_core::ShipId),
    Stage(Position),
    Mode(WeaponMode),
    Target(TargetChoice),
    Commit(CommitKind),
    Approve,
    Reject,
}

#[test]
fn deterministic_replay_of_the_tutorial_script() {
    let script = scripted_inputs();
    let first = replay(&script);
    let second = replay(&script);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.step, 10, "script walks to the final step");
    assert!(
        first
            .events
            .iter()
            .any(|event| matches!(event, Event::ShipRemoved { ship, .. } if *ship == DISABLED_ENEMY)),
        "disabled enemy destroyed"
    );
    assert_eq!(
        first
            .events
            .iter()
            .filter(|event| matches!(event, Event::PointsAwarded { .. }))
            .count(),
        4,
        "bonus tile once for the joiner, scoring tile three times for the creator"
    );
    assert_eq!(
        first.rejections, 1,
        "the only scripted rejection is the locked target"
    );
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    step: usize,
    events: Vec<Event>,
    snapshot: GameSnapshot,
    rejections: usize,
}

fn replay(script: &[Input]) -> ReplayOutcome {
    let mut gate = tutorial::gate();
    let mut events = Vec::new();
    let mut rejections = 0;

    for input in script {
        let result = match *input {
            Input::Next => {
                assert!(gate.next_step(), "script ran past the last step");
                Ok(())
            }
            Input::Select(ship) => gate.select_ship(ship).map(|_| ()),
            Input::Stage(cell) => gate.preview_move(cell),
            Input::Mode(mode) => gate.switch_weapon_mode(mode),
            Input::Target(target) => gate.select_target(target),
            Input::Commit(kind) => gate.commit(kind).map(|_| ()),
            Input::Approve => gate.approve_transaction().map(|_| ()),
            Input::Reject => gate.reject_transaction().map(|_| ()),
        };
        if result.is_err() {
            rejections += 1;
        }
        events.extend(gate.take_events());
    }

    ReplayOutcome {
        step: gate.step_index(),
        events,
        snapshot: query::snapshot(gate.world()),
        rejections,
    }
}

fn scripted_inputs() -> Vec<Input> {
    vec![
        Input::Next,
        Input::Next,
        Input::Select(SCOUT),
        Input::Next,
        Input::Select(SCOUT),
        Input::Stage(Position::new(5, 7)),
        Input::Commit(CommitKind::Pass),
        Input::Reject,
        Input::Commit(CommitKind::Pass),
        Input::Approve,
        Input::Next,
        Input::Select(SCOUT),
        Input::Stage(Position::new(5, 8)),
        Input::Commit(CommitKind::Pass),
        Input::Approve,
        Input::Next,
        Input::Select(SCOUT),
        Input::Target(TargetChoice::Ship(DISABLED_ENEMY)),
        Input::Target(TargetChoice::Ship(ENEMY_FIGHTER)),
        Input::Commit(CommitKind::Shoot),
        Input::Approve,
        Input::Next,
        Input::Select(EMP_VESSEL),
        Input::Mode(WeaponMode::Special),
        Input::Target(TargetChoice::Ship(ENEMY_FIGHTER)),
        Input::Commit(CommitKind::Special),
        Input::Approve,
        Input::Next,
        Input::Select(SUPPORT),
        Input::Mode(WeaponMode::Special),
        Input::Target(TargetChoice::Ship(SCOUT)),
        Input::Commit(CommitKind::Special),
        Input::Approve,
        Input::Next,
        Input::Select(SUPPORT),
        Input::Target(TargetChoice::Ship(SCOUT)),
        Input::Commit(CommitKind::Assist),
        Input::Approve,
        Input::Next,
        Input::Select(SCOUT),
        Input::Target(TargetChoice::Ship(DISABLED_ENEMY)),
        Input::Commit(CommitKind::Shoot),
        Input::Approve,
        Input::Next,
    ]
}
