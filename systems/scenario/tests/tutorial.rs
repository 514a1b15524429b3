use warpflow_core::{Event, Position, Scores, TargetChoice, WeaponMode, STATUS_EMP_DISRUPTED};
use warpflow_system_actions::CommitKind;
use warpflow_system_scenario::{
    tutorial::{
        self, DISABLED_ENEMY, EMP_VESSEL, ENEMY_DESTROYER, ENEMY_FIGHTER, SCOUT, SUPPORT,
    },
    GateOutcome, ScenarioGate,
};
use warpflow_world::query;

fn position_of(gate: &ScenarioGate, ship: warpflow_core::ShipId) -> Option<Position> {
    query::ship(gate.world(), ship).map(|snapshot| snapshot.position)
}

fn hull_of(gate: &ScenarioGate, ship: warpflow_core::ShipId) -> u32 {
    query::attributes(gate.world(), ship)
        .map(|attributes| attributes.hull_points)
        .expect("ship has attributes")
}

fn advance_to(gate: &mut ScenarioGate, id: &str) {
    while gate.current_step().map(|step| step.id) != Some(id) {
        assert!(gate.next_step(), "step {id} not found");
    }
}

fn commit_and_approve(gate: &mut ScenarioGate, kind: CommitKind) {
    let outcome = gate.commit(kind).expect("commit passes the gate");
    assert!(
        matches!(outcome, GateOutcome::AwaitingApproval(_)),
        "tutorial commits wait for approval"
    );
    let _ = gate.approve_transaction().expect("approval succeeds");
    assert!(gate.is_step_complete(), "approved action completes the step");
}

#[test]
fn informational_steps_lock_selection() {
    let mut gate = tutorial::gate();
    assert!(gate.is_step_complete(), "welcome step needs no action");
    let rejection = gate.select_ship(SCOUT).expect_err("selection locked");
    assert_eq!(rejection.message, "Ship selection not allowed in this step");
    assert_eq!(rejection.cause, None);
    assert!(gate.machine().selection().is_none());
}

#[test]
fn select_step_accepts_only_listed_ships() {
    let mut gate = tutorial::gate();
    advance_to(&mut gate, "select-ship");
    assert!(!gate.is_step_complete());

    let rejection = gate.select_ship(ENEMY_FIGHTER).expect_err("enemy locked");
    assert_eq!(rejection.message, "This ship cannot be selected in this step");

    let _ = gate.select_ship(EMP_VESSEL).expect("player ship selectable");
    assert!(gate.is_step_complete());
}

#[test]
fn move_step_shows_the_move_before_approval_and_rolls_back() {
    let mut gate = tutorial::gate();
    advance_to(&mut gate, "move-ship");
    let _ = gate.select_ship(SCOUT).expect("scout selectable");

    let rejection = gate
        .preview_move(Position::new(4, 5))
        .expect_err("unlisted cell");
    assert_eq!(rejection.message, "This position is not allowed in this step");

    let idle = gate.commit(CommitKind::Pass).expect_err("staying put");
    assert_eq!(idle.message, "This action is not allowed in this step");

    gate.preview_move(Position::new(5, 7)).expect("listed cell");
    let before = gate.world().clone();
    let outcome = gate.commit(CommitKind::Pass).expect("move allowed");
    assert!(matches!(outcome, GateOutcome::AwaitingApproval(_)));
    assert_eq!(position_of(&gate, SCOUT), Some(Position::new(5, 7)));
    assert!(!gate.is_step_complete(), "completion waits for approval");

    let locked = gate.select_ship(SCOUT).expect_err("pending transaction");
    assert_eq!(
        locked.message,
        "Approve or reject the pending transaction first"
    );

    let _ = gate.reject_transaction().expect("pending transaction");
    assert_eq!(gate.world(), &before, "rejection restores the world");
    assert_eq!(
        gate.machine().selection().and_then(|selection| selection.preview),
        Some(Position::new(5, 7)),
        "rejection restores the staged move"
    );

    commit_and_approve(&mut gate, CommitKind::Pass);
    assert_eq!(position_of(&gate, SCOUT), Some(Position::new(5, 7)));
    assert!(query::has_moved(gate.world(), SCOUT));
}

#[test]
fn dragging_respects_the_listed_cells() {
    let mut gate = tutorial::gate();
    advance_to(&mut gate, "move-ship");
    gate.begin_drag(SCOUT).expect("scout draggable");

    assert_eq!(gate.drag_over(Position::new(4, 5)), Ok(false));
    assert_eq!(gate.drag_over(Position::new(6, 7)), Ok(true));
    let rejection = gate.drop(Position::new(4, 5)).expect_err("unlisted cell");
    assert_eq!(rejection.message, "This position is not allowed in this step");

    gate.drop(Position::new(6, 7)).expect("listed cell");
    assert_eq!(
        gate.machine().selection().and_then(|selection| selection.preview),
        Some(Position::new(6, 7))
    );
}

#[test]
fn held_transactions_leave_the_world_untouched_until_approved() {
    let mut gate = tutorial::gate();
    advance_to(&mut gate, "score-points");
    assert_eq!(
        query::scores(gate.world()),
        Scores {
            creator: 0,
            joiner: 2,
        },
        "the destroyer claimed the bonus tile during setup"
    );
    assert_eq!(
        position_of(&gate, ENEMY_DESTROYER),
        Some(Position::new(8, 9))
    );

    let _ = gate.select_ship(SCOUT).expect("scout selectable");
    gate.preview_move(Position::new(5, 8)).expect("scoring tile");
    let before = gate.world().clone();
    let outcome = gate.commit(CommitKind::Pass).expect("move allowed");
    assert_eq!(
        gate.pending_intent(),
        Some(outcome.intent()),
        "intent is held"
    );
    assert_eq!(gate.world(), &before);

    let _ = gate.approve_transaction().expect("pending transaction");
    assert_eq!(position_of(&gate, SCOUT), Some(Position::new(5, 8)));
    assert_eq!(query::scores(gate.world()).creator, 1);
    assert!(gate.is_step_complete());
    assert!(gate.approve_transaction().is_err(), "nothing left to approve");
}

#[test]
fn full_walkthrough_reaches_the_final_step() {
    let mut gate = tutorial::gate();

    advance_to(&mut gate, "select-ship");
    let _ = gate.select_ship(SUPPORT).expect("support selectable");

    advance_to(&mut gate, "move-ship");
    let _ = gate.select_ship(SCOUT).expect("scout selectable");
    gate.preview_move(Position::new(5, 6)).expect("listed cell");
    commit_and_approve(&mut gate, CommitKind::Pass);

    advance_to(&mut gate, "score-points");
    let _ = gate.select_ship(SCOUT).expect("scout selectable");
    gate.preview_move(Position::new(5, 8)).expect("scoring tile");
    commit_and_approve(&mut gate, CommitKind::Pass);

    advance_to(&mut gate, "shoot");
    let _ = gate.select_ship(SCOUT).expect("scout selectable");
    let rejection = gate
        .select_target(TargetChoice::Ship(DISABLED_ENEMY))
        .expect_err("not this step's target");
    assert_eq!(rejection.message, "This target is not allowed in this step");
    gate.select_target(TargetChoice::Ship(ENEMY_FIGHTER))
        .expect("fighter in range");
    commit_and_approve(&mut gate, CommitKind::Shoot);
    assert_eq!(hull_of(&gate, ENEMY_FIGHTER), 76, "25 damage less 5% armor");

    advance_to(&mut gate, "special-emp");
    let _ = gate.select_ship(EMP_VESSEL).expect("EMP vessel selectable");
    gate.switch_weapon_mode(WeaponMode::Special)
        .expect("EMP fitted");
    gate.select_target(TargetChoice::Ship(ENEMY_FIGHTER))
        .expect("fighter within EMP range");
    commit_and_approve(&mut gate, CommitKind::Special);
    let fighter = query::attributes(gate.world(), ENEMY_FIGHTER).expect("fighter loaded");
    assert_eq!(fighter.status_effects, vec![STATUS_EMP_DISRUPTED]);
    assert_eq!(fighter.hull_points, 76, "EMP deals no damage");

    advance_to(&mut gate, "special-repair");
    assert_eq!(hull_of(&gate, SCOUT), 40);
    let _ = gate.select_ship(SUPPORT).expect("support selectable");
    gate.switch_weapon_mode(WeaponMode::Special)
        .expect("repair fitted");
    gate.select_target(TargetChoice::Ship(SCOUT))
        .expect("scout within repair range");
    commit_and_approve(&mut gate, CommitKind::Special);
    assert_eq!(hull_of(&gate, SCOUT), 70);

    advance_to(&mut gate, "rescue");
    assert_eq!(hull_of(&gate, SCOUT), 0);
    let _ = gate.select_ship(SUPPORT).expect("support selectable");
    gate.select_target(TargetChoice::Ship(SCOUT))
        .expect("disabled scout adjacent");
    commit_and_approve(&mut gate, CommitKind::Assist);
    let scout = query::attributes(gate.world(), SCOUT).expect("scout loaded");
    assert_eq!(scout.hull_points, 20);
    assert_eq!(scout.reactor_critical_timer, 0);

    advance_to(&mut gate, "destroy-disabled");
    let _ = gate.select_ship(SCOUT).expect("scout selectable");
    gate.select_target(TargetChoice::Ship(DISABLED_ENEMY))
        .expect("disabled enemy in range");
    commit_and_approve(&mut gate, CommitKind::Shoot);
    assert_eq!(
        query::ship(gate.world(), DISABLED_ENEMY),
        None,
        "third reactor critical destroys the ship"
    );

    advance_to(&mut gate, "complete");
    assert!(gate.is_step_complete());
    assert!(!gate.next_step(), "no step after the last one");
    assert_eq!(
        query::scores(gate.world()),
        Scores {
            creator: 3,
            joiner: 2,
        },
        "scout scored on the tile after the move and both shots"
    );
}

#[test]
fn previous_step_rebuilds_from_the_initial_world() {
    let mut gate = tutorial::gate();
    advance_to(&mut gate, "score-points");
    let _ = gate.select_ship(SCOUT).expect("scout selectable");
    gate.preview_move(Position::new(5, 8)).expect("scoring tile");
    commit_and_approve(&mut gate, CommitKind::Pass);
    assert!(gate.next_step());

    assert!(gate.previous_step());
    assert_eq!(gate.current_step().map(|step| step.id), Some("score-points"));
    assert!(!gate.is_step_complete());
    assert_eq!(
        position_of(&gate, SCOUT),
        Some(Position::new(5, 5)),
        "player moves are not replayed"
    );
    assert_eq!(query::scores(gate.world()).joiner, 2, "setup is replayed");
    assert!(gate.machine().selection().is_none());

    gate.reset();
    assert_eq!(gate.step_index(), 0);
    assert_eq!(gate.world(), &tutorial::initial_world());
    assert!(!gate.previous_step(), "no step before the first one");
}

#[test]
fn moving_on_abandons_a_shown_transaction() {
    let mut gate = tutorial::gate();
    advance_to(&mut gate, "move-ship");
    let _ = gate.select_ship(SCOUT).expect("scout selectable");
    gate.preview_move(Position::new(6, 7)).expect("listed cell");
    let _ = gate.commit(CommitKind::Pass).expect("move allowed");
    assert_eq!(position_of(&gate, SCOUT), Some(Position::new(6, 7)));

    assert!(gate.next_step());
    assert_eq!(gate.pending_intent(), None);
    assert_eq!(
        position_of(&gate, SCOUT),
        Some(Position::new(5, 5)),
        "unapproved move is rolled back"
    );
}

#[test]
fn rolled_back_transactions_leave_no_events_behind() {
    let mut gate = tutorial::gate();
    advance_to(&mut gate, "move-ship");
    let _ = gate.select_ship(SCOUT).expect("scout selectable");
    gate.preview_move(Position::new(5, 7)).expect("listed cell");
    let _ = gate.take_events();

    let _ = gate.commit(CommitKind::Pass).expect("move allowed");
    let _ = gate.reject_transaction().expect("pending transaction");
    assert!(gate.take_events().is_empty(), "rejected move is not reported");

    let _ = gate.commit(CommitKind::Pass).expect("move allowed");
    assert!(gate.next_step());
    assert!(
        !gate
            .take_events()
            .iter()
            .any(|event| matches!(event, Event::ShipMoved { ship, .. } if *ship == SCOUT)),
        "abandoned move is not reported"
    );
}
