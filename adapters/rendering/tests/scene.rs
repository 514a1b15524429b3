use warpflow_core::{Command, Position, Side, TargetChoice};
use warpflow_rendering::{
    build_scene, palette, scoring_border, CellVisual, Scene, SceneLabel, TargetTint,
};
use warpflow_system_actions::ActionMachine;
use warpflow_system_scenario::tutorial::{
    self, DISABLED_ENEMY, EMP_VESSEL, ENEMY_FIGHTER, SCOUT,
};
use warpflow_world::{self as world, World};

fn visual(scene: &Scene, row: u32, col: u32) -> CellVisual {
    scene
        .cell(Position::new(row, col))
        .map(|cell| cell.visual)
        .expect("cell inside the grid")
}

fn apply_all(state: &mut World, commands: Vec<Command>) {
    let mut events = Vec::new();
    for command in commands {
        world::apply(state, command, &mut events);
    }
}

#[test]
fn idle_scene_marks_only_terrain() {
    let state = tutorial::initial_world();
    let scene = build_scene(&state, &ActionMachine::new(Side::Creator));

    assert_eq!(scene.cells.len(), 17 * 11);
    assert!(scene
        .cells
        .iter()
        .all(|cell| cell.visual == CellVisual::Idle));
    let bonus = scene.cell(Position::new(8, 9)).expect("bonus tile");
    assert_eq!(bonus.caption.as_deref(), Some("+2!"));
    let blocked = scene.cell(Position::new(3, 8)).expect("obstacle");
    assert!(blocked.context.blocked);
    assert_eq!(blocked.caption, None);
}

#[test]
fn selected_scout_shows_movement_and_threat() {
    let state = tutorial::initial_world();
    let mut machine = ActionMachine::new(Side::Creator);
    let _ = machine.select_ship(&state, SCOUT).expect("scout selectable");
    let scene = build_scene(&state, &machine);

    assert_eq!(visual(&scene, 5, 5), CellVisual::Selected { can_move: true });
    assert_eq!(visual(&scene, 5, 6), CellVisual::MovementTile);
    assert_eq!(
        visual(&scene, 4, 7),
        CellVisual::ThreatTile,
        "friendly ship in range is threatened but neither reachable nor a target"
    );
    assert_eq!(visual(&scene, 5, 11), CellVisual::Idle, "fighter out of range");
    let tile = scene.cell(Position::new(5, 8)).expect("scoring tile");
    assert_eq!(tile.visual, CellVisual::MovementTile);
    assert_eq!(tile.caption.as_deref(), Some("+1"));
}

#[test]
fn picked_target_carries_the_damage_label() {
    let mut state = tutorial::initial_world();
    apply_all(
        &mut state,
        vec![Command::MoveShip {
            ship: SCOUT,
            to: Position::new(5, 8),
        }],
    );
    let mut machine = ActionMachine::new(Side::Creator);
    let _ = machine.select_ship(&state, SCOUT).expect("scout selectable");
    machine
        .select_target(&state, TargetChoice::Ship(ENEMY_FIGHTER))
        .expect("fighter in range");
    let scene = build_scene(&state, &machine);

    assert_eq!(
        visual(&scene, 5, 11),
        CellVisual::SelectedTarget(TargetTint::Weapon)
    );
    assert_eq!(
        visual(&scene, 4, 10),
        CellVisual::ValidTarget(TargetTint::Weapon),
        "disabled enemy {DISABLED_ENEMY} is still a valid target"
    );
    assert_eq!(
        scene.damage_label,
        Some(SceneLabel {
            position: Position::new(5, 11),
            text: "24 DMG".to_owned(),
        })
    );

    let scout = scene.cell(Position::new(5, 8)).expect("scout cell");
    assert!(scout.context.staged, "scoring cell is staged on selection");
    assert!(scoring_border(&scout.context).is_some());
    assert_eq!(
        palette(scout.visual),
        palette(CellVisual::Selected { can_move: true })
    );
}

#[test]
fn ships_that_acted_are_greyed_out_on_their_turn() {
    let mut state = tutorial::initial_world();
    apply_all(&mut state, vec![Command::MarkMoved { ship: EMP_VESSEL }]);
    let scene = build_scene(&state, &ActionMachine::new(Side::Creator));
    assert_eq!(visual(&scene, 4, 7), CellVisual::Moved);

    let opponent_view = build_scene(&state, &ActionMachine::new(Side::Joiner));
    assert_eq!(
        visual(&opponent_view, 4, 7),
        CellVisual::Idle,
        "only the acting side sees its own moved ships"
    );
}
