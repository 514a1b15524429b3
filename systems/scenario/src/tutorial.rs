//! The scripted tutorial battle on the small grid.
//!
//! Three player ships face three opponents. Each step unlocks exactly the
//! ship, cell or target it teaches, and re-establishes the positions and hull
//! values it relies on so steps can be revisited in any order.

use warpflow_core::{
    Command, MapLayout, Position, ScoringTile, ShipAttributes, ShipId, Side, SpecialAbility,
    SpecialKind, TargetChoice, TUTORIAL_GRID,
};
use warpflow_system_ship_stats::default_special;
use warpflow_world::{self as world, World};

use crate::{
    Completion, MoveAllowance, ScenarioGate, ScenarioStep, SimulatedAuthority, StepAllowances,
    TargetAllowance, TutorialAction,
};

/// Player's laser scout.
pub const SCOUT: ShipId = ShipId::new(1001);
/// Player's EMP vessel.
pub const EMP_VESSEL: ShipId = ShipId::new(1002);
/// Player's repair ship.
pub const SUPPORT: ShipId = ShipId::new(1003);
/// Opponent fighter, target of the weapon lessons.
pub const ENEMY_FIGHTER: ShipId = ShipId::new(2001);
/// Opponent ship that starts disabled.
pub const DISABLED_ENEMY: ShipId = ShipId::new(2002);
/// Opponent destroyer that scores first.
pub const ENEMY_DESTROYER: ShipId = ShipId::new(2003);

const REUSABLE_TILE: Position = Position::new(5, 8);
const BONUS_TILE: Position = Position::new(8, 9);

/// Ship taking part in the tutorial.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TutorialShip {
    /// Identifier.
    pub id: ShipId,
    /// Display name.
    pub name: &'static str,
    /// Owning side.
    pub owner: Side,
    /// Starting cell.
    pub position: Position,
    /// Fitted special ability.
    pub special: SpecialAbility,
    /// Starting attributes.
    pub attributes: ShipAttributes,
}

fn attributes(
    range: u32,
    gun_damage: u32,
    hull: u32,
    max_hull: u32,
    movement: u32,
    reduction: u32,
) -> ShipAttributes {
    ShipAttributes {
        range,
        gun_damage,
        hull_points: hull,
        max_hull_points: max_hull,
        movement,
        damage_reduction: reduction,
        ..ShipAttributes::default()
    }
}

/// Ships of the tutorial in their starting state.
#[must_use]
pub fn roster() -> Vec<TutorialShip> {
    vec![
        TutorialShip {
            id: SCOUT,
            name: "Tutorial Scout",
            owner: Side::Creator,
            position: Position::new(5, 5),
            special: SpecialAbility::NONE,
            attributes: attributes(3, 25, 100, 100, 3, 5),
        },
        TutorialShip {
            id: EMP_VESSEL,
            name: "Tutorial EMP Vessel",
            owner: Side::Creator,
            position: Position::new(4, 7),
            special: default_special(SpecialKind::Emp),
            attributes: attributes(4, 30, 120, 120, 2, 10),
        },
        TutorialShip {
            id: SUPPORT,
            name: "Tutorial Support Ship",
            owner: Side::Creator,
            position: Position::new(6, 6),
            special: default_special(SpecialKind::Repair),
            attributes: attributes(3, 25, 90, 90, 4, 5),
        },
        TutorialShip {
            id: ENEMY_FIGHTER,
            name: "Enemy Fighter",
            owner: Side::Joiner,
            position: Position::new(5, 11),
            special: SpecialAbility::NONE,
            attributes: attributes(3, 25, 100, 100, 3, 5),
        },
        TutorialShip {
            id: DISABLED_ENEMY,
            name: "Disabled Enemy",
            owner: Side::Joiner,
            position: Position::new(4, 10),
            special: SpecialAbility::NONE,
            attributes: ShipAttributes {
                reactor_critical_timer: 2,
                ..attributes(4, 30, 0, 100, 2, 10)
            },
        },
        TutorialShip {
            id: ENEMY_DESTROYER,
            name: "Enemy Destroyer",
            owner: Side::Joiner,
            position: Position::new(7, 12),
            special: SpecialAbility::NONE,
            attributes: attributes(5, 35, 130, 130, 2, 10),
        },
    ]
}

/// Obstacles and scoring tiles of the tutorial map.
#[must_use]
pub fn layout() -> MapLayout {
    MapLayout {
        blocked: vec![
            Position::new(3, 8),
            Position::new(7, 3),
            Position::new(7, 8),
        ],
        scoring: vec![
            ScoringTile {
                position: REUSABLE_TILE,
                points: 1,
                one_time: false,
            },
            ScoringTile {
                position: BONUS_TILE,
                points: 2,
                one_time: true,
            },
        ],
    }
}

/// World at the start of the tutorial.
#[must_use]
pub fn initial_world() -> World {
    let mut state = World::with_dimensions(TUTORIAL_GRID);
    let mut events = Vec::new();
    world::apply(
        &mut state,
        world::configure_map(TUTORIAL_GRID, &layout()),
        &mut events,
    );
    for ship in roster() {
        world::apply(
            &mut state,
            Command::PlaceShip {
                ship: ship.id,
                owner: ship.owner,
                position: ship.position,
                special: ship.special,
            },
            &mut events,
        );
        world::apply(
            &mut state,
            Command::SetAttributes {
                ship: ship.id,
                attributes: ship.attributes,
            },
            &mut events,
        );
    }
    state
}

fn starting_attributes(ship: ShipId) -> ShipAttributes {
    roster()
        .into_iter()
        .find(|entry| entry.id == ship)
        .map(|entry| entry.attributes)
        .unwrap_or_default()
}

fn set_hull(ship: ShipId, hull: u32, reactor_critical_timer: u8) -> Command {
    Command::SetAttributes {
        ship,
        attributes: ShipAttributes {
            hull_points: hull,
            reactor_critical_timer,
            ..starting_attributes(ship)
        },
    }
}

fn place(ship: ShipId, to: Position) -> Command {
    Command::MoveShip { ship, to }
}

fn targets(ship: ShipId, target: ShipId) -> Option<TargetAllowance> {
    Some(TargetAllowance {
        ship,
        targets: vec![target],
    })
}

/// Steps of the tutorial in order.
#[must_use]
pub fn steps() -> Vec<ScenarioStep> {
    let first_moves = vec![
        Position::new(5, 6),
        Position::new(6, 7),
        Position::new(5, 7),
    ];

    vec![
        ScenarioStep {
            id: "welcome",
            title: "Welcome, Commander",
            description: "Your fleet of three ships faces three opponents on a small battlefield.",
            allowances: StepAllowances::default(),
            completion: Completion::Acknowledge,
            requires_transaction: false,
            show_transaction_after: false,
            setup: Vec::new(),
        },
        ScenarioStep {
            id: "goals",
            title: "Winning the Battle",
            description: "Score points by holding scoring tiles and destroy enemy ships. Each ship acts once per round.",
            allowances: StepAllowances::default(),
            completion: Completion::Acknowledge,
            requires_transaction: false,
            show_transaction_after: false,
            setup: Vec::new(),
        },
        ScenarioStep {
            id: "select-ship",
            title: "Select a Ship",
            description: "Click one of your ships to see its movement and weapon range.",
            allowances: StepAllowances {
                selectable: vec![SCOUT, EMP_VESSEL, SUPPORT],
                ..StepAllowances::default()
            },
            completion: Completion::Select {
                ships: vec![SCOUT, EMP_VESSEL, SUPPORT],
            },
            requires_transaction: false,
            show_transaction_after: false,
            setup: Vec::new(),
        },
        ScenarioStep {
            id: "move-ship",
            title: "Move Your Scout",
            description: "Select the scout and move it to one of the highlighted cells, then confirm the transaction.",
            allowances: StepAllowances {
                selectable: vec![SCOUT],
                movement: Some(MoveAllowance {
                    ship: SCOUT,
                    destinations: first_moves.clone(),
                }),
                ..StepAllowances::default()
            },
            completion: Completion::Move {
                ship: SCOUT,
                to: first_moves,
            },
            requires_transaction: true,
            show_transaction_after: true,
            setup: Vec::new(),
        },
        ScenarioStep {
            id: "score-points",
            title: "Score Points",
            description: "The enemy destroyer grabbed a bonus tile. Move your scout onto the scoring tile to answer.",
            allowances: StepAllowances {
                selectable: vec![SCOUT],
                movement: Some(MoveAllowance {
                    ship: SCOUT,
                    destinations: vec![REUSABLE_TILE],
                }),
                ..StepAllowances::default()
            },
            completion: Completion::Move {
                ship: SCOUT,
                to: vec![REUSABLE_TILE],
            },
            requires_transaction: true,
            show_transaction_after: false,
            setup: vec![
                Command::AdvanceRound,
                place(ENEMY_DESTROYER, BONUS_TILE),
                Command::ClaimScore {
                    ship: ENEMY_DESTROYER,
                },
            ],
        },
        ScenarioStep {
            id: "shoot",
            title: "Open Fire",
            description: "Select your scout, target the enemy fighter and fire your laser.",
            allowances: StepAllowances {
                selectable: vec![SCOUT],
                shoot: targets(SCOUT, ENEMY_FIGHTER),
                ..StepAllowances::default()
            },
            completion: Completion::Perform(TutorialAction::Shoot {
                ship: SCOUT,
                target: ENEMY_FIGHTER,
            }),
            requires_transaction: true,
            show_transaction_after: false,
            setup: vec![Command::AdvanceRound, place(SCOUT, REUSABLE_TILE)],
        },
        ScenarioStep {
            id: "special-emp",
            title: "EMP Strike",
            description: "Switch the EMP vessel to its special ability and disrupt the enemy fighter. Specials ignore line of sight.",
            allowances: StepAllowances {
                selectable: vec![EMP_VESSEL],
                special: targets(EMP_VESSEL, ENEMY_FIGHTER),
                ..StepAllowances::default()
            },
            completion: Completion::Perform(TutorialAction::UseSpecial {
                ship: EMP_VESSEL,
                target: TargetChoice::Ship(ENEMY_FIGHTER),
            }),
            requires_transaction: true,
            show_transaction_after: false,
            setup: vec![Command::AdvanceRound, place(SCOUT, REUSABLE_TILE)],
        },
        ScenarioStep {
            id: "special-repair",
            title: "Field Repairs",
            description: "Your scout took a beating. Use the support ship's repair ability to restore its hull.",
            allowances: StepAllowances {
                selectable: vec![SUPPORT],
                special: targets(SUPPORT, SCOUT),
                ..StepAllowances::default()
            },
            completion: Completion::Perform(TutorialAction::UseSpecial {
                ship: SUPPORT,
                target: TargetChoice::Ship(SCOUT),
            }),
            requires_transaction: true,
            show_transaction_after: false,
            setup: vec![
                Command::AdvanceRound,
                place(SCOUT, REUSABLE_TILE),
                place(SUPPORT, Position::new(6, 6)),
                set_hull(SCOUT, 40, 0),
            ],
        },
        ScenarioStep {
            id: "rescue",
            title: "Rescue a Disabled Ship",
            description: "A ship at zero hull is disabled. Assist it from an adjacent cell to bring it back into the fight.",
            allowances: StepAllowances {
                selectable: vec![SUPPORT],
                assist: targets(SUPPORT, SCOUT),
                ..StepAllowances::default()
            },
            completion: Completion::Perform(TutorialAction::Assist {
                ship: SUPPORT,
                target: SCOUT,
            }),
            requires_transaction: true,
            show_transaction_after: false,
            setup: vec![
                Command::AdvanceRound,
                place(SCOUT, REUSABLE_TILE),
                set_hull(SCOUT, 0, 2),
                place(SUPPORT, Position::new(6, 8)),
            ],
        },
        ScenarioStep {
            id: "destroy-disabled",
            title: "Finish Them",
            description: "Every hit on a disabled ship overloads its reactor. The third overload destroys it.",
            allowances: StepAllowances {
                selectable: vec![SCOUT],
                shoot: targets(SCOUT, DISABLED_ENEMY),
                ..StepAllowances::default()
            },
            completion: Completion::Perform(TutorialAction::Shoot {
                ship: SCOUT,
                target: DISABLED_ENEMY,
            }),
            requires_transaction: true,
            show_transaction_after: false,
            setup: vec![
                Command::AdvanceRound,
                place(SCOUT, REUSABLE_TILE),
                set_hull(DISABLED_ENEMY, 0, 2),
            ],
        },
        ScenarioStep {
            id: "complete",
            title: "Tutorial Complete",
            description: "You know the basics. Find a lobby and take on a real opponent.",
            allowances: StepAllowances::default(),
            completion: Completion::Acknowledge,
            requires_transaction: false,
            show_transaction_after: false,
            setup: Vec::new(),
        },
    ]
}

/// Gate over the tutorial, acting for the creator side.
#[must_use]
pub fn gate() -> ScenarioGate {
    ScenarioGate::new(
        steps(),
        initial_world(),
        Side::Creator,
        SimulatedAuthority::default(),
    )
}
