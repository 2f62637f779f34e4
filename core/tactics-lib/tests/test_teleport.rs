//! 瞬間移動技能測試

mod test_helpers;

use skills_lib::{SkillKind, SkillType};
use tactics_lib::action::{Action, Target};
use tactics_lib::encounter::Encounter;
use tactics_lib::error::{ActionError, ErrorKind, GridError, TargetIssue};
use tactics_lib::event::BattleEvent;
use test_helpers::*;

fn blink() -> SkillType {
    SkillType {
        name: "blink".to_string(),
        min_range: 1,
        max_range: 3,
        cooldown: 2,
        kind: SkillKind::Teleport,
        ..Default::default()
    }
}

fn setup() -> Encounter {
    EncounterBuilder::from_ascii(
        r#"
M . # . .
. . . . .
E . . . .
        "#,
    )
    .skill(blink())
    .unit_type(with_skills(fighter("mage", 12, 3, 0, 10), &["blink"]))
    .unit_type(fighter("guard", 20, 4, 1, 1))
    .unit("M", "mage", 0)
    .unit("E", "guard", 1)
    .rules(certain_hit())
    .start()
}

fn blink_to(x: usize, y: usize) -> Action {
    Action::use_skill(1, "blink", Target::Cell(pos(x, y)))
}

#[test]
fn test_teleport_over_wall() {
    let mut encounter = setup();
    let events = encounter.commit_action(blink_to(3, 0)).unwrap();
    assert_eq!(
        events,
        vec![
            BattleEvent::UnitTeleported {
                unit: 1,
                from: pos(0, 0),
                to: pos(3, 0),
            },
            BattleEvent::TurnStarted { unit: 2 },
        ]
    );
    assert_eq!(encounter.unit(1).unwrap().position, Some(pos(3, 0)));
    assert_eq!(encounter.grid().occupant_of(pos(0, 0)), None);
    assert_eq!(encounter.grid().occupant_of(pos(3, 0)), Some(1));
    assert_eq!(encounter.unit(1).unwrap().cooldown_of("blink"), 2);
}

/// 目標格被佔據：回錯誤，兩個單位都不動
#[test]
fn test_teleport_onto_occupied_cell() {
    let mut encounter = setup();
    let err = encounter.commit_action(blink_to(0, 2)).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Grid(GridError::Occupied {
            x: 0,
            y: 2,
            occupant: 2
        })
    ));
    assert_eq!(encounter.unit(1).unwrap().position, Some(pos(0, 0)));
    assert_eq!(encounter.unit(2).unwrap().position, Some(pos(0, 2)));
    assert_eq!(encounter.grid().occupant_of(pos(0, 0)), Some(1));
    assert_eq!(encounter.grid().occupant_of(pos(0, 2)), Some(2));
    assert_eq!(encounter.active_unit(), Some(1));
    assert_eq!(encounter.unit(1).unwrap().cooldown_of("blink"), 0);
}

#[test]
fn test_teleport_rejections() {
    let mut encounter = setup();

    let err = encounter.commit_action(blink_to(2, 0)).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Grid(GridError::Impassable { x: 2, y: 0 })
    ));

    let err = encounter.commit_action(blink_to(4, 1)).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Action(ActionError::InvalidTarget {
            reason: TargetIssue::OutOfRange {
                distance: 5,
                min: 1,
                max: 3
            }
        })
    ));

    let err = encounter.commit_action(blink_to(9, 9)).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Grid(GridError::OutOfBounds { .. })
    ));

    let err = encounter
        .commit_action(Action::use_skill(1, "blink", Target::Unit(2)))
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Action(ActionError::SkillTargetMismatch { .. })
    ));

    let err = encounter
        .commit_action(Action::use_skill(1, "fireball", Target::Unit(2)))
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Action(ActionError::SkillNotKnown { unit_id: 1, .. })
    ));

    assert_eq!(encounter.active_unit(), Some(1));
    assert_eq!(encounter.unit(1).unwrap().position, Some(pos(0, 0)));
}

#[test]
fn test_teleport_destinations_listed() {
    let encounter = setup();
    let legal = encounter.legal_actions(1).unwrap();
    assert_eq!(legal.skills.len(), 1);
    assert_eq!(legal.skills[0].skill, "blink");
    let expected: Vec<Target> = [(1, 0), (3, 0), (0, 1), (1, 1), (2, 1), (1, 2)]
        .into_iter()
        .map(|(x, y)| Target::Cell(pos(x, y)))
        .collect();
    assert_eq!(legal.skills[0].targets, expected);
}

/// 冷卻 2：施放的下一輪仍在冷卻，再下一輪可用
#[test]
fn test_teleport_cooldown() {
    let mut encounter = setup();
    encounter.commit_action(blink_to(1, 1)).unwrap();
    encounter.commit_action(Action::wait(2)).unwrap();
    assert_eq!(encounter.round(), 2);

    let err = encounter.commit_action(blink_to(1, 0)).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Action(ActionError::SkillOnCooldown { remaining: 1, .. })
    ));
    assert!(encounter.legal_actions(1).unwrap().skills.is_empty());

    encounter.commit_action(Action::wait(1)).unwrap();
    encounter.commit_action(Action::wait(2)).unwrap();
    assert_eq!(encounter.round(), 3);
    assert!(encounter.commit_action(blink_to(1, 0)).is_ok());
}
