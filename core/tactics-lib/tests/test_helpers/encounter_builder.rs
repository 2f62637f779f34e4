//! 測試輔助：EncounterBuilder
//!
//! 用 ASCII art 視覺化定義戰場，取代手寫 TOML 字串。

use skills_lib::SkillType;
use tactics_lib::core_types::{Faction, Position, Reach};
use tactics_lib::encounter::Encounter;
use tactics_lib::error::{LoadError, Result};
use tactics_lib::loader::load_from_ascii;
use tactics_lib::loader_schema::{
    CombatRules, EncounterConfig, LootEntry, Rules, StatBlock, UnitPlacement, UnitType,
};

struct UnitMarkerDef {
    marker: String,
    type_name: String,
    faction_id: u32,
}

/// 用 ASCII art 建立戰鬥配置
///
/// 單位依 `unit()` 呼叫順序、同標記內依掃描順序（先列後行）編號，從 1 開始。
///
/// # 使用範例
///
/// ```ignore
/// let encounter = EncounterBuilder::from_ascii("
///   A . . . .
///   . . . . .
///   D . . . .
/// ")
/// .unit_type(fighter("attacker", 20, 6, 1, 10))
/// .unit_type(fighter("defender", 20, 5, 2, 5))
/// .unit("A", "attacker", 0)
/// .unit("D", "defender", 1)
/// .rules(certain_hit())
/// .start();
/// ```
pub struct EncounterBuilder {
    ascii: String,
    name: String,
    seed: u64,
    rules: Rules,
    skills: Vec<SkillType>,
    unit_types: Vec<UnitType>,
    unit_markers: Vec<UnitMarkerDef>,
}

impl EncounterBuilder {
    /// 以 ASCII art 初始化 builder
    pub fn from_ascii(ascii: &str) -> Self {
        EncounterBuilder {
            ascii: ascii.to_string(),
            name: "test-encounter".to_string(),
            seed: 7,
            rules: Rules::default(),
            skills: Vec::new(),
            unit_types: Vec::new(),
            unit_markers: Vec::new(),
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn rules(mut self, rules: Rules) -> Self {
        self.rules = rules;
        self
    }

    pub fn skill(mut self, skill: SkillType) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn unit_type(mut self, unit_type: UnitType) -> Self {
        self.unit_types.push(unit_type);
        self
    }

    /// 設定標記對應的單位類型與陣營
    pub fn unit(mut self, marker: &str, type_name: &str, faction_id: u32) -> Self {
        self.unit_markers.push(UnitMarkerDef {
            marker: marker.to_string(),
            type_name: type_name.to_string(),
            faction_id,
        });
        self
    }

    /// 組裝戰鬥配置
    pub fn build(self) -> Result<EncounterConfig> {
        let (board, markers) = load_from_ascii(&self.ascii)?;

        let units: Vec<UnitPlacement> = self
            .unit_markers
            .iter()
            .flat_map(|unit_def| {
                markers
                    .get(&unit_def.marker)
                    .map(|positions| {
                        positions
                            .iter()
                            .map(|pos| UnitPlacement {
                                id: None,
                                unit_type_name: unit_def.type_name.clone(),
                                faction: Faction(unit_def.faction_id),
                                position: *pos,
                            })
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default()
            })
            .collect();

        Ok(EncounterConfig {
            name: self.name,
            seed: self.seed,
            board,
            terrain: Default::default(),
            rules: self.rules,
            skills: self.skills,
            unit_types: self.unit_types,
            units,
        })
    }

    /// 組裝 TOML 字串
    pub fn to_toml(self) -> Result<String> {
        let config = self.build()?;
        toml::to_string_pretty(&config).map_err(|e| {
            LoadError::DeserializeError {
                format: "encounter".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// 建立戰鬥（尚未開始）
    pub fn encounter(self) -> Encounter {
        let config = self.build().expect("ASCII 棋盤應能解析");
        Encounter::from_config(&config).expect("配置應合法")
    }

    /// 建立並開始戰鬥
    pub fn start(self) -> Encounter {
        let mut encounter = self.encounter();
        encounter.start().expect("戰鬥應能開始");
        encounter
    }
}

// ============================================================================
// 常用資料
// ============================================================================

pub fn pos(x: usize, y: usize) -> Position {
    Position::new(x, y)
}

/// 近戰單位類型（射程 1、移動力 3）
pub fn fighter(name: &str, max_hp: i32, attack: i32, defense: i32, speed: i32) -> UnitType {
    UnitType {
        name: name.to_string(),
        stats: StatBlock {
            max_hp,
            attack,
            defense,
            speed,
            movement: 3,
            attack_range: Reach::new(1, 1),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn with_skills(mut unit_type: UnitType, skills: &[&str]) -> UnitType {
    unit_type.skills = skills.iter().map(|s| s.to_string()).collect();
    unit_type
}

pub fn with_loot(mut unit_type: UnitType, item: &str, chance: u32, quantity: u32) -> UnitType {
    unit_type.loot.push(LootEntry {
        item: item.to_string(),
        chance,
        quantity,
    });
    unit_type
}

/// 命中率固定為 100%
pub fn certain_hit() -> Rules {
    fixed_hit_chance(100)
}

/// 命中率固定為 0%
pub fn certain_miss() -> Rules {
    fixed_hit_chance(0)
}

fn fixed_hit_chance(chance: u32) -> Rules {
    Rules {
        combat: CombatRules {
            min_hit_chance: chance,
            max_hit_chance: chance,
            ..Default::default()
        },
        ..Default::default()
    }
}
