//! Plan items and the cursor that walks them.
use std::fmt;
use std::str::FromStr;

use crate::error::TrainerError;
use crate::session::{BlockConfig, ItemKind, PlanLink};

/// Fixed-weight programs offered by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramMode {
    OldSchool,
    Pump,
    Tut,
    TutBeast,
    EccentricOnly,
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for ProgramMode {
    type Err = TrainerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "oldschool" => Ok(Self::OldSchool),
            "pump" => Ok(Self::Pump),
            "tut" => Ok(Self::Tut),
            "tutbeast" => Ok(Self::TutBeast),
            "eccentric" | "eccentriconly" => Ok(Self::EccentricOnly),
            _ => Err(TrainerError::Config(format!("unknown program mode '{s}'"))),
        }
    }
}

impl fmt::Display for ProgramMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OldSchool => "Old School",
            Self::Pump => "Pump",
            Self::Tut => "TUT",
            Self::TutBeast => "TUT Beast",
            Self::EccentricOnly => "Eccentric Only",
        })
    }
}

/// Adaptive resistance levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoLevel {
    Hard,
    Harder,
    Hardest,
    Epic,
}

impl FromStr for EchoLevel {
    type Err = TrainerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "hard" => Ok(Self::Hard),
            "harder" => Ok(Self::Harder),
            "hardest" => Ok(Self::Hardest),
            "epic" => Ok(Self::Epic),
            _ => Err(TrainerError::Config(format!("unknown echo level '{s}'"))),
        }
    }
}

impl EchoLevel {
    /// Level index as the machine numbers them, hard = 0.
    pub fn index(self) -> u8 {
        match self {
            Self::Hard => 0,
            Self::Harder => 1,
            Self::Hardest => 2,
            Self::Epic => 3,
        }
    }
}

impl fmt::Display for EchoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hard => "Hard",
            Self::Harder => "Harder",
            Self::Hardest => "Hardest",
            Self::Epic => "Epic",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseItem {
    pub name: Option<String>,
    pub mode: ProgramMode,
    pub per_cable_kg: f32,
    pub reps: u32,
    pub sets: u32,
    pub rest_sec: u64,
    pub cables: u8,
    pub just_lift: bool,
    pub stop_at_top: bool,
    pub progression_kg: f32,
}

impl ExerciseItem {
    pub fn new(mode: ProgramMode, per_cable_kg: f32, reps: u32) -> Self {
        Self {
            name: None,
            mode,
            per_cable_kg,
            reps,
            sets: 1,
            rest_sec: 0,
            cables: 2,
            just_lift: false,
            stop_at_top: false,
            progression_kg: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EchoItem {
    pub name: Option<String>,
    pub level: EchoLevel,
    pub eccentric_pct: u32,
    pub target_reps: u32,
    pub sets: u32,
    pub rest_sec: u64,
    pub just_lift: bool,
    pub stop_at_top: bool,
}

impl EchoItem {
    pub fn new(level: EchoLevel, target_reps: u32) -> Self {
        Self {
            name: None,
            level,
            eccentric_pct: 100,
            target_reps,
            sets: 1,
            rest_sec: 0,
            just_lift: false,
            stop_at_top: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanItem {
    Exercise(ExerciseItem),
    Echo(EchoItem),
}

impl PlanItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Exercise(_) => ItemKind::Exercise,
            Self::Echo(_) => ItemKind::Echo,
        }
    }

    pub fn sets(&self) -> u32 {
        match self {
            Self::Exercise(e) => e.sets.max(1),
            Self::Echo(e) => e.sets.max(1),
        }
    }

    pub fn rest_sec(&self) -> u64 {
        match self {
            Self::Exercise(e) => e.rest_sec,
            Self::Echo(e) => e.rest_sec,
        }
    }

    pub fn stop_at_top(&self) -> bool {
        match self {
            Self::Exercise(e) => e.stop_at_top,
            Self::Echo(e) => e.stop_at_top,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Exercise(e) => e.name.as_deref(),
            Self::Echo(e) => e.name.as_deref(),
        }
    }

    /// Program label sent to the machine.
    pub fn program_label(&self) -> String {
        match self {
            Self::Exercise(e) => e.mode.to_string(),
            Self::Echo(e) => format!("Echo {}", e.level),
        }
    }

    /// Short human label: the name when present, else the program.
    pub fn label(&self) -> String {
        self.name()
            .map_or_else(|| self.program_label(), str::to_string)
    }

    /// Block parameters for set `set_number` of this item.
    pub fn block_config(&self, set_number: u32) -> BlockConfig {
        let plan = Some(PlanLink {
            set_number,
            set_total: self.sets(),
            item_type: self.kind(),
        });
        match self {
            Self::Exercise(e) => BlockConfig {
                mode: e.mode.to_string(),
                weight_kg: e.per_cable_kg,
                target_reps: if e.just_lift { 0 } else { e.reps },
                warmup_target: None,
                just_lift: e.just_lift,
                progression_kg: e.progression_kg,
                cables: e.cables,
                eccentric_pct: 100,
                echo_level: None,
                set_name: e.name.clone(),
                plan,
            },
            Self::Echo(e) => BlockConfig {
                mode: self.program_label(),
                weight_kg: 0.0,
                target_reps: if e.just_lift { 0 } else { e.target_reps },
                warmup_target: None,
                just_lift: e.just_lift,
                progression_kg: 0.0,
                cables: 2,
                eccentric_pct: e.eccentric_pct,
                echo_level: Some(e.level.index()),
                set_name: e.name.clone(),
                plan,
            },
        }
    }
}

/// Position in a running plan: item index and 1-based set number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanCursor {
    pub index: usize,
    pub set: u32,
}

impl PlanCursor {
    pub const START: Self = Self { index: 0, set: 1 };
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("old school", ProgramMode::OldSchool)]
    #[case("Old_School", ProgramMode::OldSchool)]
    #[case("PUMP", ProgramMode::Pump)]
    #[case("tut", ProgramMode::Tut)]
    #[case("TUT Beast", ProgramMode::TutBeast)]
    #[case("eccentric-only", ProgramMode::EccentricOnly)]
    fn program_modes_parse_loosely(#[case] input: &str, #[case] want: ProgramMode) {
        assert_eq!(input.parse::<ProgramMode>().unwrap(), want);
    }

    #[test]
    fn unknown_names_are_config_errors() {
        let err = "zumba".parse::<ProgramMode>().unwrap_err();
        assert!(matches!(err, TrainerError::Config(m) if m.contains("zumba")));
        assert!("easy".parse::<EchoLevel>().is_err());
    }

    #[test]
    fn block_config_carries_plan_link() {
        let mut item = ExerciseItem::new(ProgramMode::Pump, 15.0, 10);
        item.sets = 3;
        item.name = Some("Curl".into());
        let cfg = PlanItem::Exercise(item).block_config(2);
        assert_eq!(cfg.mode, "Pump");
        assert_eq!(cfg.set_name.as_deref(), Some("Curl"));
        let link = cfg.plan.unwrap();
        assert_eq!((link.set_number, link.set_total), (2, 3));
        assert_eq!(link.item_type, ItemKind::Exercise);
    }

    #[test]
    fn just_lift_blocks_have_no_rep_target() {
        let mut echo = EchoItem::new(EchoLevel::Epic, 12);
        echo.just_lift = true;
        let item = PlanItem::Echo(echo);
        let cfg = item.block_config(1);
        assert_eq!(cfg.target_reps, 0);
        assert_eq!(cfg.weight_kg, 0.0);
        assert_eq!(item.label(), "Echo Epic");
    }

    #[rstest]
    #[case(EchoLevel::Hard, 50, 0)]
    #[case(EchoLevel::Epic, 150, 3)]
    fn echo_settings_reach_the_program(
        #[case] level: EchoLevel,
        #[case] eccentric_pct: u32,
        #[case] index: u8,
    ) {
        let mut echo = EchoItem::new(level, 5);
        echo.eccentric_pct = eccentric_pct;
        let program = PlanItem::Echo(echo).block_config(1).program();
        assert_eq!(program.eccentric_pct, eccentric_pct);
        assert_eq!(program.echo_level, Some(index));
        assert_eq!(program.cables, 2);
    }

    #[test]
    fn single_cable_exercise_reaches_the_program() {
        let mut item = ExerciseItem::new(ProgramMode::OldSchool, 12.0, 8);
        item.cables = 1;
        let program = PlanItem::Exercise(item).block_config(1).program();
        assert_eq!(program.cables, 1);
        assert_eq!(program.eccentric_pct, 100);
        assert_eq!(program.echo_level, None);
    }
}
