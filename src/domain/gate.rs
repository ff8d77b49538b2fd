/// Unlock gate: which commands the current points/students values buy.
///
/// Pure functions over the variant's cost rule — no side effects, no error
/// path. Missing or malformed data degrades to "nothing unlocked".
///
/// ## Unlock Truth Table
///
/// ### Direct cost table
/// ┌─────────────────────────────────┬──────────┐
/// │ Condition                        │ Unlocked?│
/// ├─────────────────────────────────┼──────────┤
/// │ no cost entry for the command    │ NO       │
/// │ cost entry not finite            │ NO       │
/// │ points <  cost × students        │ NO       │
/// │ points >= cost × students        │ YES      │
/// └─────────────────────────────────┴──────────┘
///
/// ### Staged coefficient table (three fixed stages)
/// A stage qualifies when `points >= coefficient × students`; every command
/// assigned to a qualifying stage unlocks. The union over qualifying stages
/// is returned, duplicates removed.
///
/// ### No rule
/// Unlocked set is empty.

use std::collections::{BTreeMap, BTreeSet};

/// One unlock tier of a staged table.
#[derive(Clone, Debug)]
pub struct StageRule {
    pub coefficient: f64,
    pub commands: Vec<String>,
}

/// The three fixed stages: movement, hero pickup, final.
#[derive(Clone, Debug)]
pub struct StageTable {
    pub stage1: StageRule,
    pub hero: StageRule,
    pub final_stage: StageRule,
}

impl StageTable {
    pub fn stages(&self) -> [&StageRule; 3] {
        [&self.stage1, &self.hero, &self.final_stage]
    }
}

/// How a variant prices its commands. Exactly one form is active per variant.
#[derive(Clone, Debug)]
pub enum CostRule {
    /// Per-command cost: unlocked iff `points >= cost[id] × students`.
    Direct(BTreeMap<String, f64>),
    /// Three-tier coefficient table with a static stage → commands mapping.
    Staged(StageTable),
}

/// Compute the set of unlocked command ids.
pub fn compute_unlocked(points: u32, students: u32, rule: Option<&CostRule>) -> BTreeSet<String> {
    let mut unlocked = BTreeSet::new();
    let points = points as f64;
    let students = students as f64;

    match rule {
        Some(CostRule::Direct(table)) => {
            for (id, cost) in table {
                if cost.is_finite() && points >= cost * students {
                    let _ = unlocked.insert(id.clone());
                }
            }
        }
        Some(CostRule::Staged(table)) => {
            for stage in table.stages() {
                if points >= stage.coefficient * students {
                    for id in &stage.commands {
                        let _ = unlocked.insert(id.clone());
                    }
                }
            }
        }
        None => {}
    }

    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged() -> CostRule {
        CostRule::Staged(StageTable {
            stage1: StageRule {
                coefficient: 1.0,
                commands: vec!["up".into(), "down".into(), "left".into(), "right".into()],
            },
            hero: StageRule { coefficient: 2.5, commands: vec!["hero".into()] },
            final_stage: StageRule {
                coefficient: 4.0,
                commands: vec!["jump".into(), "storage".into(), "box".into()],
            },
        })
    }

    fn direct() -> CostRule {
        let mut table = BTreeMap::new();
        let _ = table.insert("right".to_string(), 1.0);
        let _ = table.insert("jump".to_string(), 3.0);
        CostRule::Direct(table)
    }

    #[test]
    fn no_rule_unlocks_nothing() {
        assert!(compute_unlocked(1000, 1, None).is_empty());
    }

    #[test]
    fn staged_threshold_is_coefficient_times_students() {
        let rule = staged();
        // 10 students: stage1 at 10 points, hero at 25, final at 40
        assert!(compute_unlocked(9, 10, Some(&rule)).is_empty());

        let movement = compute_unlocked(10, 10, Some(&rule));
        assert!(movement.contains("right"));
        assert!(!movement.contains("hero"));
        assert!(!movement.contains("jump"));

        let with_hero = compute_unlocked(25, 10, Some(&rule));
        assert!(with_hero.contains("right"));
        assert!(with_hero.contains("hero"));
        assert!(!with_hero.contains("box"));

        let all = compute_unlocked(40, 10, Some(&rule));
        assert_eq!(all.len(), 8);
    }

    #[test]
    fn direct_table_unlocks_per_command() {
        let rule = direct();
        let set = compute_unlocked(10, 5, Some(&rule));
        assert!(set.contains("right")); // 10 >= 1.0 * 5
        assert!(!set.contains("jump")); // 10 < 3.0 * 5
        // commands without a cost entry stay locked
        assert!(!set.contains("up"));
    }

    #[test]
    fn non_finite_direct_cost_never_unlocks() {
        let mut table = BTreeMap::new();
        let _ = table.insert("right".to_string(), f64::INFINITY);
        let _ = table.insert("up".to_string(), f64::NAN);
        let rule = CostRule::Direct(table);
        assert!(compute_unlocked(u32::MAX, 0, Some(&rule)).is_empty());
    }

    #[test]
    fn monotone_in_points() {
        let rule = staged();
        let mut prev = BTreeSet::new();
        for points in 0..60 {
            let cur = compute_unlocked(points, 10, Some(&rule));
            assert!(
                prev.is_subset(&cur),
                "raising points from {} removed an unlocked command",
                points.saturating_sub(1)
            );
            prev = cur;
        }
    }

    #[test]
    fn zero_students_unlocks_everything_priced() {
        let all = compute_unlocked(0, 0, Some(&staged()));
        assert_eq!(all.len(), 8);
        let direct = compute_unlocked(0, 0, Some(&direct()));
        assert_eq!(direct.len(), 2);
    }
}
