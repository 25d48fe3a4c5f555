/// Agent loop: observe, decide, act, until the environment is terminal.
///
/// `Expert` owns one environment and one scheduler. Each step reads the
/// current grid, asks the decision engine for a batch, and plays the
/// batch to completion. There is no memory between steps.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::decision::{self, Decision};
use crate::error::Result;
use super::env::{Environment, GameState};
use super::event::InputEvent;
use super::scheduler::{ActionScheduler, SchedulerConfig};

pub const RESULTS_FILE: &str = "results.json";

/// Counters accumulated over one episode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub steps: u64,
    pub ticks: u64,
    pub presses: u64,
    pub releases: u64,
    /// Times each rule fired, keyed by rule name.
    pub rules: BTreeMap<String, u64>,
    /// Steps where no character was on screen.
    pub lost_character_steps: u64,
}

impl RunStats {
    fn record(&mut self, decision: &Decision, events: &[InputEvent], ticks: u64) {
        self.steps += 1;
        self.ticks += ticks;
        *self.rules.entry(decision.rule.to_string()).or_insert(0) += 1;
        if decision.character.is_none() {
            self.lost_character_steps += 1;
        }
        for event in events {
            match event {
                InputEvent::Pressed { .. } => self.presses += 1,
                InputEvent::Released { .. } => self.releases += 1,
            }
        }
    }
}

/// Written to `results.json` when a run ends.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub stats: RunStats,
    pub final_state: GameState,
}

pub struct Expert<E: Environment> {
    env: E,
    scheduler: ActionScheduler,
    stats: RunStats,
}

impl<E: Environment> Expert<E> {
    pub fn new(env: E, config: SchedulerConfig) -> Self {
        Expert {
            env,
            scheduler: ActionScheduler::new(config),
            stats: RunStats::default(),
        }
    }

    #[cfg(test)]
    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    #[cfg(test)]
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// One observe-decide-act cycle.
    pub fn step(&mut self) -> Result<Decision> {
        let grid = self.env.tile_grid();
        let decision = decision::choose_actions(&grid);
        match decision.character {
            Some(at) => debug!(
                rule = decision.rule,
                x = at.x,
                y = at.y,
                actions = ?decision.pairs(),
                "decision"
            ),
            None => warn!(step = self.stats.steps, "character not found, stepping forward"),
        }
        self.env.observe_decision(&decision);

        let report = self.scheduler.run(&mut self.env, &decision.actions)?;
        self.stats.record(&decision, &report.events, report.ticks);
        Ok(decision)
    }

    /// Reset once, then step until the environment reports terminal.
    pub fn play(&mut self) -> Result<RunSummary> {
        self.stats = RunStats::default();
        self.env.reset()?;
        info!(act_freq = self.scheduler.config().act_freq, "episode started");

        while !self.env.is_terminal() {
            self.step()?;
        }

        let final_state = self.env.game_state();
        info!(
            steps = self.stats.steps,
            ticks = self.stats.ticks,
            presses = self.stats.presses,
            "episode finished"
        );
        Ok(RunSummary { stats: self.stats.clone(), final_state })
    }
}

/// Serialize the summary to `{dir}/results.json`, creating `dir` if needed.
pub fn write_results(dir: &Path, summary: &RunSummary) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(RESULTS_FILE);
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(&path, json)?;
    info!(path = %path.display(), "results written");
    Ok(path)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::STEP_FORWARD_RULE;
    use crate::domain::entity::{Button, Position};
    use crate::domain::grid::TileGrid;
    use crate::domain::tile::TileCode;
    use crate::sim::env::testing::{Call, ScriptedEnv};

    fn open_field() -> TileGrid {
        let mut g = TileGrid::blank(20, 16);
        for x in 0..20 {
            g.set(Position::new(x, 0), TileCode::SOLID);
        }
        g.place_character(Position::new(5, 1));
        g
    }

    #[test]
    fn step_plays_one_batch() {
        let mut expert = Expert::new(ScriptedEnv::new(open_field(), 100), SchedulerConfig::default());
        let d = expert.step().unwrap();
        assert_eq!(d.rule, STEP_FORWARD_RULE);
        let env = expert.env();
        assert_eq!(env.log, vec![(0, Call::Press(Button::Right)), (2, Call::Release(Button::Right))]);
        assert_eq!(env.tick, 2);
        assert_eq!(env.decisions, vec![STEP_FORWARD_RULE]);
        assert_eq!(expert.stats().ticks, 2);
    }

    #[test]
    fn play_resets_once_and_runs_to_terminal() {
        let mut expert = Expert::new(ScriptedEnv::new(open_field(), 7), SchedulerConfig::default());
        let summary = expert.play().unwrap();
        // Each step-forward batch takes two ticks; the last one drains past 7.
        assert_eq!(summary.stats.steps, 4);
        assert_eq!(summary.stats.ticks, 8);
        assert_eq!(summary.stats.presses, 4);
        assert_eq!(summary.stats.releases, 4);
        assert_eq!(summary.stats.rules.get(STEP_FORWARD_RULE), Some(&4));
        assert!(summary.final_state.terminal);
        assert_eq!(expert.env().resets, 1);
        assert!(expert.env().held.is_empty());
    }

    #[test]
    fn terminal_at_start_takes_no_steps() {
        let mut expert = Expert::new(ScriptedEnv::new(open_field(), 0), SchedulerConfig::default());
        let summary = expert.play().unwrap();
        assert_eq!(summary.stats.steps, 0);
        assert!(expert.env().log.is_empty());
    }

    #[test]
    fn missing_character_is_counted() {
        let mut expert = Expert::new(ScriptedEnv::new(TileGrid::blank(8, 8), 4), SchedulerConfig::default());
        let summary = expert.play().unwrap();
        assert_eq!(summary.stats.lost_character_steps, summary.stats.steps);
        assert!(summary.stats.steps > 0);
    }

    #[test]
    fn results_are_written_as_json() {
        let dir = std::env::temp_dir().join(format!("reflexrunner-results-{}", std::process::id()));
        let mut expert = Expert::new(ScriptedEnv::new(open_field(), 2), SchedulerConfig::default());
        let summary = expert.play().unwrap();
        let path = write_results(&dir, &summary).unwrap();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(RESULTS_FILE));

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["stats"]["steps"], 1);
        assert_eq!(value["stats"]["rules"][STEP_FORWARD_RULE], 1);
        assert_eq!(value["final_state"]["source"], "scripted");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
