/// Action scheduler: plays one batch of timed presses to completion.
///
/// Two phases:
///   1. **Press**: every button in list order, advancing `act_freq` ticks
///      after each press.
///   2. **Release**: a fresh counter starts at 0. Each cycle advances one
///      tick, bumps the counter, then releases every pending action whose
///      duration is <= the counter. Ends when nothing is pending.
///
/// A duration of 0 releases on the first release tick. The batch is never
/// cut short, even if the environment turns terminal mid-way.

use tracing::trace;

use crate::domain::entity::Action;
use crate::error::Result;
use super::env::Environment;
use super::event::InputEvent;

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Ticks advanced after each press in the press phase.
    pub act_freq: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig { act_freq: 1 }
    }
}

/// What one batch did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub events: Vec<InputEvent>,
    /// World ticks advanced across both phases.
    pub ticks: u64,
}

pub struct ActionScheduler {
    config: SchedulerConfig,
}

impl ActionScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        ActionScheduler { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn run<E: Environment + ?Sized>(&self, env: &mut E, actions: &[Action]) -> Result<BatchReport> {
        let mut report = BatchReport {
            events: Vec::with_capacity(actions.len() * 2),
            ticks: 0,
        };

        for (order, action) in actions.iter().enumerate() {
            env.press(action.button);
            report.events.push(InputEvent::Pressed { button: action.button, order });
            for _ in 0..self.config.act_freq {
                env.advance_tick()?;
                report.ticks += 1;
            }
        }

        let mut pending: Vec<Action> = actions.to_vec();
        let mut tick: u32 = 0;
        while !pending.is_empty() {
            env.advance_tick()?;
            report.ticks += 1;
            tick += 1;

            let (due, rest): (Vec<Action>, Vec<Action>) =
                std::mem::take(&mut pending).into_iter().partition(|a| a.duration <= tick);
            for action in due {
                trace!(button = ?action.button, tick, "release");
                env.release(action.button);
                report.events.push(InputEvent::Released { button: action.button, tick });
            }
            pending = rest;
        }

        Ok(report)
    }
}
