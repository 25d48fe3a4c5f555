/// Replay environment: plays back a recorded trace of tile grids.
///
/// ## Trace format (`.trace`):
///   ```
///   ## Trace Name
///   ## Author: name
///   ---
///   # Frame label
///   @ hold 6
///   <rows of whitespace-separated tile codes, top row first>
///   ---
///   # Next frame
///   <rows>
///   ```
///
/// Frames are separated by a line containing only `---`. Lines starting
/// with `##` before the first separator are trace metadata. A file with
/// no separator is a single frame. `@ hold N` keeps the frame current for
/// N ticks (default 1).
///
/// The episode is terminal once the last frame's hold has elapsed, after
/// `max_ticks` ticks when set, or when the viewer asks to stop.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::domain::decision::Decision;
use crate::domain::entity::Button;
use crate::domain::grid::TileGrid;
use crate::domain::scan;
use crate::domain::tile::TileCode;
use crate::error::{AgentError, Result};
use crate::ui::input::InputState;
use crate::ui::viewer::{ViewState, Viewer};
use super::env::{Environment, GameState};

const BUILTIN_TRACE: &str = include_str!("../../traces/demo.trace");

/// Ticks per second at emulation speed 1.
const BASE_TICK_RATE: u64 = 60;

#[derive(Clone, Debug, PartialEq)]
struct Frame {
    label: String,
    hold: u32,
    grid: TileGrid,
}

/// A parsed trace. Only built by the parser, so it always has a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Trace {
    name: String,
    frames: Vec<Frame>,
}

impl Trace {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

pub fn load_trace(path: &Path) -> Result<Trace> {
    let content = std::fs::read_to_string(path).map_err(|source| AgentError::TraceRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut trace = parse_trace(&content)?;
    if trace.name.is_empty() {
        trace.name = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
    }
    Ok(trace)
}

/// The demo trace shipped inside the binary.
pub fn builtin_trace() -> Result<Trace> {
    parse_trace(BUILTIN_TRACE)
}

pub fn parse_trace(content: &str) -> Result<Trace> {
    let has_separator = content.lines().any(|l| l.trim() == "---");
    let mut name = String::new();
    let mut frames = vec![];
    let mut section = Section::default();
    let mut in_frames = !has_separator;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();

        if trimmed == "---" {
            if in_frames {
                section.flush(&mut frames)?;
            }
            in_frames = true;
            continue;
        }

        if let Some(meta) = trimmed.strip_prefix("##") {
            if !in_frames || !has_separator {
                if name.is_empty() && !meta.contains(':') {
                    name = meta.trim().to_string();
                }
                continue;
            }
        }

        if !in_frames {
            continue;
        }
        section.feed(line_no, trimmed)?;
    }
    section.flush(&mut frames)?;

    if frames.is_empty() {
        return Err(AgentError::EmptyTrace);
    }
    Ok(Trace { name, frames })
}

/// One frame being accumulated.
#[derive(Default)]
struct Section {
    label: String,
    hold: Option<u32>,
    rows: Vec<Vec<TileCode>>,
    first_line: usize,
}

impl Section {
    fn feed(&mut self, line_no: usize, trimmed: &str) -> Result<()> {
        if trimmed.is_empty() {
            return Ok(());
        }
        if self.first_line == 0 {
            self.first_line = line_no;
        }
        if let Some(label) = trimmed.strip_prefix('#') {
            self.label = label.trim().to_string();
            return Ok(());
        }
        if let Some(directive) = trimmed.strip_prefix('@') {
            self.hold = Some(parse_hold(line_no, directive)?);
            return Ok(());
        }
        let row = trimmed
            .split_whitespace()
            .map(|tok| {
                tok.parse::<i32>().map(TileCode).map_err(|_| AgentError::Trace {
                    line: line_no,
                    reason: format!("bad tile code {tok:?}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.rows.push(row);
        Ok(())
    }

    fn flush(&mut self, frames: &mut Vec<Frame>) -> Result<()> {
        let section = std::mem::take(self);
        if section.first_line == 0 {
            return Ok(());
        }
        if section.rows.is_empty() {
            return Err(AgentError::Trace {
                line: section.first_line,
                reason: "frame has no rows".into(),
            });
        }
        let label = if section.label.is_empty() {
            format!("Frame {}", frames.len() + 1)
        } else {
            section.label
        };
        frames.push(Frame {
            label,
            hold: section.hold.unwrap_or(1),
            grid: TileGrid::new(section.rows),
        });
        Ok(())
    }
}

fn parse_hold(line_no: usize, directive: &str) -> Result<u32> {
    let mut parts = directive.split_whitespace();
    let err = |reason: String| AgentError::Trace { line: line_no, reason };
    match (parts.next(), parts.next(), parts.next()) {
        (Some("hold"), Some(n), None) => match n.parse::<u32>() {
            Ok(0) => Err(err("hold must be at least 1".into())),
            Ok(v) => Ok(v),
            Err(_) => Err(err(format!("bad hold value {n:?}"))),
        },
        _ => Err(err(format!("unknown directive {:?}", directive.trim()))),
    }
}

// ══════════════════════════════════════════════════════════════
// Environment
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// Stop after this many ticks; 0 = play the whole trace.
    pub max_ticks: u64,
    /// Viewer pacing: 0 = unthrottled, N = N x 60 ticks per second.
    pub emulation_speed: u32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig { max_ticks: 0, emulation_speed: 2 }
    }
}

pub struct ReplayEnvironment {
    trace: Trace,
    config: ReplayConfig,
    frame: usize,
    frame_elapsed: u32,
    tick: u64,
    held: Vec<Button>,
    presses: u64,
    releases: u64,
    stopped: bool,
    last_rule: &'static str,
    viewer: Option<Viewer>,
    input: InputState,
}

impl ReplayEnvironment {
    pub fn new(trace: Trace, config: ReplayConfig) -> Self {
        ReplayEnvironment {
            trace,
            config,
            frame: 0,
            frame_elapsed: 0,
            tick: 0,
            held: vec![],
            presses: 0,
            releases: 0,
            stopped: false,
            last_rule: "",
            viewer: None,
            input: InputState::new(),
        }
    }

    /// Render every tick to the terminal from now on.
    pub fn attach_viewer(&mut self, viewer: Viewer) {
        self.viewer = Some(viewer);
    }

    pub fn detach_viewer(&mut self) -> Option<Viewer> {
        self.viewer.take()
    }

    #[cfg(test)]
    pub fn held(&self) -> &[Button] {
        &self.held
    }

    fn current(&self) -> &Frame {
        let last = self.trace.frames.len().saturating_sub(1);
        &self.trace.frames[self.frame.min(last)]
    }

    fn tick_interval(&self) -> Option<Duration> {
        match self.config.emulation_speed {
            0 => None,
            speed => Some(Duration::from_micros(1_000_000 / (BASE_TICK_RATE * speed as u64))),
        }
    }

    fn present(&mut self) -> Result<()> {
        if self.viewer.is_none() {
            return Ok(());
        }
        let index = self.frame.min(self.trace.frames.len().saturating_sub(1));
        let frame = &self.trace.frames[index];
        let anchor = scan::locate_character(&frame.grid);
        let view = ViewState {
            trace_name: &self.trace.name,
            frame_label: &frame.label,
            frame_index: index,
            frames_total: self.trace.frames.len(),
            tick: self.tick,
            grid: &frame.grid,
            anchor,
            held: &self.held,
            rule: self.last_rule,
        };
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.render(&view)?;
        }

        self.input.drain_events();
        if self.input.quit_pressed() && !self.stopped {
            warn!(tick = self.tick, "stop requested from viewer");
            self.stopped = true;
        }
        if let Some(interval) = self.tick_interval() {
            std::thread::sleep(interval);
        }
        Ok(())
    }
}

impl Environment for ReplayEnvironment {
    fn tile_grid(&self) -> TileGrid {
        self.current().grid.clone()
    }

    fn is_terminal(&self) -> bool {
        self.stopped
            || self.frame >= self.trace.frames.len()
            || (self.config.max_ticks > 0 && self.tick >= self.config.max_ticks)
    }

    fn press(&mut self, button: Button) {
        trace!(tick = self.tick, button = button.label(), "press");
        self.presses += 1;
        if !self.held.contains(&button) {
            self.held.push(button);
        }
    }

    fn release(&mut self, button: Button) {
        trace!(tick = self.tick, button = button.label(), "release");
        self.releases += 1;
        self.held.retain(|&b| b != button);
    }

    fn advance_tick(&mut self) -> Result<()> {
        self.tick += 1;
        if self.frame < self.trace.frames.len() {
            self.frame_elapsed += 1;
            if self.frame_elapsed >= self.trace.frames[self.frame].hold {
                self.frame += 1;
                self.frame_elapsed = 0;
                if let Some(next) = self.trace.frames.get(self.frame) {
                    debug!(tick = self.tick, frame = %next.label, "frame advanced");
                }
            }
        }
        self.present()
    }

    fn reset(&mut self) -> Result<()> {
        self.frame = 0;
        self.frame_elapsed = 0;
        self.tick = 0;
        self.held.clear();
        self.presses = 0;
        self.releases = 0;
        self.stopped = false;
        self.last_rule = "";
        self.present()
    }

    fn game_state(&self) -> GameState {
        GameState {
            source: self.trace.name.clone(),
            tick: self.tick,
            frame: self.frame.min(self.trace.frames.len()),
            frames_total: self.trace.frames.len(),
            frame_label: self.current().label.clone(),
            held: self.held.clone(),
            presses: self.presses,
            releases: self.releases,
            terminal: self.is_terminal(),
        }
    }

    fn observe_decision(&mut self, decision: &Decision) {
        self.last_rule = decision.rule;
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
