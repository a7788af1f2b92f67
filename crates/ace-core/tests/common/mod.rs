//! Shared fixtures for ace-core integration tests.

#![allow(dead_code)]

use std::sync::Once;

use ace_abstraction::{ModelResponse, ToolCall, ToolDefinition};
use ace_core::{ActionError, Environment, StepOutcome};
use serde_json::Value;

static INIT: Once = Once::new();

/// Routes library logs to the test harness. `RUST_LOG` controls the filter.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Left,
    Right,
    Up,
    Down,
}

/// Deterministic grid: `S` start, `F` floor, `H` hole, `G` goal.
pub struct GridWorld {
    rows: Vec<Vec<char>>,
    pos: (usize, usize),
    pub executed: Vec<Move>,
    pub resets: Vec<Option<u64>>,
}

impl GridWorld {
    pub fn new(layout: &[&str]) -> Self {
        Self {
            rows: layout.iter().map(|r| r.chars().collect()).collect(),
            pos: (0, 0),
            executed: Vec::new(),
            resets: Vec::new(),
        }
    }

    /// 3x3 with one hole in the middle.
    pub fn small() -> Self {
        Self::new(&["SFF", "FHF", "FFG"])
    }

    fn cell(&self) -> char {
        self.rows[self.pos.0][self.pos.1]
    }
}

impl Environment for GridWorld {
    type Action = Move;

    fn action_tools(&self) -> Vec<ToolDefinition> {
        ["move_left", "move_right", "move_up", "move_down"]
            .into_iter()
            .map(|name| ToolDefinition::new(name, "Moves the player one cell."))
            .collect()
    }

    fn decode_action(&self, name: &str, _arguments: &Value) -> Result<Move, ActionError> {
        match name {
            "move_left" => Ok(Move::Left),
            "move_right" => Ok(Move::Right),
            "move_up" => Ok(Move::Up),
            "move_down" => Ok(Move::Down),
            other => Err(ActionError::UnknownAction(other.to_string())),
        }
    }

    fn state_description(&self) -> String {
        self.rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, cell)| if (r, c) == self.pos { format!("[{cell}]") } else { format!(" {cell} ") })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn execute(&mut self, action: Move) -> StepOutcome {
        self.executed.push(action);
        let (r, c) = self.pos;
        self.pos = match action {
            Move::Left => (r, c.saturating_sub(1)),
            Move::Right => (r, (c + 1).min(self.rows[r].len() - 1)),
            Move::Up => (r.saturating_sub(1), c),
            Move::Down => ((r + 1).min(self.rows.len() - 1), c),
        };
        let cell = self.cell();
        StepOutcome::new(self.state_description(), if cell == 'G' { 1.0 } else { 0.0 }, matches!(cell, 'G' | 'H'))
    }

    fn reset(&mut self, seed: Option<u64>) {
        self.pos = (0, 0);
        self.resets.push(seed);
    }
}

/// A Generator turn calling one tool.
pub fn act(id: &str, name: &str) -> ModelResponse {
    ModelResponse::with_tool_calls(None, vec![ToolCall::new(id, name, "")])
}

/// A Curator turn issuing the given `(name, arguments)` calls.
pub fn curate(calls: &[(&str, String)]) -> ModelResponse {
    ModelResponse::with_tool_calls(
        None,
        calls
            .iter()
            .enumerate()
            .map(|(i, (name, args))| ToolCall::new(format!("cur_{i}"), *name, args.clone()))
            .collect(),
    )
}
