use anyhow::{anyhow, bail, Context, Result};
use history::{CoalescingHistory, History, ManualClock};
use serde_json::json;
use settings::GenerationSettings;
use std::time::Duration;
use tracing::debug;

/// Replays an edit script against a settings history.
///
/// One command per line; blank lines and `#` comments are skipped:
///
/// ```text
/// set steps=30        # recorded immediately
/// type prompt=a cat   # coalesced like a keystroke
/// wait 200            # advance the clock by 200 ms
/// undo
/// redo
/// clear
/// ```
///
/// Time only moves on `wait`, so a script replays identically on every run.
pub struct Session {
    history: CoalescingHistory<GenerationSettings, ManualClock>,
    clock: ManualClock,
    applied: usize,
}

impl Session {
    pub fn new(base: GenerationSettings, capacity: usize, window: Duration) -> Self {
        let clock = ManualClock::new();
        let history = CoalescingHistory::with_clock(
            History::with_capacity(base, capacity),
            window,
            clock.clone(),
        );
        Self {
            history,
            clock,
            applied: 0,
        }
    }

    pub fn run_script(&mut self, script: &str) -> Result<()> {
        for (number, line) in script.lines().enumerate() {
            let line = match line.split_once('#') {
                Some((code, _)) => code.trim(),
                None => line.trim(),
            };
            if line.is_empty() {
                continue;
            }
            self.run_line(line)
                .with_context(|| format!("script line {}: {line}", number + 1))?;
            self.applied += 1;
        }
        Ok(())
    }

    fn run_line(&mut self, line: &str) -> Result<()> {
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        debug!(command, "session step");
        match command {
            "set" => {
                let draft = self.edited(rest)?;
                self.history.commit(draft);
                self.history.flush();
            }
            "type" => {
                let draft = self.edited(rest)?;
                self.history.commit(draft);
            }
            "wait" => {
                let ms: u64 = rest
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("wait expects milliseconds, got '{rest}'"))?;
                self.clock.advance(Duration::from_millis(ms));
                self.history.poll();
            }
            "undo" => {
                self.history.undo();
            }
            "redo" => {
                self.history.redo();
            }
            "clear" => self.history.clear(None),
            other => bail!("unknown command '{other}'"),
        }
        Ok(())
    }

    /// The latest draft (pending or recorded) with one field changed.
    fn edited(&self, assignment: &str) -> Result<GenerationSettings> {
        let (field, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("expected field=value, got '{assignment}'"))?;
        let mut draft = self
            .history
            .pending()
            .unwrap_or_else(|| self.history.present())
            .clone();
        draft.set_field(field, value)?;
        Ok(draft)
    }

    /// Final state; a pending coalesced edit is reported and discarded.
    pub fn finish(self) -> serde_json::Value {
        let discarded_pending = self.history.has_pending();
        let history = self.history.into_history();
        json!({
            "present": history.present(),
            "undo_len": history.undo_len(),
            "redo_len": history.redo_len(),
            "size": history.size(),
            "commands": self.applied,
            "discarded_pending": discarded_pending,
        })
    }
}
