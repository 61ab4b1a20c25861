use ricochet_core::{
    Consumer, DeviationReading, HintStage, Notification, Presenter, SolveProblem, SolverStatus,
};
use std::io::Write;
use std::time::Instant;

/// Writes session notifications as timestamped text lines or NDJSON
pub struct Printer<W: Write> {
    out: W,
    json: bool,
    started: Instant,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, json: bool, started: Instant) -> Self {
        Self { out, json, started }
    }

    pub fn emit(&mut self, note: &Notification) {
        if self.json {
            match serde_json::to_string(note) {
                Ok(line) => self.write_line(&line),
                Err(e) => eprintln!("Failed to encode notification: {}", e),
            }
        } else {
            note.deliver(self);
        }
    }

    /// Echo a scripted action in text mode
    pub fn action(&mut self, label: &str) {
        if !self.json {
            self.text("player", &format!("> {}", label));
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn text(&mut self, scope: &str, message: &str) {
        let secs = self.started.elapsed().as_secs_f64();
        self.write_line(&format!("[{:>7.3}s] {:<6} {}", secs, scope, message));
    }

    fn write_line(&mut self, line: &str) {
        let _ = writeln!(self.out, "{}", line);
    }
}

impl<W: Write> Presenter for Printer<W> {
    fn stage_changed(&mut self, _stage: &HintStage, payload: &str, announcement: Option<&str>) {
        match announcement {
            Some(spoken) if spoken != payload => {
                self.text("hint", &format!("{}  (announce: {})", payload, spoken))
            }
            _ => self.text("hint", payload),
        }
    }

    fn hint_availability_changed(&mut self, available: bool) {
        let message = if available {
            "hints available"
        } else {
            "hints not available for this level"
        };
        self.text("hint", message);
    }

    fn deviation_changed(&mut self, reading: Option<&DeviationReading>) {
        match reading {
            Some(reading) => {
                let message = format!("{} [{}]", reading.text(), reading.severity.color_hex());
                self.text("live", &message)
            }
            None => self.text("live", "?"),
        }
    }

    fn solver_status(&mut self, status: &SolverStatus) {
        let message = match (&status.message, status.calculating) {
            (Some(message), _) => message.clone(),
            (None, true) => "calculating...".to_string(),
            (None, false) => "idle".to_string(),
        };
        self.text(&status.consumer.to_string(), &message);
    }

    fn solve_failed(&mut self, consumer: Consumer, problem: &SolveProblem) {
        let message = match problem {
            SolveProblem::NoSolutionFound => "No solution found".to_string(),
            SolveProblem::Failed(reason) => format!("solver failed: {}", reason),
        };
        self.text(&consumer.to_string(), &message);
    }
}
