use std::io::{self, Write};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

const TICK: Duration = Duration::from_millis(80);

const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("  {spinner:.cyan} {msg}")
        .expect("invalid template")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

fn counter_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner:.cyan} {msg} [{bar:28.cyan/blue}] {pos}/{len} ({eta})")
        .expect("invalid template")
        .progress_chars("█▓░")
}

/// Numbered steps on stderr: a live indicator for the running step and a
/// timed check line for each finished one.
pub struct StepReporter {
    active: Option<ProgressBar>,
    current: u8,
    total: u8,
    started: Instant,
    step_started: Instant,
}

impl StepReporter {
    pub fn new(total: u8) -> Self {
        let now = Instant::now();
        Self {
            active: None,
            current: 0,
            total,
            started: now,
            step_started: now,
        }
    }

    fn begin(&mut self, bar: ProgressBar, message: String) {
        self.clear();
        self.current += 1;
        self.step_started = Instant::now();

        bar.enable_steady_tick(TICK);
        bar.set_message(format!("[{}/{}] {}", self.current, self.total, message));
        self.active = Some(bar);
    }

    fn clear(&mut self) {
        if let Some(bar) = self.active.take() {
            bar.finish_and_clear();
        }
    }

    pub fn step(&mut self, description: &str) {
        let bar = ProgressBar::new_spinner().with_style(spinner_style());
        self.begin(bar, format!("{description}..."));
    }

    pub fn counted_step(&mut self, description: &str, total: u64) {
        let bar = ProgressBar::new(total).with_style(counter_style());
        self.begin(bar, description.to_string());
    }

    pub fn tick(&self) {
        if let Some(bar) = &self.active {
            bar.inc(1);
        }
    }

    pub fn complete_step(&mut self, description: &str, details: &[&str]) {
        self.clear();

        let secs = self.step_started.elapsed().as_secs_f64();
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "  {GREEN}✓{RESET} {description:<44} {secs:>5.1}s");
        for detail in details {
            let _ = writeln!(stderr, "      {DIM}·{RESET} {detail}");
        }
    }

    pub fn finish(mut self) {
        self.clear();

        let total = format!("Total: {:.2}s", self.started.elapsed().as_secs_f64());
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr);
        let _ = writeln!(stderr, "  {DIM}{}{RESET}", "━".repeat(56));
        let _ = writeln!(stderr, "  {GREEN}✓{RESET} Done {total:>49}");
        let _ = writeln!(stderr);
    }
}

/// Step reporting for interactive terminals; a no-op otherwise.
pub enum Progress {
    Interactive(StepReporter),
    Silent,
}

impl Progress {
    pub fn new(interactive: bool, total_steps: u8) -> Self {
        if interactive {
            Self::Interactive(StepReporter::new(total_steps))
        } else {
            Self::Silent
        }
    }

    pub fn step(&mut self, description: &str) {
        if let Self::Interactive(r) = self {
            r.step(description);
        }
    }

    pub fn counted_step(&mut self, description: &str, total: u64) {
        if let Self::Interactive(r) = self {
            r.counted_step(description, total);
        }
    }

    pub fn tick(&self) {
        if let Self::Interactive(r) = self {
            r.tick();
        }
    }

    pub fn complete_step(&mut self, description: &str, details: &[&str]) {
        if let Self::Interactive(r) = self {
            r.complete_step(description, details);
        }
    }

    pub fn finish(self) {
        if let Self::Interactive(r) = self {
            r.finish();
        }
    }
}
