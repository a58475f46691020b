//! Training loggers.
//!
//! Provides different logging backends for training metrics.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Training snapshot for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSnapshot {
    /// Training round (one collect/update cycle).
    pub round: usize,
    /// Total environment steps so far.
    pub env_steps: usize,
    /// Number of completed episodes so far.
    pub episodes: usize,
    /// Average episode return over the round.
    pub avg_return: f32,
    /// Mean policy loss of the update pass.
    pub policy_loss: f32,
    /// Mean value loss of the update pass.
    pub value_loss: f32,
}

impl TrainingSnapshot {
    /// Create a new training snapshot.
    pub fn new(round: usize, env_steps: usize, episodes: usize, avg_return: f32) -> Self {
        Self {
            round,
            env_steps,
            episodes,
            avg_return,
            policy_loss: 0.0,
            value_loss: 0.0,
        }
    }

    /// Set loss values.
    pub fn with_losses(mut self, policy_loss: f32, value_loss: f32) -> Self {
        self.policy_loss = policy_loss;
        self.value_loss = value_loss;
        self
    }
}

/// Logger trait for different logging backends.
pub trait MetricsLogger {
    /// Log a training snapshot.
    fn log(&mut self, snapshot: &TrainingSnapshot);

    /// Flush any buffered output.
    fn flush(&mut self);
}

/// Console logger with aligned columns.
pub struct ConsoleLogger {
    log_interval: usize,
    last_log_round: usize,
    start_time: Instant,
    show_header: bool,
}

impl ConsoleLogger {
    /// Create a new console logger.
    ///
    /// # Arguments
    ///
    /// * `log_interval` - Rounds between log entries
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval,
            last_log_round: 0,
            start_time: Instant::now(),
            show_header: true,
        }
    }

    fn print_header(&self) {
        println!(
            "{:>8} {:>10} {:>8} {:>10} {:>10} {:>10} {:>8}",
            "Round", "EnvSteps", "Episodes", "Return", "Policy", "Value", "SPS"
        );
        println!("{}", "-".repeat(72));
    }
}

impl MetricsLogger for ConsoleLogger {
    fn log(&mut self, snapshot: &TrainingSnapshot) {
        if snapshot.round < self.last_log_round + self.log_interval {
            return;
        }

        if self.show_header {
            self.print_header();
            self.show_header = false;
        }

        let elapsed = self.start_time.elapsed().as_secs_f32();
        let sps = if elapsed > 0.0 {
            snapshot.env_steps as f32 / elapsed
        } else {
            0.0
        };

        println!(
            "{:>8} {:>10} {:>8} {:>10.2} {:>10.4} {:>10.4} {:>8.0}",
            snapshot.round,
            snapshot.env_steps,
            snapshot.episodes,
            snapshot.avg_return,
            snapshot.policy_loss,
            snapshot.value_loss,
            sps
        );

        self.last_log_round = snapshot.round;
    }

    fn flush(&mut self) {
        // stdout is line-buffered, nothing to do
    }
}

/// CSV file logger for analysis.
pub struct CsvLogger {
    writer: BufWriter<File>,
}

impl CsvLogger {
    /// Create a new CSV logger writing to `path`.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(
            writer,
            "round,env_steps,episodes,avg_return,policy_loss,value_loss"
        )?;
        Ok(Self { writer })
    }
}

impl MetricsLogger for CsvLogger {
    fn log(&mut self, snapshot: &TrainingSnapshot) {
        let _ = writeln!(
            self.writer,
            "{},{},{},{:.4},{:.6},{:.6}",
            snapshot.round,
            snapshot.env_steps,
            snapshot.episodes,
            snapshot.avg_return,
            snapshot.policy_loss,
            snapshot.value_loss
        );
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

impl Drop for CsvLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Multi-logger that writes to multiple backends.
#[derive(Default)]
pub struct MultiLogger {
    loggers: Vec<Box<dyn MetricsLogger>>,
}

impl MultiLogger {
    /// Create a new multi-logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a logger.
    pub fn add<L: MetricsLogger + 'static>(mut self, logger: L) -> Self {
        self.loggers.push(Box::new(logger));
        self
    }
}

impl MetricsLogger for MultiLogger {
    fn log(&mut self, snapshot: &TrainingSnapshot) {
        for logger in &mut self.loggers {
            logger.log(snapshot);
        }
    }

    fn flush(&mut self) {
        for logger in &mut self.loggers {
            logger.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_snapshot() {
        let snapshot = TrainingSnapshot::new(3, 600, 5, 120.0).with_losses(0.5, 0.3);

        assert_eq!(snapshot.round, 3);
        assert_eq!(snapshot.env_steps, 600);
        assert_eq!(snapshot.episodes, 5);
        assert!((snapshot.avg_return - 120.0).abs() < 0.01);
        assert!((snapshot.policy_loss - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_console_logger_interval() {
        let mut logger = ConsoleLogger::new(10);
        logger.log(&TrainingSnapshot::new(5, 500, 3, 50.0)); // below interval
        logger.log(&TrainingSnapshot::new(10, 1000, 6, 100.0)); // prints
    }

    #[test]
    fn test_multi_logger() {
        let console = ConsoleLogger::new(1);
        let mut multi = MultiLogger::new().add(console);

        multi.log(&TrainingSnapshot::new(1, 200, 1, 200.0));
        multi.flush();
    }
}
