use log::info;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tabled::{builder::Builder, settings::Style};

/// (unit, value) pair for printing a duration
pub fn elapsed_time(elapsed: Duration) -> (String, f64) {
    let time = elapsed.as_micros();
    if time < 1000 {
        (" us".to_string(), time as f64)
    } else if time < 1_000_000 {
        (" ms".to_string(), time as f64 / 1000.0)
    } else {
        (" s".to_string(), elapsed.as_secs_f64())
    }
}

/// Time spent in each phase of one solve call.
#[derive(Debug, Clone)]
pub struct PhaseTimer {
    pub start: Instant,
    pub substitution_time: Instant,
    pub substitution: Duration,
    pub singleton_time: Instant,
    pub singleton: Duration,
    pub elimination_time: Instant,
    pub elimination: Duration,
    pub newton_time: Instant,
    pub newton: Duration,
    pub finish_time: Instant,
    pub finish: Duration,
}

impl PhaseTimer {
    pub fn new() -> PhaseTimer {
        PhaseTimer {
            start: Instant::now(),
            substitution_time: Instant::now(),
            substitution: Duration::from_secs(0),
            singleton_time: Instant::now(),
            singleton: Duration::from_secs(0),
            elimination_time: Instant::now(),
            elimination: Duration::from_secs(0),
            newton_time: Instant::now(),
            newton: Duration::from_secs(0),
            finish_time: Instant::now(),
            finish: Duration::from_secs(0),
        }
    }
    pub fn start(&mut self) {
        *self = PhaseTimer::new();
    }
    pub fn substitution_tic(&mut self) {
        self.substitution_time = Instant::now();
    }
    pub fn substitution_tac(&mut self) {
        self.substitution += self.substitution_time.elapsed();
    }
    pub fn singleton_tic(&mut self) {
        self.singleton_time = Instant::now();
    }
    pub fn singleton_tac(&mut self) {
        self.singleton += self.singleton_time.elapsed();
    }
    pub fn elimination_tic(&mut self) {
        self.elimination_time = Instant::now();
    }
    pub fn elimination_tac(&mut self) {
        self.elimination += self.elimination_time.elapsed();
    }
    pub fn newton_tic(&mut self) {
        self.newton_time = Instant::now();
    }
    pub fn newton_tac(&mut self) {
        self.newton += self.newton_time.elapsed();
    }
    pub fn finish_tic(&mut self) {
        self.finish_time = Instant::now();
    }
    pub fn finish_tac(&mut self) {
        self.finish += self.finish_time.elapsed();
    }

    fn phases(&self) -> [(&'static str, Duration); 5] {
        [
            ("substitution", self.substitution),
            ("singleton", self.singleton),
            ("elimination", self.elimination),
            ("newton", self.newton),
            ("finish", self.finish),
        ]
    }

    /// per phase share of the total time; phases under half a percent are left out
    pub fn get_all(&self) -> HashMap<String, String> {
        let mut timer_data: HashMap<String, String> = HashMap::new();
        let total = self.start.elapsed();
        let total_ns = total.as_nanos().max(1) as f64;
        let total_string = elapsed_time(total);
        timer_data.insert(
            "time elapsed,".to_string() + total_string.0.as_str(),
            format!("{}", total_string.1),
        );
        let mut other = total_ns;
        for (name, phase) in self.phases() {
            let phase_ns = phase.as_nanos() as f64;
            other -= phase_ns;
            let percent = 100.0 * phase_ns / total_ns;
            if percent > 0.5 {
                let phase_string = elapsed_time(phase);
                timer_data.insert(
                    format!("{} (%, {})", name, phase_string.0.trim()),
                    format!(
                        "{}, {}",
                        (percent * 1000.0).round() / 1000.0,
                        phase_string.1
                    ),
                );
            }
        }
        let other_percent = 100.0 * other / total_ns;
        if other_percent > 0.5 {
            timer_data.insert(
                "other %".to_string(),
                format!("{} ", (other_percent * 1000.0).round() / 1000.0),
            );
        }
        timer_data
    }

    pub fn log_table(&self) {
        let timer_data = self.get_all();
        let mut table = Builder::from(timer_data).build();
        table.with(Style::modern_rounded());
        info!("\n \n TIMER DATA \n \n {}", table.to_string());
    }
}

impl Default for PhaseTimer {
    fn default() -> Self {
        PhaseTimer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_time_units() {
        assert_eq!(elapsed_time(Duration::from_micros(10)).0, " us");
        let (unit, val) = elapsed_time(Duration::from_millis(12));
        assert_eq!(unit, " ms");
        assert_eq!(val, 12.0);
        assert_eq!(elapsed_time(Duration::from_secs(3)).0, " s");
    }

    #[test]
    fn test_phases_accumulate() {
        let mut timer = PhaseTimer::new();
        timer.newton_tic();
        std::thread::sleep(Duration::from_millis(2));
        timer.newton_tac();
        timer.newton_tic();
        std::thread::sleep(Duration::from_millis(2));
        timer.newton_tac();
        assert!(timer.newton >= Duration::from_millis(4));
        assert_eq!(timer.singleton, Duration::from_secs(0));
        let data = timer.get_all();
        assert!(data.keys().any(|k| k.starts_with("newton")));
        assert!(data.keys().any(|k| k.starts_with("time elapsed")));
    }
}
