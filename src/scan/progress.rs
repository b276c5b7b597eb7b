//! Progress reporting for a single package scan

use tracing::trace;

/// Caller supplied progress sink receiving percentage increments
pub struct Progress<'a> {
    callback: Option<&'a mut (dyn FnMut(f64) + Send)>,
    reported: f64,
}

impl<'a> Progress<'a> {
    pub fn new(callback: &'a mut (dyn FnMut(f64) + Send)) -> Self {
        Self {
            callback: Some(callback),
            reported: 0.0,
        }
    }

    /// Progress that is tracked but not reported anywhere
    pub fn disabled() -> Self {
        Self {
            callback: None,
            reported: 0.0,
        }
    }

    /// Report an increment to the callback
    pub fn report(&mut self, increment: f64) {
        if increment <= 0.0 {
            return;
        }
        self.reported += increment;
        trace!("Progress +{:.2} ({:.2})", increment, self.reported);
        if let Some(callback) = self.callback.as_mut() {
            callback(increment);
        }
    }

}

/// A share of the progress split evenly over a number of steps.
///
/// Steps never report more than what is left; [`ProgressBudget::flush`]
/// reports whatever remains.
#[derive(Debug, Clone, Copy)]
pub struct ProgressBudget {
    available: f64,
    increment: f64,
}

impl ProgressBudget {
    pub fn new(total: f64, steps: usize) -> Self {
        let increment = if steps == 0 { 0.0 } else { total / steps as f64 };
        Self {
            available: total,
            increment,
        }
    }

    /// Report one step
    pub fn step(&mut self, progress: &mut Progress<'_>) {
        if self.available > 0.0 {
            let increment = self.increment.min(self.available);
            progress.report(increment);
            self.available -= increment;
        }
    }

    /// Report the unconsumed remainder
    pub fn flush(&mut self, progress: &mut Progress<'_>) {
        if self.available > 0.0 {
            progress.report(self.available);
            self.available = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(70.0, 3, 3)]
    #[case(70.0, 7, 7)]
    #[case(70.0, 1, 1)]
    #[case(70.0, 3, 1)]
    #[case(70.0, 0, 0)]
    fn steps_and_flush_add_up_to_total(
        #[case] total: f64,
        #[case] steps: usize,
        #[case] taken: usize,
    ) {
        let mut increments = Vec::new();
        let mut callback = |inc: f64| increments.push(inc);
        let mut progress = Progress::new(&mut callback);
        let mut budget = ProgressBudget::new(total, steps);

        for _ in 0..taken {
            budget.step(&mut progress);
        }
        budget.flush(&mut progress);

        budget.flush(&mut progress);
        drop(progress);

        assert!((increments.iter().sum::<f64>() - total).abs() < 1e-9);
        assert!(increments.iter().all(|inc| *inc > 0.0));
    }

    #[test]
    fn step_never_exceeds_budget() {
        let mut total = 0.0;
        let mut callback = |inc: f64| total += inc;
        let mut progress = Progress::new(&mut callback);
        let mut budget = ProgressBudget::new(10.0, 2);

        for _ in 0..5 {
            budget.step(&mut progress);
        }
        budget.flush(&mut progress);
        drop(progress);

        assert!((total - 10.0).abs() < 1e-9);
    }

    #[test]
    fn report_ignores_non_positive_increments() {
        let mut calls = 0;
        let mut callback = |_: f64| calls += 1;
        let mut progress = Progress::new(&mut callback);

        progress.report(0.0);
        progress.report(5.0);
        drop(progress);

        assert_eq!(calls, 1);
    }
}
