//! Export progress arithmetic.

/// `round(completed / total * 100)`, rounding halves up.
///
/// An empty job counts as complete.
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let completed = completed.min(total);
    // Integer form of floor(x + 0.5) for x = completed * 100 / total.
    ((completed * 200 + total) / (2 * total)) as u8
}

/// Counter over a fixed number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    completed: usize,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
        }
    }

    /// Record one attempt (success or skip) and return the new percentage.
    pub fn advance(&mut self) -> u8 {
        self.completed = (self.completed + 1).min(self.total);
        self.percent()
    }

    pub fn percent(&self) -> u8 {
        percent(self.completed, self.total)
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}
