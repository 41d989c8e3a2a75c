/// Limits of a shaping call.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ShapeConfig {
    max_runs: usize,
    max_attempts: usize,
}

impl ShapeConfig {
    /// Creates the default configuration.
    #[inline]
    pub fn new() -> Self {
        ShapeConfig {
            max_runs: 10,
            max_attempts: 16,
        }
    }

    /// Sets the maximum number of script runs.
    ///
    /// Text the engine splits into more runs is not shaped.
    /// 10 by default.
    #[inline]
    pub fn with_max_runs(mut self, max_runs: usize) -> Self {
        self.max_runs = max_runs;
        self
    }

    /// Sets how many times a call may run out of working memory,
    /// grow the buffer and start over. At least one attempt is always made.
    ///
    /// 16 by default. The buffer's own growth limit usually kicks in first.
    #[inline]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Returns the maximum number of script runs.
    #[inline]
    pub fn max_runs(&self) -> usize {
        self.max_runs
    }

    /// Returns the maximum number of shaping attempts.
    #[inline]
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self::new()
    }
}
