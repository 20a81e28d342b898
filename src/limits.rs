//! Execution limits
//!
//! Bounds applied to a single run. All limits are enforced inside the running
//! program, so exceeding one surfaces as a captured runtime exception rather
//! than an error returned to the caller.

/// Default number of captured calls per function.
pub const DEFAULT_DETACHED_CAPTURE_LIMIT: usize = 1000;

/// Default maximum depth of nested user function calls.
pub const DEFAULT_RECURSION_LIMIT: usize = 1000;

/// Default stack size of the worker thread that runs the program.
pub const DEFAULT_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Limits for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Maximum entries a frame's active child set may hold before another
    /// frame is opened in it (default: unlimited).
    pub(crate) iteration_limit: Option<usize>,
    /// Calls per function that are captured in detail (default: 1,000).
    pub(crate) detached_capture_limit: usize,
    /// Maximum user call depth (default: 1,000).
    pub(crate) recursion_limit: usize,
    /// Worker thread stack size in bytes (default: 256 MiB).
    pub(crate) stack_size: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            iteration_limit: None,
            detached_capture_limit: DEFAULT_DETACHED_CAPTURE_LIMIT,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl ExecutionLimits {
    /// Create limits with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration limit.
    pub fn iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    /// Set how many calls of each function are captured.
    pub fn detached_capture_limit(mut self, limit: usize) -> Self {
        self.detached_capture_limit = limit;
        self
    }

    /// Set the recursion limit.
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Set the worker thread stack size.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    pub fn get_iteration_limit(&self) -> Option<usize> {
        self.iteration_limit
    }
    pub fn get_detached_capture_limit(&self) -> usize {
        self.detached_capture_limit
    }
    pub fn get_recursion_limit(&self) -> usize {
        self.recursion_limit
    }
    pub fn get_stack_size(&self) -> usize {
        self.stack_size
    }
}
