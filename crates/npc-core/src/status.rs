//! Execution status shared by every node, condition consumer and driver.

/// The result of executing a behaviour-tree node for one tick.
///
/// `Unknown` is never returned by `execute`; it marks "no prior record" in
/// debug views.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TreeNodeStatus {
    #[default]
    Unknown,
    /// A guard condition rejected the node this tick.
    CannotExecute,
    /// Multi-tick work in progress; resume at the same point next tick.
    Running,
    Finished,
    Failed,
    /// Internal fault during evaluation, distinct from ordinary failure.
    Exception,
}

impl TreeNodeStatus {
    /// `true` for `Finished`, `Failed` and `Exception`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TreeNodeStatus::Finished | TreeNodeStatus::Failed | TreeNodeStatus::Exception
        )
    }

    /// `true` for the two outcomes selectors skip over: `CannotExecute` and
    /// `Failed`.
    #[inline]
    pub fn is_rejected(self) -> bool {
        matches!(self, TreeNodeStatus::CannotExecute | TreeNodeStatus::Failed)
    }

    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, TreeNodeStatus::Running)
    }

    /// Stable upper-case label, used in debug attributes and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            TreeNodeStatus::Unknown       => "UNKNOWN",
            TreeNodeStatus::CannotExecute => "CANNOT_EXECUTE",
            TreeNodeStatus::Running       => "RUNNING",
            TreeNodeStatus::Finished      => "FINISHED",
            TreeNodeStatus::Failed        => "FAILED",
            TreeNodeStatus::Exception     => "EXCEPTION",
        }
    }
}

impl std::fmt::Display for TreeNodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
