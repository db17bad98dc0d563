//! Invocation verification against the double's history.

use std::fmt;

use lazycache_core::{CacheError, CacheResult};

use crate::substrate::{DoubleCore, Operation};

/// Expected number of invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Times {
    Never,
    Once,
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
}

impl Times {
    pub fn matches(&self, actual: usize) -> bool {
        match *self {
            Times::Never => actual == 0,
            Times::Once => actual == 1,
            Times::Exactly(n) => actual == n,
            Times::AtLeast(n) => actual >= n,
            Times::AtMost(n) => actual <= n,
        }
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Times::Never => f.write_str("never"),
            Times::Once => f.write_str("exactly once"),
            Times::Exactly(n) => write!(f, "exactly {} times", n),
            Times::AtLeast(n) => write!(f, "at least {} times", n),
            Times::AtMost(n) => write!(f, "at most {} times", n),
        }
    }
}

/// Check how often `operation` was invoked for `key`.
pub fn verify(core: &DoubleCore, operation: Operation, key: &str, times: Times) -> CacheResult<()> {
    let actual = core.invocation_count(operation, key)?;
    if times.matches(actual) {
        return Ok(());
    }
    Err(CacheError::VerificationFailed {
        operation: operation.to_string(),
        key: key.to_string(),
        expected: times.to_string(),
        actual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::{Argument, Call, ReturnShape};

    #[test]
    fn test_times_matching() {
        assert!(Times::Never.matches(0));
        assert!(!Times::Once.matches(2));
        assert!(Times::Exactly(3).matches(3));
        assert!(Times::AtLeast(2).matches(5));
        assert!(!Times::AtMost(1).matches(2));
    }

    #[test]
    fn test_verify_reports_actual_count() {
        let core = DoubleCore::new();
        for _ in 0..2 {
            let call =
                Call::new(Operation::Remove, ReturnShape::Void).arg(Argument::Key("k".to_string()));
            core.dispatch(&call).unwrap();
        }

        assert!(verify(&core, Operation::Remove, "k", Times::Exactly(2)).is_ok());
        assert!(verify(&core, Operation::Remove, "other", Times::Never).is_ok());

        let err = verify(&core, Operation::Remove, "k", Times::Once).unwrap_err();
        assert_eq!(
            err,
            CacheError::VerificationFailed {
                operation: "Remove".to_string(),
                key: "k".to_string(),
                expected: "exactly once".to_string(),
                actual: 2,
            }
        );
    }
}
