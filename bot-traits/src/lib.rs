use std::fmt::Debug;

// This trait should be usable on all iterator chains, notably, any Result (eyre)
pub trait ForwardRefToTracing<T, E> {
    fn trace_err(self) -> Result<T, E>;
    fn trace_err_ok(self) -> Option<T>;
    /// Same as `trace_err_ok`, for failures that are expected every now and then
    /// (a deleted message, a missing log channel).
    fn warn_err_ok(self) -> Option<T>;
}

impl<T, E> ForwardRefToTracing<T, E> for Result<T, E>
where
    E: Debug,
{
    fn trace_err(self) -> Result<T, E> {
        self.inspect_err(|e| tracing::error!("{:?}", e))
    }

    fn trace_err_ok(self) -> Option<T> {
        self.trace_err().ok()
    }

    fn warn_err_ok(self) -> Option<T> {
        self.inspect_err(|e| tracing::warn!("{:?}", e)).ok()
    }
}

#[cfg(test)]
mod test {
    use super::ForwardRefToTracing;

    #[test]
    fn keeps_values() {
        let ok: Result<u8, &str> = Ok(4);
        assert_eq!(ok.trace_err_ok(), Some(4));
        assert_eq!(ok.warn_err_ok(), Some(4));
    }

    #[test]
    fn drops_errors() {
        let err: Result<u8, &str> = Err("gone");
        assert_eq!(err.trace_err_ok(), None);
        assert_eq!(err.warn_err_ok(), None);
        assert_eq!(err.trace_err(), Err("gone"));
    }
}
