//! Tests for error types.

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::path::Path;

    #[test]
    fn test_error_display() {
        let err = Error::config("invalid log level");
        assert_eq!(err.to_string(), "configuration error: invalid log level");
    }

    #[test]
    fn test_error_internal() {
        let err = Error::internal("channel closed");
        assert_eq!(err.to_string(), "internal error: channel closed");
    }

    #[test]
    fn test_watcher_error_conversion() {
        let watch_err = WatcherError::WatchFailed {
            path: "/tmp/test".to_string(),
            reason: "permission denied".to_string(),
        };
        let err: Error = watch_err.into();
        assert!(matches!(err, Error::Watcher(_)));
    }

    #[test]
    fn test_watch_failed_helper() {
        let err = WatcherError::watch_failed(Path::new("/srv/app"), "no such file");
        assert_eq!(
            err.to_string(),
            "failed to watch path '/srv/app': no such file"
        );
    }

    #[test]
    fn test_watcher_error_walk_failed() {
        let err = WatcherError::WalkFailed {
            path: "/src".to_string(),
            reason: "loop detected".to_string(),
        };
        assert_eq!(err.to_string(), "failed to walk '/src': loop detected");
    }

    #[test]
    fn test_watcher_error_init_failed() {
        let err = WatcherError::InitFailed("inotify limit reached".to_string());
        assert_eq!(
            err.to_string(),
            "failed to create watcher: inotify limit reached"
        );
    }

    #[test]
    fn test_supervisor_error_conversion() {
        let sup_err = SupervisorError::CommandNotFound {
            program: "cargo".to_string(),
            reason: "cannot find binary path".to_string(),
        };
        let err: Error = sup_err.into();
        assert!(matches!(err, Error::Supervisor(_)));
        assert_eq!(
            err.to_string(),
            "supervisor error: command 'cargo' not found: cannot find binary path"
        );
    }

    #[test]
    fn test_supervisor_error_spawn_failed() {
        let err = SupervisorError::SpawnFailed {
            program: "./server".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(err.to_string(), "failed to start './server': permission denied");
    }

    #[test]
    fn test_supervisor_error_empty_command() {
        assert_eq!(SupervisorError::EmptyCommand.to_string(), "no command to run");
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn inner() -> Result<i32> {
            Err(WatcherError::InitFailed("backend unavailable".to_string()).into())
        }

        fn outer() -> Result<i32> {
            let _ = inner()?;
            Ok(0)
        }

        let result = outer();
        assert_eq!(
            result.unwrap_err().to_string(),
            "watcher error: failed to create watcher: backend unavailable"
        );
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::Internal("something went wrong".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Internal"));
        assert!(debug_str.contains("something went wrong"));
    }
}
