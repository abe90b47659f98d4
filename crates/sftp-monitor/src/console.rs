//! Interactive commands read from stdin while monitoring.

use monitor_runtime::MonitorStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Status,
    Stop,
}

impl Command {
    /// Parse one input line. Blank or unknown input yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "p" | "pause" => Some(Command::Pause),
            "r" | "resume" => Some(Command::Resume),
            "s" | "status" => Some(Command::Status),
            "q" | "quit" | "stop" => Some(Command::Stop),
            _ => None,
        }
    }
}

/// One-line summary of the controller state.
pub fn describe(status: &MonitorStatus) -> String {
    match (&status.file_name, status.state) {
        (Some(file), Some(state)) => format!(
            "{file}: {state}{}, {} batch(es) emitted",
            if status.paused { " (pause requested)" } else { "" },
            status.batches
        ),
        _ => "no monitoring session".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_runtime::session::SessionState;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("pause"), Some(Command::Pause));
        assert_eq!(Command::parse("  P \n"), Some(Command::Pause));
        assert_eq!(Command::parse("resume"), Some(Command::Resume));
        assert_eq!(Command::parse("status"), Some(Command::Status));
        assert_eq!(Command::parse("quit"), Some(Command::Stop));
        assert_eq!(Command::parse("STOP"), Some(Command::Stop));
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("restart"), None);
    }

    #[test]
    fn test_describe() {
        let status = MonitorStatus {
            running: true,
            file_name: Some("app.log".to_string()),
            state: Some(SessionState::Paused),
            paused: true,
            batches: 4,
        };
        assert_eq!(
            describe(&status),
            "app.log: paused (pause requested), 4 batch(es) emitted"
        );

        let idle = MonitorStatus {
            running: false,
            file_name: None,
            state: None,
            paused: false,
            batches: 0,
        };
        assert_eq!(describe(&idle), "no monitoring session");
    }
}
