//! Console command parsing.

/// A command typed while no prompt is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    List,
    Start,
    Stop,
    /// Show the monitored path, or change it.
    Path(Option<String>),
    Add(String),
    Remove(String),
    Quit,
    Empty,
}

pub const HELP: &str = "\
Commands:
  status        show monitoring state and counters
  list          list destination directories
  start         start monitoring
  stop          stop monitoring
  path [DIR]    show or change the monitored directory
  add DIR       add a destination directory
  remove DIR    remove a destination directory
  quit          exit
At a prompt, press enter for the default or type :q to skip the file.
";

impl Command {
    /// Parse one input line.
    ///
    /// # Errors
    ///
    /// Returns a message for the user if the line is not a command.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, Some(rest.trim()).filter(|a| !a.is_empty())),
            None => (line, None),
        };

        let command = match (word.to_lowercase().as_str(), arg) {
            ("", _) => Self::Empty,
            ("help" | "?", None) => Self::Help,
            ("status", None) => Self::Status,
            ("list" | "ls", None) => Self::List,
            ("start", None) => Self::Start,
            ("stop", None) => Self::Stop,
            ("path", arg) => Self::Path(arg.map(String::from)),
            ("add" | "+", Some(dir)) => Self::Add(dir.to_string()),
            ("remove" | "rm" | "-", Some(dir)) => Self::Remove(dir.to_string()),
            ("quit" | "exit", None) => Self::Quit,
            ("add" | "+" | "remove" | "rm" | "-", None) => {
                return Err(format!("usage: {word} DIR"));
            }
            (_, Some(_)) if is_known(word) => {
                return Err(format!("'{word}' takes no argument"));
            }
            _ => return Err(format!("unknown command '{word}', type 'help'")),
        };
        Ok(command)
    }
}

fn is_known(word: &str) -> bool {
    matches!(
        word.to_lowercase().as_str(),
        "help" | "?" | "status" | "list" | "ls" | "start" | "stop" | "quit" | "exit"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("help"), Ok(Command::Help));
        assert_eq!(Command::parse("  STATUS "), Ok(Command::Status));
        assert_eq!(Command::parse("ls"), Ok(Command::List));
        assert_eq!(Command::parse("start"), Ok(Command::Start));
        assert_eq!(Command::parse("stop"), Ok(Command::Stop));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
        assert_eq!(Command::parse(""), Ok(Command::Empty));
    }

    #[test]
    fn test_parse_path_arguments() {
        assert_eq!(Command::parse("path"), Ok(Command::Path(None)));
        assert_eq!(
            Command::parse("path /home/me/My Downloads"),
            Ok(Command::Path(Some("/home/me/My Downloads".to_string())))
        );
        assert_eq!(
            Command::parse("add  /srv/archive "),
            Ok(Command::Add("/srv/archive".to_string()))
        );
        assert_eq!(
            Command::parse("- /srv/archive"),
            Ok(Command::Remove("/srv/archive".to_string()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("add").unwrap_err().contains("usage"));
        assert!(Command::parse("stop now").unwrap_err().contains("no argument"));
        assert!(Command::parse("frobnicate").unwrap_err().contains("unknown"));
    }
}
