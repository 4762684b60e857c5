/// One line of a test script: a bare command, or a command with
/// tab-separated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Bare(String),
    Args(String, Vec<String>),
}

impl ScriptCommand {
    pub fn bare(command: impl Into<String>) -> Self {
        Self::Bare(command.into())
    }

    pub fn arg(command: impl Into<String>, arg: impl Into<String>) -> Self {
        Self::Args(command.into(), vec![arg.into()])
    }

    pub fn args(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::Args(command.into(), args)
    }
}

/// Serializes a script into the wire text format: one command per line,
/// command and arguments joined by tabs. The result is what the `script`
/// test parameter expects.
pub fn script_to_string(commands: &[ScriptCommand]) -> String {
    commands
        .iter()
        .map(|command| match command {
            ScriptCommand::Bare(name) => name.clone(),
            ScriptCommand::Args(name, args) => {
                let mut parts = vec![name.clone()];
                parts.extend(args.iter().cloned());
                parts.join("\t")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_to_string() {
        let script = [
            ScriptCommand::arg("logData", "0"),
            ScriptCommand::arg("navigate", "http://example.com/login"),
            ScriptCommand::args(
                "setValue",
                vec!["name=username".to_string(), "johndoe".to_string()],
            ),
            ScriptCommand::bare("submitForm"),
        ];

        assert_eq!(
            script_to_string(&script),
            "logData\t0\nnavigate\thttp://example.com/login\n\
             setValue\tname=username\tjohndoe\nsubmitForm"
        );
    }

    #[test]
    fn test_empty_script() {
        assert_eq!(script_to_string(&[]), "");
    }
}
