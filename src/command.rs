use crate::config::ConnectionParams;
use std::fmt;

/// A command line as a structured argument vector: program name plus ordered
/// arguments. Built once per operation invocation and handed straight to the
/// runner; the arguments are never re-joined through a shell, so values with
/// spaces or quotes need no escaping.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends the connection flags for the resolved parameters, strictly in
    /// this order, each only if the field is present:
    ///
    /// 1. `-U <user>`
    /// 2. `-h <host>`
    /// 3. `-p <port>`
    /// 4. `-w` (always; never prompt for a password)
    ///
    /// If a sudo user is set, the whole command is then rewritten to run
    /// through `sudo -u <sudo_user>`.
    pub fn with_connection(mut self, params: &ConnectionParams) -> Self {
        if let Some(user) = &params.user {
            self = self.arg("-U").arg(user);
        }
        if let Some(host) = &params.host {
            self = self.arg("-h").arg(host);
        }
        if let Some(port) = &params.port {
            self = self.arg("-p").arg(port);
        }
        self = self.arg("-w");
        if let Some(sudo_user) = &params.sudo_user {
            let mut args = vec!["-u".to_string(), sudo_user.clone(), self.program];
            args.append(&mut self.args);
            return Self {
                program: "sudo".to_string(),
                args,
            };
        }
        self
    }
}

/// Space-joined rendering, for log lines only. Execution always uses the
/// argument vector.
impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        user: Option<&str>,
        host: Option<&str>,
        port: Option<&str>,
        sudo_user: Option<&str>,
    ) -> ConnectionParams {
        ConnectionParams {
            user: user.map(str::to_string),
            host: host.map(str::to_string),
            port: port.map(str::to_string),
            sudo_user: sudo_user.map(str::to_string),
        }
    }

    #[test]
    fn test_flag_order_is_fixed() {
        let cmd = CommandLine::new("psql")
            .arg("-l")
            .with_connection(&params(Some("postgres"), Some("db1"), Some("5432"), None));
        assert_eq!(cmd.program, "psql");
        assert_eq!(
            cmd.args,
            vec!["-l", "-U", "postgres", "-h", "db1", "-p", "5432", "-w"]
        );
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let cmd = CommandLine::new("psql").with_connection(&params(None, None, None, None));
        assert_eq!(cmd.args, vec!["-w"]);
    }

    #[test]
    fn test_password_prompt_always_disabled() {
        let cmd = CommandLine::new("dropdb")
            .arg("mydb")
            .with_connection(&params(Some("postgres"), None, None, None));
        assert_eq!(cmd.args.last().map(String::as_str), Some("-w"));
    }

    #[test]
    fn test_sudo_user_wraps_whole_command() {
        let cmd = CommandLine::new("psql")
            .arg("-l")
            .with_connection(&params(Some("postgres"), None, Some("5432"), Some("deploy")));
        assert_eq!(cmd.program, "sudo");
        assert_eq!(
            cmd.args,
            vec!["-u", "deploy", "psql", "-l", "-U", "postgres", "-p", "5432", "-w"]
        );
    }

    #[test]
    fn test_display_renders_tokens() {
        let cmd = CommandLine::new("createdb").arg("mydb").arg("-O").arg("owner");
        assert_eq!(cmd.to_string(), "createdb mydb -O owner");
    }
}
