use crate::config::ConnOverrides;
use crate::postgres::{DbCreateOpts, UserOpts};

/// Represents a parsed command-line invocation.
#[derive(Debug, PartialEq)]
pub enum CliCommand {
    Version,
    DbList,
    DbExists(String),
    DbCreate { name: String, opts: DbCreateOpts },
    DbRemove(String),
    UserList,
    UserExists(String),
    UserCreate { username: String, opts: UserOpts },
    UserUpdate { username: String, opts: UserOpts },
    UserRemove(String),
    Help,
}

/// Everything parsed from one invocation: the command plus the global
/// connection and configuration-file options.
#[derive(Debug, PartialEq)]
pub struct Invocation {
    pub command: CliCommand,
    pub conn: ConnOverrides,
    pub config_file: Option<String>,
    pub pillar_file: Option<String>,
}

/// Parses the argument vector (without the program name) into an
/// `Invocation`. Returns a usage message on malformed input.
pub fn parse(args: &[String]) -> Result<Invocation, String> {
    let mut conn = ConnOverrides::default();
    let mut config_file = None;
    let mut pillar_file = None;
    let mut positional: Vec<String> = Vec::new();
    let mut db_opts = DbCreateOpts::default();
    let mut user_opts = UserOpts::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--user" => conn.user = Some(expect_value(&mut iter, arg)?),
            "--host" => conn.host = Some(expect_value(&mut iter, arg)?),
            "--port" => conn.port = Some(expect_value(&mut iter, arg)?),
            "--sudo-user" => conn.sudo_user = Some(expect_value(&mut iter, arg)?),
            "--config" => config_file = Some(expect_value(&mut iter, arg)?),
            "--pillar" => pillar_file = Some(expect_value(&mut iter, arg)?),
            "--tablespace" => db_opts.tablespace = Some(expect_value(&mut iter, arg)?),
            "--encoding" => db_opts.encoding = Some(expect_value(&mut iter, arg)?),
            "--local" => db_opts.local = Some(expect_value(&mut iter, arg)?),
            "--lc-collate" => db_opts.lc_collate = Some(expect_value(&mut iter, arg)?),
            "--lc-ctype" => db_opts.lc_ctype = Some(expect_value(&mut iter, arg)?),
            "--owner" => db_opts.owner = Some(expect_value(&mut iter, arg)?),
            "--template" => db_opts.template = Some(expect_value(&mut iter, arg)?),
            "--password" => user_opts.password = Some(expect_value(&mut iter, arg)?),
            "--createdb" => user_opts.createdb = true,
            "--createuser" => user_opts.createuser = true,
            "--encrypted" => user_opts.encrypted = true,
            other if other.starts_with("--") => {
                return Err(format!("unknown option: {}", other));
            }
            other => positional.push(other.to_string()),
        }
    }

    let Some((command, rest)) = positional.split_first() else {
        return Err("no command given".to_string());
    };

    let name = |rest: &[String], what: &str| -> Result<String, String> {
        rest.first()
            .cloned()
            .ok_or_else(|| format!("{} requires a name argument", what))
    };

    let command = match command.as_str() {
        "version" => CliCommand::Version,
        "db-list" => CliCommand::DbList,
        "db-exists" => CliCommand::DbExists(name(rest, "db-exists")?),
        "db-create" => CliCommand::DbCreate {
            name: name(rest, "db-create")?,
            opts: db_opts,
        },
        "db-remove" => CliCommand::DbRemove(name(rest, "db-remove")?),
        "user-list" => CliCommand::UserList,
        "user-exists" => CliCommand::UserExists(name(rest, "user-exists")?),
        "user-create" => CliCommand::UserCreate {
            username: name(rest, "user-create")?,
            opts: user_opts,
        },
        "user-update" => CliCommand::UserUpdate {
            username: name(rest, "user-update")?,
            opts: user_opts,
        },
        "user-remove" => CliCommand::UserRemove(name(rest, "user-remove")?),
        "help" => CliCommand::Help,
        other => return Err(format!("unknown command: {}", other)),
    };

    Ok(Invocation {
        command,
        conn,
        config_file,
        pillar_file,
    })
}

fn expect_value<'a, I: Iterator<Item = &'a String>>(
    iter: &mut I,
    flag: &str,
) -> Result<String, String> {
    iter.next()
        .cloned()
        .ok_or_else(|| format!("{} requires a value", flag))
}

pub const USAGE: &str = "\
Usage: pgmin [OPTIONS] COMMAND [NAME]

Commands:
  version                      show the psql client version
  db-list                      list databases as JSON
  db-exists NAME               check whether a database exists
  db-create NAME               create a database
      [--tablespace T] [--encoding E] [--local L]
      [--lc-collate C] [--lc-ctype C] [--owner O] [--template T]
  db-remove NAME               drop a database
  user-list                    list roles as JSON
  user-exists NAME             check whether a role exists
  user-create NAME             create a role
      [--password PW] [--createdb] [--createuser] [--encrypted]
  user-update NAME             alter a role (same options as user-create)
  user-remove NAME             drop a role
  help                         show this message

Connection options (default: settings files, then postgres/5432):
  --user U  --host H  --port P  --sudo-user S

Configuration:
  --config FILE                process-wide settings (TOML)
  --pillar FILE                externally supplied settings layer (TOML)
";

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(args: &[&str]) -> Invocation {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse(&args).expect("parse failed")
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_ok(&["version"]).command, CliCommand::Version);
        assert_eq!(parse_ok(&["db-list"]).command, CliCommand::DbList);
        assert_eq!(
            parse_ok(&["db-exists", "mydb"]).command,
            CliCommand::DbExists("mydb".to_string())
        );
        assert_eq!(parse_ok(&["help"]).command, CliCommand::Help);
    }

    #[test]
    fn test_parse_connection_overrides() {
        let inv = parse_ok(&["db-list", "--user", "admin", "--port", "5433"]);
        assert_eq!(inv.conn.user.as_deref(), Some("admin"));
        assert_eq!(inv.conn.port.as_deref(), Some("5433"));
        assert_eq!(inv.conn.host, None);
    }

    #[test]
    fn test_parse_db_create_options() {
        let inv = parse_ok(&[
            "db-create", "mydb", "--owner", "alice", "--template", "template0",
        ]);
        match inv.command {
            CliCommand::DbCreate { name, opts } => {
                assert_eq!(name, "mydb");
                assert_eq!(opts.owner.as_deref(), Some("alice"));
                assert_eq!(opts.template.as_deref(), Some("template0"));
                assert_eq!(opts.encoding, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_user_create_flags() {
        let inv = parse_ok(&["user-create", "bob", "--password", "pw", "--createdb"]);
        match inv.command {
            CliCommand::UserCreate { username, opts } => {
                assert_eq!(username, "bob");
                assert_eq!(opts.password.as_deref(), Some("pw"));
                assert!(opts.createdb);
                assert!(!opts.encrypted);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors() {
        let args = |a: &[&str]| a.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(parse(&args(&[])).is_err());
        assert!(parse(&args(&["db-exists"])).is_err());
        assert!(parse(&args(&["frobnicate"])).is_err());
        assert!(parse(&args(&["db-list", "--port"])).is_err());
        assert!(parse(&args(&["db-list", "--frob"])).is_err());
    }

    #[test]
    fn test_parse_config_files() {
        let inv = parse_ok(&["db-list", "--config", "/etc/pgmin.toml", "--pillar", "p.toml"]);
        assert_eq!(inv.config_file.as_deref(), Some("/etc/pgmin.toml"));
        assert_eq!(inv.pillar_file.as_deref(), Some("p.toml"));
    }
}
