/// PostgreSQL administrative operations.
///
/// Each operation resolves connection parameters from the layered
/// configuration, builds a client command line, runs it through the injected
/// runner, and interprets the captured output. Expected negative outcomes
/// (duplicate create, missing target) are not errors: they log at info level
/// and return a negative value, so callers can treat the operations as
/// idempotent declarations.
///
/// Check-then-act sequences are not locked. Concurrent callers can race
/// between an existence check and the following create or drop; the server's
/// own uniqueness constraints are authoritative, and a client failure there
/// surfaces as a command error.
use crate::command::CommandLine;
use crate::config::{ConfigContext, ConnOverrides};
use crate::core::{CommandResult, PgminError, Result};
use crate::exec::{self, Runner, SystemRunner};
use crate::table::{self, TabularRecord};
use regex::Regex;
use tracing::info;

/// Client binaries. `psql` gates module availability; the other three are
/// assumed to ship alongside it.
pub const PSQL_BIN: &str = "psql";
pub const CREATEDB_BIN: &str = "createdb";
pub const DROPDB_BIN: &str = "dropdb";
pub const DROPUSER_BIN: &str = "dropuser";

/// Expected column counts for the listing queries. These are contractual
/// with psql's default aligned output format and the C locale; a localized
/// or reformatted psql (or a server that grows catalog columns) breaks them
/// and shows up as a parse error.
pub const DB_LIST_COLUMNS: usize = 6;
pub const ROLE_LIST_COLUMNS: usize = 13;

/// Name columns scanned by the existence checks.
pub const DB_NAME_COLUMN: &str = "Name";
pub const ROLE_NAME_COLUMN: &str = "rolname";

const ROLE_LIST_QUERY: &str = "SELECT * FROM pg_roles";

/// Optional flags for `db_create`, passed through to `createdb`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbCreateOpts {
    pub tablespace: Option<String>,
    pub encoding: Option<String>,
    pub local: Option<String>,
    pub lc_collate: Option<String>,
    pub lc_ctype: Option<String>,
    pub owner: Option<String>,
    pub template: Option<String>,
}

/// Optional attributes for `user_create` and `user_update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserOpts {
    pub createdb: bool,
    pub createuser: bool,
    pub encrypted: bool,
    pub password: Option<String>,
}

/// The operation layer. Holds the configuration context and the runner; all
/// state is re-resolved per call.
pub struct Postgres<R: Runner> {
    ctx: ConfigContext,
    runner: R,
}

impl Postgres<SystemRunner> {
    /// Loads the module against the real system, gated on the `psql` binary
    /// being present on this host. This is the only place an `Unavailable`
    /// error originates.
    pub fn load(ctx: ConfigContext) -> Result<Self> {
        exec::check_client(PSQL_BIN)?;
        Ok(Self::with_runner(ctx, SystemRunner))
    }
}

impl<R: Runner> Postgres<R> {
    /// Wires in an explicit runner. Test seam; no availability gate.
    pub fn with_runner(ctx: ConfigContext, runner: R) -> Self {
        Self { ctx, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Returns the client product name and version from `psql --version`.
    pub fn version(&self, conn: &ConnOverrides) -> Result<String> {
        let params = self.ctx.resolve(conn);
        let cmd = CommandLine::new(PSQL_BIN)
            .arg("--version")
            .with_connection(&params);
        let output = self.runner.run(&cmd)?;

        let first_line = output.lines().next().unwrap_or("");
        let re = Regex::new(r"\((\w+)\)\s+(\d[\w.]*)").expect("static regex");
        match re.captures(first_line) {
            Some(caps) => Ok(format!("{} {}", &caps[1], &caps[2])),
            None => Err(PgminError::Parse(format!(
                "unrecognized version banner: {}",
                first_line
            ))),
        }
    }

    /// Lists databases via `psql -l`.
    pub fn db_list(&self, conn: &ConnOverrides) -> Result<Vec<TabularRecord>> {
        let params = self.ctx.resolve(conn);
        let cmd = CommandLine::new(PSQL_BIN).arg("-l").with_connection(&params);
        let output = self.runner.run(&cmd)?;
        table::parse_aligned(&output, DB_LIST_COLUMNS)
    }

    /// Checks whether a database with exactly this name exists.
    pub fn db_exists(&self, name: &str, conn: &ConnOverrides) -> Result<bool> {
        let databases = self.db_list(conn)?;
        Ok(databases
            .iter()
            .any(|record| record.get(DB_NAME_COLUMN) == Some(name)))
    }

    /// Creates a database unless it already exists.
    ///
    /// Returns `Ok(false)` without running `createdb` when the database is
    /// already present or a requested template is missing. After running, the
    /// verdict comes from a fresh existence check, so a client that exits
    /// cleanly without creating anything still reports `false`.
    pub fn db_create(&self, name: &str, opts: &DbCreateOpts, conn: &ConnOverrides) -> Result<bool> {
        if self.db_exists(name, conn)? {
            info!("database '{}' already exists", name);
            return Ok(false);
        }
        if let Some(template) = &opts.template {
            if !self.db_exists(template, conn)? {
                info!("template '{}' does not exist", template);
                return Ok(false);
            }
        }

        let mut cmd = CommandLine::new(CREATEDB_BIN);
        let flags = [
            ("-D", &opts.tablespace),
            ("-E", &opts.encoding),
            ("-l", &opts.local),
            ("--lc-collate", &opts.lc_collate),
            ("--lc-ctype", &opts.lc_ctype),
            ("-O", &opts.owner),
            ("-T", &opts.template),
        ];
        for (flag, value) in flags {
            if let Some(v) = value {
                cmd = cmd.arg(flag).arg(v);
            }
        }
        let cmd = cmd.arg(name).with_connection(&self.ctx.resolve(conn));
        self.runner.run(&cmd)?;

        if self.db_exists(name, conn)? {
            Ok(true)
        } else {
            info!("failed to create database '{}'", name);
            Ok(false)
        }
    }

    /// Drops a database if it exists; the verdict comes from a re-check.
    pub fn db_remove(&self, name: &str, conn: &ConnOverrides) -> Result<bool> {
        if !self.db_exists(name, conn)? {
            info!("database '{}' does not exist", name);
            return Ok(false);
        }

        let cmd = CommandLine::new(DROPDB_BIN)
            .arg(name)
            .with_connection(&self.ctx.resolve(conn));
        self.runner.run(&cmd)?;

        if !self.db_exists(name, conn)? {
            Ok(true)
        } else {
            info!("failed to drop database '{}'", name);
            Ok(false)
        }
    }

    /// Lists roles from the pg_roles catalog.
    pub fn user_list(&self, conn: &ConnOverrides) -> Result<Vec<TabularRecord>> {
        let params = self.ctx.resolve(conn);
        let cmd = CommandLine::new(PSQL_BIN)
            .arg("-c")
            .arg(ROLE_LIST_QUERY)
            .with_connection(&params);
        let output = self.runner.run(&cmd)?;
        table::parse_aligned(&output, ROLE_LIST_COLUMNS)
    }

    /// Checks whether a role with exactly this name exists.
    pub fn user_exists(&self, name: &str, conn: &ConnOverrides) -> Result<bool> {
        let roles = self.user_list(conn)?;
        Ok(roles
            .iter()
            .any(|record| record.get(ROLE_NAME_COLUMN) == Some(name)))
    }

    /// Creates a role unless it already exists.
    ///
    /// On the no-op path this logs and returns `Ok(None)`; otherwise it runs
    /// `CREATE USER` through `psql -c` and returns the client's raw output.
    pub fn user_create(&self, username: &str, opts: &UserOpts, conn: &ConnOverrides) -> CommandResult {
        if self.user_exists(username, conn)? {
            info!("user '{}' already exists", username);
            return Ok(None);
        }
        let sql = role_clause("CREATE USER", username, opts);
        self.run_sql(&sql, conn).map(Some)
    }

    /// Alters an existing role with the same attribute clause as
    /// `user_create`. Missing role is a logged no-op returning `Ok(None)`.
    pub fn user_update(&self, username: &str, opts: &UserOpts, conn: &ConnOverrides) -> CommandResult {
        if !self.user_exists(username, conn)? {
            info!("user '{}' does not exist", username);
            return Ok(None);
        }
        let sql = role_clause("ALTER USER", username, opts);
        self.run_sql(&sql, conn).map(Some)
    }

    /// Drops a role if it exists; the verdict comes from a re-check.
    pub fn user_remove(&self, username: &str, conn: &ConnOverrides) -> Result<bool> {
        if !self.user_exists(username, conn)? {
            info!("user '{}' does not exist", username);
            return Ok(false);
        }

        let cmd = CommandLine::new(DROPUSER_BIN)
            .arg(username)
            .with_connection(&self.ctx.resolve(conn));
        self.runner.run(&cmd)?;

        if !self.user_exists(username, conn)? {
            Ok(true)
        } else {
            info!("failed to drop user '{}'", username);
            Ok(false)
        }
    }

    fn run_sql(&self, sql: &str, conn: &ConnOverrides) -> Result<String> {
        let params = self.ctx.resolve(conn);
        let cmd = CommandLine::new(PSQL_BIN)
            .arg("-c")
            .arg(sql)
            .with_connection(&params);
        self.runner.run(&cmd)
    }
}

/// Builds a `CREATE USER`/`ALTER USER` statement, appending the attribute
/// keywords in fixed order: PASSWORD, CREATEDB, CREATEUSER, ENCRYPTED. When
/// no attribute is set the trailing `WITH` is stripped.
fn role_clause(verb: &str, username: &str, opts: &UserOpts) -> String {
    let mut sql = format!("{} {} WITH", verb, username);
    if let Some(password) = &opts.password {
        sql.push_str(&format!(" PASSWORD '{}'", password));
    }
    if opts.createdb {
        sql.push_str(" CREATEDB");
    }
    if opts.createuser {
        sql.push_str(" CREATEUSER");
    }
    if opts.encrypted {
        sql.push_str(" ENCRYPTED");
    }
    if let Some(stripped) = sql.strip_suffix(" WITH") {
        return stripped.to_string();
    }
    sql
}
