use pgmin::cli::{self, CliCommand};
use pgmin::config::{self, ConfigContext, Settings};
use pgmin::core::Result;
use pgmin::postgres::Postgres;
use tracing::info;

fn main() {
    // Initialize the logging system using tracing subscriber
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match cli::parse(&args) {
        Ok(inv) => inv,
        Err(msg) => {
            eprintln!("pgmin: {}", msg);
            eprintln!("{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    if invocation.command == CliCommand::Help {
        println!("{}", cli::USAGE);
        return;
    }

    match run(invocation) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("pgmin: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(invocation: cli::Invocation) -> Result<i32> {
    let ctx = build_context(&invocation)?;
    let pg = Postgres::load(ctx)?;
    let conn = &invocation.conn;

    let exit_code = match invocation.command {
        CliCommand::Version => {
            println!("{}", pg.version(conn)?);
            0
        }
        CliCommand::DbList => {
            println!("{}", serde_json::to_string_pretty(&pg.db_list(conn)?)?);
            0
        }
        CliCommand::DbExists(name) => print_verdict(pg.db_exists(&name, conn)?),
        CliCommand::DbCreate { name, opts } => print_verdict(pg.db_create(&name, &opts, conn)?),
        CliCommand::DbRemove(name) => print_verdict(pg.db_remove(&name, conn)?),
        CliCommand::UserList => {
            println!("{}", serde_json::to_string_pretty(&pg.user_list(conn)?)?);
            0
        }
        CliCommand::UserExists(name) => print_verdict(pg.user_exists(&name, conn)?),
        CliCommand::UserCreate { username, opts } => {
            match pg.user_create(&username, &opts, conn)? {
                Some(output) => {
                    print!("{}", output);
                    0
                }
                None => 1,
            }
        }
        CliCommand::UserUpdate { username, opts } => {
            match pg.user_update(&username, &opts, conn)? {
                Some(output) => {
                    print!("{}", output);
                    0
                }
                None => 1,
            }
        }
        CliCommand::UserRemove(username) => print_verdict(pg.user_remove(&username, conn)?),
        CliCommand::Help => unreachable!("handled before loading the module"),
    };
    Ok(exit_code)
}

/// Boolean outcomes print the verdict and exit non-zero on `false`, so the
/// binary composes in shell scripts.
fn print_verdict(verdict: bool) -> i32 {
    println!("{}", verdict);
    if verdict {
        0
    } else {
        1
    }
}

/// Loads the two configuration layers: explicit paths from the command line,
/// otherwise the default files under the config directory when they exist.
fn build_context(invocation: &cli::Invocation) -> Result<ConfigContext> {
    let default_dir = config::get_config_dir();

    let load_layer = |explicit: &Option<String>, default_name: &str| -> Result<Settings> {
        if let Some(path) = explicit {
            return config::load_settings(path);
        }
        let default_path = default_dir.join(default_name);
        if default_path.is_file() {
            info!("loading settings from {}", default_path.display());
            return config::load_settings(&default_path);
        }
        Ok(Settings::default())
    };

    let opts = load_layer(&invocation.config_file, "config.toml")?;
    let pillar = load_layer(&invocation.pillar_file, "pillar.toml")?;
    Ok(ConfigContext::from_settings(&opts, &pillar))
}
