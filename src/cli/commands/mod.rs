use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

use crate::bruteforce::EscalationPolicy;

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

/// Parse a comma-separated list of seconds and validate it as an
/// escalation table, so a bad table dies at startup.
pub fn validator_durations() -> ValueParser {
    ValueParser::from(
        move |input: &str| -> std::result::Result<Vec<u64>, String> {
            let durations = input
                .split(',')
                .map(|part| {
                    part.trim()
                        .parse::<u64>()
                        .map_err(|_| format!("invalid duration: {part}"))
                })
                .collect::<Result<Vec<u64>, String>>()?;
            EscalationPolicy::new(durations.clone()).map_err(|err| err.to_string())?;
            Ok(durations)
        },
    )
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("bari")
        .about("Adaptive brute-force protection for login and registration")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("BARI_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("redis-url")
                .short('r')
                .long("redis-url")
                .help("Block store connection string, example: redis://:password@localhost:6379/0")
                .env("BARI_REDIS_URL")
                .required(true),
        )
        .arg(
            Arg::new("auth-url")
                .short('a')
                .long("auth-url")
                .help("Base URL of the upstream credential verifier")
                .env("BARI_AUTH_URL")
                .required(true),
        )
        .arg(
            Arg::new("durations")
                .long("durations")
                .help("Comma-separated block durations in seconds, shortest first")
                .default_value("15,120,540,1800,7200,14400,28800,57600,86400")
                .env("BARI_DURATIONS")
                .value_parser(validator_durations()),
        )
        .arg(
            Arg::new("disable-login-protection")
                .long("disable-login-protection")
                .help("Do not rate limit failed logins")
                .env("BARI_DISABLE_LOGIN_PROTECTION")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("disable-registration-protection")
                .long("disable-registration-protection")
                .help("Do not rate limit rejected registrations")
                .env("BARI_DISABLE_REGISTRATION_PROTECTION")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("outage-policy")
                .long("outage-policy")
                .help("Behaviour when the block store is unreachable")
                .default_value("fail-closed")
                .env("BARI_OUTAGE_POLICY")
                .value_parser(["fail-closed", "fail-open"]),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("BARI_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
