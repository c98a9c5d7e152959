use crate::bari::OutagePolicy;
use crate::cli::actions::Action;
use anyhow::Result;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let outage_policy = match matches
        .get_one::<String>("outage-policy")
        .map(String::as_str)
    {
        Some("fail-open") => OutagePolicy::FailOpen,
        _ => OutagePolicy::FailClosed,
    };

    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        redis_url: matches
            .get_one("redis-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --redis-url"))?,
        auth_url: matches
            .get_one("auth-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --auth-url"))?,
        durations: matches
            .get_one::<Vec<u64>>("durations")
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("missing block durations"))?,
        login_protection: !matches.get_flag("disable-login-protection"),
        registration_protection: !matches.get_flag("disable-registration-protection"),
        outage_policy,
    })
}
