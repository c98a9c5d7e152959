pub mod server;

use crate::bari::OutagePolicy;

/// What the CLI asked us to do.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        redis_url: String,
        auth_url: String,
        durations: Vec<u64>,
        login_protection: bool,
        registration_protection: bool,
        outage_policy: OutagePolicy,
    },
}
