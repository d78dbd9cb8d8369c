use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,

    /// Upper bounds in characters, not bytes.
    pub max_post_len: usize,
    pub max_comment_len: usize,
    pub max_message_len: usize,

    /// Outbound frames buffered per connection before new ones are dropped.
    pub send_queue: usize,
    pub bcrypt_cost: u32,
    pub seed_demo: bool,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_owned(),
            port: 3000,
            max_post_len: 500,
            max_comment_len: 500,
            max_message_len: 2000,
            send_queue: 256,
            bcrypt_cost: 10,
            seed_demo: true,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Reads the process environment (and `.env`, if present) over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|var| dotenv::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse(&lookup, "PORT", defaults.port)?,
            max_post_len: parse(&lookup, "MAX_POST_LEN", defaults.max_post_len)?,
            max_comment_len: parse(&lookup, "MAX_COMMENT_LEN", defaults.max_comment_len)?,
            max_message_len: parse(&lookup, "MAX_MESSAGE_LEN", defaults.max_message_len)?,
            send_queue: parse(&lookup, "SEND_QUEUE", defaults.send_queue)?,
            bcrypt_cost: parse(&lookup, "BCRYPT_COST", defaults.bcrypt_cost)?,
            seed_demo: parse(&lookup, "SEED_DEMO", defaults.seed_demo)?,
            log_format: parse(&lookup, "LOG_FORMAT", defaults.log_format)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
