//! Minimal CLI parsing: serve by default, or run the bulk seeder.
//!
//! ```text
//! bookshelf
//! bookshelf seed [--users N] [--query Q] [--max-results M]
//! ```

use std::env;

use anyhow::{Context, Result, anyhow, bail};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Command {
    #[default]
    Serve,
    Seed(SeedArgs),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedArgs {
    pub users: usize,
    pub query: String,
    pub max_results: u32,
}

impl Default for SeedArgs {
    fn default() -> Self {
        Self {
            users: 100,
            query: "a".to_string(),
            max_results: 40,
        }
    }
}

#[derive(Debug, Default)]
pub struct CliOptions {
    pub command: Command,
}

impl CliOptions {
    pub fn from_args() -> Result<Self> {
        Self::parse(env::args().skip(1))
    }

    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();

        let command = match args.next().as_deref() {
            None | Some("serve") => Command::Serve,
            Some("seed") => Command::Seed(parse_seed_args(args)?),
            Some(other) => bail!("Unknown command: {}", other),
        };

        Ok(CliOptions { command })
    }
}

fn parse_seed_args(mut args: impl Iterator<Item = String>) -> Result<SeedArgs> {
    let mut seed = SeedArgs::default();

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg, None),
        };

        let mut value = || {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| anyhow!("{} requires a value", flag))
        };

        match flag.as_str() {
            "--users" => seed.users = value()?.parse().context("Invalid --users")?,
            "--query" => seed.query = value()?,
            "--max-results" => {
                seed.max_results = value()?.parse().context("Invalid --max-results")?
            }
            _ => bail!("Unknown seed option: {}", flag),
        }
    }

    Ok(seed)
}
