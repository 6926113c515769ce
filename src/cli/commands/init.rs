//! Init command handler

use crate::config::Config;

pub fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("Created config.toml with a new token secret.");
        println!("Edit upstream.base_url, then run: chamcong create-user <username> <email> <name> --role admin");
    } else {
        println!("config.toml already exists, leaving it untouched.");
    }
    Ok(())
}
