mod init;
mod serve;
mod session;
mod users;

pub use init::cmd_init;
pub use serve::cmd_serve;
pub use session::{cmd_login, cmd_logout, cmd_status};
pub use users::{cmd_create_user, cmd_list_users, cmd_set_active, cmd_set_role};

/// First line of stdin, without the trailing newline.
pub(crate) fn read_secret_line(prompt: &str) -> anyhow::Result<String> {
    use std::io::{BufRead, Write};

    eprint!("{prompt}");
    std::io::stderr().flush().ok();

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
