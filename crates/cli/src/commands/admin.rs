//! Admin credential commands.
//!
//! # Usage
//!
//! ```bash
//! echo 'a long admin password' | gs-cli admin hash-password
//! ```
//!
//! Put the printed hash in `GIFTSHOP_ADMIN_PASSWORD_HASH`.

use std::io::BufRead;

use giftshop_storefront::services::auth;

use super::CliError;

/// Read a password from the first line of stdin and print its Argon2 hash.
pub fn hash_password() -> Result<(), CliError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);

    auth::validate_password(password)?;
    let hash = auth::hash_password(password)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{hash}");
    }
    Ok(())
}
