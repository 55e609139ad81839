use clap::Subcommand;
use pomofocus_core::{credentials, ApiClient, ConfigStore};

use super::{block_on, print_json, CliResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create a backend account and store its token
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "POMOFOCUS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and store the token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "POMOFOCUS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Remove the stored token
    Logout,
    /// Show the logged-in user
    Whoami,
}

fn client() -> Result<ApiClient, Box<dyn std::error::Error>> {
    let config = ConfigStore::open()?.load()?;
    Ok(ApiClient::from_config(&config.api)?)
}

pub fn run(action: AuthAction) -> CliResult {
    match action {
        AuthAction::Signup {
            username,
            email,
            password,
        } => {
            let client = client()?;
            let auth = block_on(client.signup(&username, &email, &password))??;
            credentials::store(&auth)?;
            print_json(&auth.user)?;
        }
        AuthAction::Login { email, password } => {
            let client = client()?;
            let auth = block_on(client.login(&email, &password))??;
            credentials::store(&auth)?;
            print_json(&auth.user)?;
        }
        AuthAction::Logout => {
            credentials::clear()?;
            println!("logged out");
        }
        AuthAction::Whoami => match credentials::load_user()? {
            Some(user) => print_json(&user)?,
            None => return Err("not logged in".into()),
        },
    }
    Ok(())
}
