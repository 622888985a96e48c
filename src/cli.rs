use clap::{Parser, Subcommand};

use crate::users::UserStore;

/// authgate - username/password authentication service
#[derive(Parser)]
#[command(name = "authgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum UserCommands {
    /// List all users
    List,

    /// Disable an account; there is no way back
    Disable {
        /// Identifier the user registered with
        person_id: i64,
    },
}

impl UserCommands {
    /// Run the command against `store`, returning the text to print.
    pub async fn execute(self, store: &dyn UserStore) -> anyhow::Result<String> {
        match self {
            UserCommands::List => {
                let users = store.get_all().await?;
                if users.is_empty() {
                    return Ok("No users found.".into());
                }

                let mut out = format!(
                    "{:<12} {:<20} {:<30} {:<8}",
                    "ID", "Name", "Email", "Enabled"
                );
                for user in users {
                    let name = format!("{} {}", user.first_name, user.last_name);
                    out.push('\n');
                    out.push_str(&format!(
                        "{:<12} {:<20} {:<30} {:<8}",
                        user.person_id,
                        name.trim(),
                        user.email,
                        if user.enabled { "Yes" } else { "No" }
                    ));
                }
                Ok(out)
            }

            UserCommands::Disable { person_id } => match store.disable(person_id).await? {
                Some(user) => {
                    tracing::info!(person_id, "user disabled from the command line");
                    Ok(format!("User {} ({}) has been disabled.", user.person_id, user.email))
                }
                None => anyhow::bail!("user {person_id} not found"),
            },
        }
    }
}
