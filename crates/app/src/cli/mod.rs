use clap::{Parser, Subcommand};

mod db;
mod token;
mod user;

#[derive(Debug, Parser)]
#[command(name = "bookstore-app", about = "Bookstore CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage bookstore accounts
    User(user::UserCommand),
    /// Issue and revoke API bearer tokens
    Token(token::TokenCommand),
    /// Database maintenance
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::User(command) => user::run(command).await,
            Commands::Token(command) => token::run(command).await,
            Commands::Db(command) => db::run(command).await,
        }
    }
}
