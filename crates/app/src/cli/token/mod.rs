use clap::{Args, Subcommand};

mod create;
mod list;
mod revoke;

#[derive(Debug, Args)]
pub(crate) struct TokenCommand {
    #[command(subcommand)]
    command: TokenSubcommand,
}

#[derive(Debug, Subcommand)]
enum TokenSubcommand {
    /// Issue a token and print it once
    Create(create::CreateTokenArgs),
    /// Show a user's tokens without their secrets
    List(list::ListTokensArgs),
    /// Stop a token from authenticating
    Revoke(revoke::RevokeTokenArgs),
}

pub(crate) async fn run(command: TokenCommand) -> Result<(), String> {
    use TokenSubcommand::{Create, List, Revoke};

    match command.command {
        Create(args) => create::run(args).await,
        List(args) => list::run(args).await,
        Revoke(args) => revoke::run(args).await,
    }
}
