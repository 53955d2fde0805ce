use bookstore_app::{
    database::{self, Db},
    domain::users::{
        PgUsersService, UsersService,
        data::NewUser,
        records::{Role, UserUuid},
    },
};
use clap::Args;
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CreateUserArgs {
    /// Display name
    #[arg(long)]
    name: String,

    /// Login email, unique across users
    #[arg(long)]
    email: String,

    /// One of buyer, seller, admin
    #[arg(long, default_value = "buyer", value_parser = parse_role)]
    role: Role,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Optional user UUID; generated when omitted
    #[arg(long)]
    user_uuid: Option<Uuid>,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse().map_err(|error| format!("{error}"))
}

pub(crate) async fn run(args: CreateUserArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgUsersService::new(Db::new(pool));
    let uuid = args
        .user_uuid
        .map_or_else(UserUuid::new, UserUuid::from_uuid);

    let user = service
        .create_user(NewUser {
            uuid,
            name: args.name,
            email: args.email,
            role: args.role,
        })
        .await
        .map_err(|error| format!("failed to create user: {error}"))?;

    println!("user_uuid: {}", user.uuid);
    println!("user_name: {}", user.name);
    println!("user_email: {}", user.email);
    println!("user_role: {}", user.role);

    Ok(())
}
