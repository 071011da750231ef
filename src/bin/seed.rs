use chrono::Duration;
use clap::{Parser, Subcommand};

use rsvpserver::config::Config;
use rsvpserver::db;
use rsvpserver::error::{AppError, Checked};
use rsvpserver::invitations::{InvitationForm, InvitationIssuer};
use rsvpserver::mailer::LogMailer;
use rsvpserver::middleware::auth::{create_token_hash, generate_token};
use rsvpserver::models::event::CreateEvent;
use rsvpserver::models::membership::{Attendance, CreateMembership};
use rsvpserver::models::person::CreatePerson;
use rsvpserver::notifications::rsvp_link;

#[derive(Parser)]
#[command(name = "rsvp-seed")]
#[command(about = "Create organizer accounts and demo data for the RSVP server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator and print a bearer token for it
    Admin {
        username: String,

        /// Token lifetime in days
        #[arg(long, default_value_t = 90)]
        days: i64,
    },
    /// Create an event with an organizer and one invited participant, then
    /// issue that participant an invitation
    Demo {
        /// Event code, e.g. "26w5001"
        #[arg(long, default_value = "26w5001")]
        event: String,

        /// Days from today until the event starts
        #[arg(long, default_value_t = 40)]
        starts_in: i64,

        /// Participant email
        #[arg(long, default_value = "emmy@example.com")]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rsvpserver=info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("rsvp-seed: {e:?}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_env();
    let pool = db::create_pool(&config.database_url).await?;

    match cli.command {
        Commands::Admin { username, days } => {
            let user = db::users::create_user(&pool, &username, true).await?;
            let token = generate_token();
            let expires_at = (chrono::Utc::now() + Duration::days(days))
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string();
            db::users::insert_token(&pool, user.id, &create_token_hash(&token), &expires_at)
                .await?;
            println!("admin {} (id {})", user.username, user.id);
            println!("token {token}");
            println!("expires {expires_at}");
        }
        Commands::Demo {
            event,
            starts_in,
            email,
        } => {
            let today = chrono::Utc::now().date_naive();
            let organizer = db::people::create_person(
                &pool,
                &CreatePerson {
                    salutation: Some("Prof.".to_string()),
                    firstname: "Sofia".to_string(),
                    lastname: "Kovalevskaya".to_string(),
                    email: format!("organizer+{event}@example.com"),
                    affiliation: Some("Stockholm University".to_string()),
                },
            )
            .await?;
            let participant = match db::people::find_by_email(&pool, &email).await? {
                Some(person) => person,
                None => {
                    db::people::create_person(
                        &pool,
                        &CreatePerson {
                            firstname: "Emmy".to_string(),
                            lastname: "Noether".to_string(),
                            email: email.clone(),
                            affiliation: Some("University of Göttingen".to_string()),
                            ..Default::default()
                        },
                    )
                    .await?
                }
            };

            let start_date = today + Duration::days(starts_in);
            let event = db::events::create_event(
                &pool,
                &CreateEvent {
                    code: event,
                    name: "Demo Workshop".to_string(),
                    location: Some("Banff".to_string()),
                    start_date,
                    end_date: start_date + Duration::days(5),
                    organizer_id: organizer.id,
                },
            )
            .await?;

            db::memberships::create_membership(
                &pool,
                &CreateMembership {
                    event_id: event.id,
                    person_id: organizer.id,
                    role: "Contact Organizer".to_string(),
                    attendance: Attendance::Confirmed,
                },
            )
            .await?;
            db::memberships::create_membership(
                &pool,
                &CreateMembership {
                    event_id: event.id,
                    person_id: participant.id,
                    role: "Participant".to_string(),
                    attendance: Attendance::Invited,
                },
            )
            .await?;

            let form = InvitationForm {
                event: event.code.clone(),
                email: participant.email.clone(),
            };
            let issuer = InvitationIssuer::new(
                &pool,
                &LogMailer,
                &config.public_url,
                &config.mail_from,
                config.expiry,
            );
            match issuer.issue(&form, "rsvp-seed", today).await? {
                Checked::Valid(issued) => {
                    println!("event {} ({})", issued.event.code, issued.event.dates_long());
                    println!("invited {} <{}>", issued.person.name(), issued.person.email);
                    println!("expires {}", issued.invitation.expire_date());
                    println!(
                        "link {}",
                        rsvp_link(&config.public_url, &issued.invitation.code)
                    );
                }
                Checked::Invalid(errors) => {
                    return Err(AppError::BadRequest(format!(
                        "could not issue invitation: {errors:?}"
                    )));
                }
            }
        }
    }

    Ok(())
}
