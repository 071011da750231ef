pub mod config;
pub mod db;
pub mod error;
pub mod invitations;
pub mod legacy;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod routes;
pub mod rsvp;
pub mod state;
