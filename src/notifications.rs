//! Plain-text bodies for the two messages this service sends.

use crate::mailer::Email;
use crate::models::event::Event;
use crate::models::invitation::Invitation;
use crate::models::membership::Attendance;
use crate::models::person::Person;

fn reply_label(attendance: Attendance) -> &'static str {
    match attendance {
        Attendance::Confirmed => "Yes",
        Attendance::Declined => "No",
        Attendance::Undecided => "Maybe",
        Attendance::Invited | Attendance::NotYetInvited => "No reply",
    }
}

/// Tell the organizer that a participant replied, with their message.
pub fn organizer_notice(
    from: &str,
    event: &Event,
    organizer: &Person,
    participant: &Person,
    attendance: Attendance,
    message: Option<&str>,
) -> Email {
    let mut body = format!(
        "Dear {},\n\n{} ({}) replied \"{}\" to the invitation to {} ({}).\n\
         Their attendance is now: {}.\n",
        organizer.dear_name(),
        participant.name(),
        participant.email,
        reply_label(attendance),
        event.name,
        event.dates_long(),
        attendance,
    );

    match message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(message) => {
            body.push_str("\nThey included this message:\n\n");
            body.push_str(message);
            body.push('\n');
        }
        None => body.push_str("\nThey did not include a message.\n"),
    }

    Email {
        from: from.to_string(),
        to: vec![organizer.email.clone()],
        reply_to: Some(participant.email.clone()),
        subject: format!(
            "[{}] {} replied: {}",
            event.code,
            participant.name(),
            reply_label(attendance)
        ),
        body,
    }
}

/// Invitation sent to a participant, carrying their RSVP link.
pub fn invitation_email(
    from: &str,
    public_url: &str,
    event: &Event,
    organizer: &Person,
    invitee: &Person,
    invitation: &Invitation,
) -> Email {
    let link = rsvp_link(public_url, &invitation.code);
    let body = format!(
        "Dear {},\n\n{} invites you to {}, taking place {}{}.\n\n\
         Please let us know whether you can attend by visiting:\n\n  {}\n\n\
         This link is personal and can be used until {}.\n",
        invitee.dear_name(),
        organizer.name(),
        event.name,
        event.dates_long(),
        event
            .location
            .as_deref()
            .map(|l| format!(" at {l}"))
            .unwrap_or_default(),
        link,
        invitation.expire_date(),
    );

    Email {
        from: from.to_string(),
        to: vec![invitee.email.clone()],
        reply_to: Some(organizer.email.clone()),
        subject: format!("[{}] Invitation: {}", event.code, event.name),
        body,
    }
}

pub fn rsvp_link(public_url: &str, code: &str) -> String {
    format!("{}/rsvp/{code}", public_url.trim_end_matches('/'))
}
