use serde::Deserialize;
use sqlx::SqlitePool;

use crate::db;
use crate::error::AppError;
use crate::models::feedback::Feedback;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackForm {
    pub feedback_message: Option<String>,
}

/// Store the invitee's feedback. Blank submissions are skipped.
pub async fn record(
    pool: &SqlitePool,
    membership_id: i64,
    form: &FeedbackForm,
) -> Result<Option<Feedback>, AppError> {
    let message = form
        .feedback_message
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if message.is_empty() {
        return Ok(None);
    }

    let feedback = db::feedback::create_feedback(pool, membership_id, message).await?;
    tracing::info!(membership_id, feedback_id = feedback.id, "recorded RSVP feedback");
    Ok(Some(feedback))
}
