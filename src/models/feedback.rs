use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub id: i64,
    pub membership_id: i64,
    pub message: String,
    pub created_at: String,
}
