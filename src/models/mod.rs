pub mod event;
pub mod feedback;
pub mod invitation;
pub mod membership;
pub mod person;
pub mod user;

use serde::Serialize;

/// Standard envelope for rendered views. `view` names the template a
/// front end should use; `data` carries everything the template needs.
#[derive(Debug, Serialize)]
pub struct View<T: Serialize> {
    pub view: &'static str,
    pub data: T,
}

impl<T: Serialize> View<T> {
    pub fn new(view: &'static str, data: T) -> Self {
        Self { view, data }
    }
}
