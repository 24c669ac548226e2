// src/models/contact.rs

use serde::Deserialize;
use validator::Validate;

/// DTO for the public contact form.
/// Missing fields deserialize as empty strings and fail validation.
#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "A valid email is required."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Subject is required."))]
    pub subject: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "Message is required."))]
    pub message: String,
}
