pub mod google;
pub mod mailer;
pub mod repositories;
