pub mod health;
pub mod metrics;
pub mod qa;
pub mod whatsapp;
