//! # Cure Freedom Telegram Bot
//!
//! A Telegram chat bot that converts imperial ("freedom") units found at the
//! start of a message into metric values, and keeps track of chat members so
//! admins can mute, unmute and kick them.

pub mod bot;
pub mod chat_state;
pub mod config;
pub mod conversion;
pub mod errors;
pub mod observability;
pub mod observability_config;

// Re-export types for easier access
pub use conversion::{
    handle_conversion_command, list_supported_units, ConversionError, UnitRegistry,
    UNIT_REGISTRY,
};
