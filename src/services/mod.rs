//! Services module
//!
//! This module contains business logic services

pub mod generation;
pub mod push;
pub mod reminder;
pub mod weather;

// Re-export commonly used services
pub use generation::{AdviceService, ChecklistService, GeminiClient};
pub use push::{DispatchOutcome, FcmClient, PushDispatcher, PushProvider, ReminderKind, TokenOutcome};
pub use reminder::{BatchSummary, ReminderService, ReminderStore};
pub use weather::WeatherService;

use std::sync::Arc;

use crate::config::Settings;
use crate::database::DatabaseService;
use crate::utils::errors::Result;

/// Service factory creating all services once at process start.
/// Everything downstream receives these by reference; no globals.
#[derive(Clone)]
pub struct ServiceFactory {
    pub db: DatabaseService,
    pub gemini: GeminiClient,
    pub checklist_service: ChecklistService,
    pub advice_service: AdviceService,
    pub reminder_service: ReminderService,
    pub weather_service: Option<WeatherService>,
}

impl ServiceFactory {
    pub fn new(settings: &Settings, db: DatabaseService) -> Result<Self> {
        let gemini = GeminiClient::new(&settings.generation)?;
        let checklist_service = ChecklistService::new(db.clone(), gemini.clone());
        let advice_service = AdviceService::new(db.clone(), gemini.clone());

        let fcm = FcmClient::new(&settings.push)?;
        let dispatcher = PushDispatcher::new(
            Arc::new(fcm),
            settings.reminder.timezone_offset_hours,
        );
        let reminder_service = ReminderService::new(
            Arc::new(db.clone()),
            dispatcher,
            settings.reminder.clone(),
        );

        let weather_service = match &settings.weather {
            Some(config) => Some(WeatherService::new(config)?),
            None => None,
        };

        Ok(Self {
            db,
            gemini,
            checklist_service,
            advice_service,
            reminder_service,
            weather_service,
        })
    }
}
