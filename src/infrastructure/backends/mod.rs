pub mod crew;
#[cfg(test)]
pub mod scripted;

use std::sync::Arc;

use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;

pub struct BackendManager {}

impl BackendManager {
    pub fn get() -> Result<BackendBox> {
        let backend = crew::Crew::new(
            &Config::get(ConfigKey::ApiURL),
            Config::duration(ConfigKey::RequestTimeout)?,
        );

        return Ok(Arc::new(backend));
    }
}
