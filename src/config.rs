use anyhow::Result;
use chrono::FixedOffset;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Deployment timezone as minutes east of UTC. Calendar days are
    /// resolved in this offset, never in raw UTC.
    pub utc_offset_minutes: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:timeclock.db".to_string());

        let utc_offset_minutes: i32 = match env::var("UTC_OFFSET_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("UTC_OFFSET_MINUTES must be an integer: {:?}", raw))?,
            Err(_) => 0,
        };

        if utc_offset_minutes.abs() >= 24 * 60 {
            return Err(anyhow::anyhow!(
                "UTC_OFFSET_MINUTES out of range: {}",
                utc_offset_minutes
            ));
        }

        Ok(Config {
            database_url,
            utc_offset_minutes,
        })
    }

    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
    }
}
