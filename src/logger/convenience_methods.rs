//! Per-level shorthands for [`HecLogger::log`].
//!
//! Each method logs with the default event id and no exception.

use super::{HecLogger, LogError};
use crate::level::HecLevel;
use crate::log_record::EventId;

macro_rules! level_method {
    ($name:ident, $level:expr) => {
        #[doc = concat!("Log `message` at `", stringify!($level), "`.")]
        pub fn $name(&self, message: &str) -> Result<(), LogError> {
            self.log($level, EventId::default(), message, None)
        }
    };
}

impl HecLogger {
    level_method!(trace, HecLevel::Trace);
    level_method!(debug, HecLevel::Debug);
    level_method!(info, HecLevel::Info);
    level_method!(warn, HecLevel::Warn);
    level_method!(error, HecLevel::Error);
    level_method!(critical, HecLevel::Critical);
}
