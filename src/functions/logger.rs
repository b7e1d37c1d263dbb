use std::sync::LazyLock;

use crate::functions::constants::FUNCTIONS_LOGGER_NAME;
use crate::logger::Logger;

pub static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new(FUNCTIONS_LOGGER_NAME));
