use tracing::{debug, error, info, trace, warn};

/// Who is logging: a component and, for monitor-scoped messages, the postal code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    /// Component name (e.g., "monitor", "grid_api", "web")
    pub component: String,
    pub zip: Option<String>,
}

impl LogContext {
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            zip: None,
        }
    }

    #[must_use]
    pub fn with_zip(mut self, zip: &str) -> Self {
        self.zip = Some(zip.to_string());
        self
    }
}

/// Logger that attaches its [`LogContext`] as tracing fields
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    context: LogContext,
}

macro_rules! level_method {
    ($name:ident, $macro:ident) => {
        pub fn $name(&self, message: &str) {
            $macro!(
                component = %self.context.component,
                zip = self.context.zip.as_deref(),
                "{}",
                message
            );
        }
    };
}

impl StructuredLogger {
    pub const fn new(context: LogContext) -> Self {
        Self { context }
    }

    pub const fn context(&self) -> &LogContext {
        &self.context
    }

    level_method!(trace, trace);
    level_method!(debug, debug);
    level_method!(info, info);
    level_method!(warn, warn);
    level_method!(error, error);
}

/// Create a logger for a specific component
pub fn get_logger(component: &str) -> StructuredLogger {
    StructuredLogger::new(LogContext::new(component))
}

/// Create a logger scoped to a component and postal code
pub const fn get_logger_with_context(context: LogContext) -> StructuredLogger {
    StructuredLogger::new(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_carries_zip() {
        let logger = get_logger_with_context(LogContext::new("monitor").with_zip("70173"));
        assert_eq!(logger.context().component, "monitor");
        assert_eq!(logger.context().zip.as_deref(), Some("70173"));
        assert_eq!(get_logger("web").context().zip, None);
        logger.debug("no subscriber installed, nothing to assert on output");
    }
}
