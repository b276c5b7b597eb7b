//! Handler registry
//!
//! Handlers are consulted in registration order; the first one whose
//! `can_handle` accepts a URL serves both the scan and the brute force call.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::ScanConfig;
use crate::error::{HandlerError, HandlerFault};
use crate::handler::generic::GenericHandler;
use crate::handler::{Finding, Handler};
use crate::package::identity::PackageIdentity;

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in handlers
    pub fn with_defaults(config: &ScanConfig) -> Result<Self, HandlerError> {
        let mut registry = Self::new();
        registry.register(Arc::new(GenericHandler::new(
            Duration::from_millis(config.http_timeout_ms),
            config.brute_force,
        )?));
        Ok(registry)
    }

    /// Add a handler after the already registered ones
    pub fn register(&mut self, handler: Arc<dyn Handler>) {
        self.handlers.push(handler);
    }

    fn handler_for(&self, package: &PackageIdentity, url: &str) -> Option<&Arc<dyn Handler>> {
        let handler = self.handlers.iter().find(|h| h.can_handle(package, url));
        if handler.is_none() {
            debug!("No handler for {}", url);
        }
        handler
    }

    /// Run the structured scan of the handler serving `url`.
    ///
    /// A URL no handler understands yields no findings.
    pub async fn scan(
        &self,
        package: &PackageIdentity,
        url: &str,
    ) -> Result<Vec<Finding>, HandlerFault> {
        let Some(handler) = self.handler_for(package, url) else {
            return Ok(Vec::new());
        };

        debug!("Scanning {} with {}", url, handler.name());
        handler
            .scan(package, url)
            .await
            .map_err(|source| HandlerFault {
                handler: handler.name().to_string(),
                source,
            })
    }

    /// Run the brute force probe of the handler serving `url`
    pub async fn brute_force(
        &self,
        package: &PackageIdentity,
        url: &str,
    ) -> Result<Vec<Finding>, HandlerFault> {
        let Some(handler) = self.handler_for(package, url) else {
            return Ok(Vec::new());
        };

        debug!("Brute forcing {} with {}", url, handler.name());
        handler
            .brute_force(package, url)
            .await
            .map_err(|source| HandlerFault {
                handler: handler.name().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::MockHandler;

    fn package() -> PackageIdentity {
        PackageIdentity::parse("app-misc/foo-1.0").unwrap()
    }

    fn mock_handler(name: &'static str, prefix: &'static str) -> MockHandler {
        let mut handler = MockHandler::new();
        handler.expect_name().return_const(name);
        handler
            .expect_can_handle()
            .returning(move |_, url| url.starts_with(prefix));
        handler
    }

    #[tokio::test]
    async fn scan_uses_first_handler_that_can_handle_url() {
        let mut first = mock_handler("first", "ftp://");
        first.expect_scan().times(0);

        let mut second = mock_handler("second", "https://");
        second.expect_scan().times(1).returning(|_, url| {
            Ok(vec![Finding::new(
                url.replace("1.0", "1.1"),
                "1.1",
                "second",
                50,
            )])
        });

        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(first));
        registry.register(Arc::new(second));

        let findings = registry
            .scan(&package(), "https://example.org/foo-1.0.tar.gz")
            .await
            .unwrap();

        assert_eq!(
            findings,
            vec![Finding::new(
                "https://example.org/foo-1.1.tar.gz",
                "1.1",
                "second",
                50
            )]
        );
    }

    #[tokio::test]
    async fn scan_returns_empty_when_no_handler_matches() {
        let mut handler = mock_handler("http", "http://");
        handler.expect_scan().times(0);

        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(handler));

        let findings = registry
            .scan(&package(), "git://example.org/foo.git")
            .await
            .unwrap();

        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn brute_force_wraps_errors_with_handler_name() {
        let mut handler = mock_handler("generic", "https://");
        handler
            .expect_brute_force()
            .returning(|_, _| Err(HandlerError::InvalidResponse("boom".to_string())));

        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(handler));

        let fault = registry
            .brute_force(&package(), "https://example.org/foo-1.0.tar.gz")
            .await
            .unwrap_err();

        assert_eq!(fault.handler, "generic");
        assert!(matches!(fault.source, HandlerError::InvalidResponse(_)));
    }
}
