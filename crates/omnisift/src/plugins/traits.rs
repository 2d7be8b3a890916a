//! Base plugin traits.
//!
//! [`Plugin`] carries identity only. Lifecycle is a separate capability,
//! [`Lifecycle`], which only processors wrapping stateful engines implement;
//! stateless processors carry no lifecycle methods at all.

use crate::Result;
use async_trait::async_trait;

/// Identity shared by every plugin.
///
/// # Thread Safety
///
/// All plugins must be `Send + Sync` so one instance can serve concurrent callers.
pub trait Plugin: Send + Sync {
    /// Unique, kebab-case name (e.g. `"text-processor"`).
    fn name(&self) -> &str;

    /// Semantic version of the plugin.
    fn version(&self) -> String;

    /// Optional description for logs and processor listings.
    fn description(&self) -> &str {
        ""
    }
}

/// Optional lifecycle capability for plugins that hold native resources.
///
/// Processors expose it through
/// [`ContentProcessor::lifecycle`](crate::plugins::ContentProcessor::lifecycle).
/// Both methods take `&self`; use interior mutability for state.
///
/// # Example
///
/// ```rust
/// use omnisift::plugins::Lifecycle;
/// use omnisift::Result;
/// use async_trait::async_trait;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct ModelHandle {
///     loaded: AtomicBool,
/// }
///
/// #[async_trait]
/// impl Lifecycle for ModelHandle {
///     async fn initialize(&self) -> Result<()> {
///         self.loaded.store(true, Ordering::Release);
///         Ok(())
///     }
///
///     async fn cleanup(&self) -> Result<()> {
///         self.loaded.store(false, Ordering::Release);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Acquire resources (load a model, start a worker).
    async fn initialize(&self) -> Result<()>;

    /// Release resources. Called on registry cleanup.
    async fn cleanup(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct TestPlugin {
        ready: AtomicBool,
    }

    impl Plugin for TestPlugin {
        fn name(&self) -> &str {
            "test-plugin"
        }

        fn version(&self) -> String {
            "1.0.0".to_string()
        }
    }

    #[async_trait]
    impl Lifecycle for TestPlugin {
        async fn initialize(&self) -> Result<()> {
            self.ready.store(true, Ordering::Release);
            Ok(())
        }

        async fn cleanup(&self) -> Result<()> {
            self.ready.store(false, Ordering::Release);
            Ok(())
        }
    }

    #[test]
    fn test_plugin_metadata_defaults() {
        let plugin = TestPlugin {
            ready: AtomicBool::new(false),
        };
        assert_eq!(plugin.name(), "test-plugin");
        assert_eq!(plugin.version(), "1.0.0");
        assert_eq!(plugin.description(), "");
    }

    #[tokio::test]
    async fn test_lifecycle_roundtrip() {
        let plugin = TestPlugin {
            ready: AtomicBool::new(false),
        };
        plugin.initialize().await.unwrap();
        assert!(plugin.ready.load(Ordering::Acquire));
        plugin.cleanup().await.unwrap();
        assert!(!plugin.ready.load(Ordering::Acquire));
    }
}
