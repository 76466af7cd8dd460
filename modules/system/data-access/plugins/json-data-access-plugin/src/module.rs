//! JSON data-access plugin entry point.

use std::path::Path;
use std::sync::Arc;

use data_access_sdk::{AttributeDataAccessProvider, CredentialDataAccessProvider};
use tracing::{info, warn};
use url::Url;

use crate::config::JsonDataAccessPluginConfig;
use crate::domain::{
    DiagnosticsSink, JsonAttributeProvider, JsonCredentialProvider, TracingDiagnostics,
};
use crate::transport::{HttpTransport, HyperTransport};

/// JSON data-access plugin.
///
/// Wires both providers to one shared transport and diagnostics sink. The
/// providers are immutable once built and can be handed out to any number of
/// concurrent callers.
pub struct JsonDataAccessPlugin {
    credentials: Arc<JsonCredentialProvider>,
    attributes: Arc<JsonAttributeProvider>,
}

impl JsonDataAccessPlugin {
    /// Implementation type identifier under which hosts select this plugin.
    pub const IMPLEMENTATION_TYPE: &'static str = "json";

    /// Load, validate and wire the plugin from a YAML file plus environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the transport
    /// cannot be created.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let cfg = JsonDataAccessPluginConfig::load(path)?;
        Self::from_config(&cfg)
    }

    /// Build the plugin with the production transport and tracing diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the transport
    /// cannot be created.
    pub fn from_config(cfg: &JsonDataAccessPluginConfig) -> anyhow::Result<Self> {
        info!("Initializing json_data_access_plugin");

        cfg.validate()?;
        if cfg.has_unused_parameter_mappings() {
            warn!(
                mapping_count = cfg.attributes.parameter_mappings.len(),
                "Parameter mappings are ignored while the subject is provided in the url path"
            );
        }

        info!(
            base_url = %cfg.base_url,
            timeout = %humantime::format_duration(cfg.timeout),
            submit_as = ?cfg.credential_access.submit_as,
            backend_verifies_password = cfg.credential_access.backend_verifies_password,
            mapping_count = cfg.attributes.parameter_mappings.len(),
            "Loaded plugin configuration"
        );

        let transport = HyperTransport::new(Url::parse(&cfg.base_url)?, cfg.timeout)?;
        let plugin = Self::with_transport(cfg, Arc::new(transport), Arc::new(TracingDiagnostics));

        info!("JSON data-access plugin initialized");
        Ok(plugin)
    }

    /// Build the plugin on a caller-supplied transport and diagnostics sink.
    /// The configuration is taken as already validated.
    #[must_use]
    pub fn with_transport(
        cfg: &JsonDataAccessPluginConfig,
        transport: Arc<dyn HttpTransport>,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Self {
        let credentials = Arc::new(JsonCredentialProvider::new(
            &cfg.credential_access,
            transport.clone(),
            diagnostics.clone(),
        ));
        let attributes = Arc::new(JsonAttributeProvider::new(
            &cfg.attributes,
            transport,
            diagnostics,
        ));
        Self {
            credentials,
            attributes,
        }
    }

    #[must_use]
    pub fn credential_provider(&self) -> Arc<dyn CredentialDataAccessProvider> {
        self.credentials.clone()
    }

    #[must_use]
    pub fn attribute_provider(&self) -> Arc<dyn AttributeDataAccessProvider> {
        self.attributes.clone()
    }
}
