//! Proxy-type filtering.

use super::CodeModifier;
use crate::code_model::CodeNamespace;
use crate::error::AppResult;
use serde::Deserialize;

fn default_base() -> String {
    "SoapHttpClientProtocol".to_string()
}

#[derive(Debug, Deserialize)]
struct Options {
    /// Base type marking a declaration as a client proxy.
    #[serde(default = "default_base")]
    base: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base: default_base(),
        }
    }
}

/// Reduces a generated namespace to its client-proxy classes.
///
/// Keeps only declarations that derive from the configured protocol base,
/// discarding the data types the proxy generator emits alongside them.
#[derive(Debug, Default)]
pub struct StripProxyTypes {
    options: Options,
}

impl CodeModifier for StripProxyTypes {
    fn name(&self) -> &str {
        "strip_proxy_types"
    }

    fn set_options(&mut self, options: serde_json::Value) -> AppResult<()> {
        if !options.is_null() {
            self.options =
                serde_json::from_value(options).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn execute(&self, namespace: &mut CodeNamespace) {
        namespace
            .types
            .retain(|decl| decl.base_types.iter().any(|b| b.base == self.options.base));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_model::{TypeDeclaration, TypeRef};

    #[test]
    fn test_keeps_only_proxy_derived() {
        let mut ns = CodeNamespace::new("generated");
        let mut proxy = TypeDeclaration::class("CalculatorClient");
        proxy
            .base_types
            .push(TypeRef::new("SoapHttpClientProtocol"));
        ns.types.push(proxy);
        ns.types.push(TypeDeclaration::class("AddRequest"));

        StripProxyTypes::default().execute(&mut ns);

        assert_eq!(ns.types.len(), 1);
        assert_eq!(ns.types[0].name, "CalculatorClient");
    }
}
