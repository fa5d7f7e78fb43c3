//! Named function registry
//!
//! Maps configured function names to constructors so the configurable
//! pipeline is a pure data transformation: `execution_order` names are
//! looked up here and each constructor receives that function's parameter
//! map from the writable configuration.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{EdgeflowError, Result};

use super::PipelineFunction;

/// Parameters for one configured function, keys lowercased
pub type FunctionParams = HashMap<String, String>;

/// Builds a pipeline function from its configured parameters
pub type FunctionConstructor =
    Box<dyn Fn(&FunctionParams) -> Result<Arc<dyn PipelineFunction>> + Send + Sync>;

/// Registry of constructable pipeline functions
#[derive(Default)]
pub struct FunctionRegistry {
    constructors: HashMap<String, FunctionConstructor>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `name`, replacing any previous one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        constructor: FunctionConstructor,
    ) -> &mut Self {
        self.constructors.insert(name.into(), constructor);
        self
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted for stable error messages.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build the function registered under `name`.
    ///
    /// Parameter keys are lowercased before the constructor sees them so
    /// configuration casing does not matter.
    pub fn build(&self, name: &str, params: &FunctionParams) -> Result<Arc<dyn PipelineFunction>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| EdgeflowError::FunctionNotRegistered(name.to_string()))?;

        let lowered: FunctionParams = params
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();

        constructor(&lowered)
    }
}
