// ABOUTME: Wires each consumer a release declares to a providing deployment.
// ABOUTME: Order: explicit override, persisted wiring, then the single deployment providing the interface.

use std::collections::BTreeMap;

use snafu::ResultExt;

use super::error::{AmbiguousProviderSnafu, CompileError, MissingProviderSnafu, StateSnafu};
use crate::release::ReleaseMetadata;
use crate::state::EnvironmentState;
use crate::types::DeploymentAddress;

/// Record a provider for every consumer `metadata` declares in `stage`.
///
/// `overrides` maps a consumer variable (or interface name) to a deployment
/// path and always wins. Returns the wiring that was newly written.
pub fn configure_providers(
    env: &mut EnvironmentState,
    address: &DeploymentAddress,
    metadata: &ReleaseMetadata,
    stage: &str,
    overrides: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, CompileError> {
    let path = address.to_string();
    let view: &EnvironmentState = env;
    let existing = view
        .deployment(address)
        .and_then(|deployment| deployment.providers(view, stage))
        .context(StateSnafu { deployment: &path })?;

    let mut wiring = BTreeMap::new();
    for consumer in metadata.get_consumes(stage) {
        let variable = &consumer.variable;
        let provider = if let Some(provider) = overrides
            .get(variable)
            .or_else(|| overrides.get(&consumer.name))
        {
            view.resolve_deployment_path(provider, stage)
                .context(StateSnafu { deployment: &path })?;
            provider.clone()
        } else if existing.contains_key(variable) {
            continue;
        } else {
            let mut candidates = view.get_providers_of_type(&consumer.name);
            candidates.retain(|candidate| candidate != address.root_name());
            match candidates.as_slice() {
                [only] => {
                    tracing::debug!(
                        "Auto-wiring {} of {} to {}, the only provider of {}",
                        variable,
                        path,
                        only,
                        consumer.name
                    );
                    only.clone()
                }
                [] => {
                    return MissingProviderSnafu {
                        deployment: &path,
                        interface: &consumer.name,
                        variable,
                    }
                    .fail();
                }
                _ => {
                    return AmbiguousProviderSnafu {
                        deployment: &path,
                        interface: &consumer.name,
                        variable,
                        candidates,
                    }
                    .fail();
                }
            }
        };
        wiring.insert(variable.clone(), provider);
    }

    let deployment = env
        .deployment_mut(address)
        .context(StateSnafu { deployment: &path })?;
    let stage_state = deployment.get_stage_or_create_new(stage);
    for (variable, provider) in &wiring {
        stage_state.set_provider(variable, provider);
    }
    Ok(wiring)
}
