// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Deployment units and redeploy strategies.

use crate::error::RedeployError;
use std::sync::Arc;

/// Something that can be reloaded in place, such as a running application.
pub trait Deployment: Send + Sync + 'static {
    /// Human readable name used in log lines.
    fn name(&self) -> String;

    /// Reloads the unit. May take arbitrary time.
    fn reload(&self) -> Result<(), RedeployError>;
}

/// Action invoked with the deployment unit once a burst of changes settled.
pub type RedeployCallback<D> = Arc<dyn Fn(&D) -> Result<(), RedeployError> + Send + Sync>;

/// The default strategy: reload the unit in place.
pub fn reload_in_place<D: Deployment>() -> RedeployCallback<D> {
    Arc::new(|unit: &D| unit.reload())
}
