//! Resource models: flat attribute views over the ARM payloads, each with a
//! collection for lookups.

pub mod express_route_service_provider;
pub mod network_interface;
pub mod network_security_rule;

pub use express_route_service_provider::{
    BandwidthOffer, ExpressRouteServiceProvider, ExpressRouteServiceProviders,
};
pub use network_interface::{NetworkInterface, NetworkInterfaces};
pub use network_security_rule::{NetworkSecurityRule, NetworkSecurityRules};

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Overlay `attributes` onto the serialized form of `model`.
///
/// Every key must already exist on the model.
pub(crate) fn merge_json_attributes<T>(model: &T, attributes: &Map<String, Value>) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut current = serde_json::to_value(model)?;
    let object = current
        .as_object_mut()
        .ok_or_else(|| Error::invalid_attribute("attributes", "model is not an object"))?;

    for (key, value) in attributes {
        if !object.contains_key(key) {
            return Err(Error::UnknownAttribute(key.clone()));
        }
        object.insert(key.clone(), value.clone());
    }

    serde_json::from_value(current).map_err(|e| Error::invalid_attribute("attributes", e.to_string()))
}
