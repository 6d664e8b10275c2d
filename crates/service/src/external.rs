//! Translation of inbound broker messages into commands.

use common::BatchRef;
use domain::{ChangeBatchQuantity, Command};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, ServiceError};

/// Channel on which upstream systems report batch quantity changes.
pub const CHANGE_BATCH_QUANTITY_CHANNEL: &str = "change_batch_quantity";

#[derive(Debug, Deserialize)]
struct ChangeBatchQuantityPayload {
    batchref: BatchRef,
    qty: u32,
}

/// Builds the command for a message received on a broker channel.
pub fn command_from_broker(channel: &str, payload: &Value) -> Result<Command> {
    let invalid = |reason: String| ServiceError::InvalidExternalMessage {
        channel: channel.to_string(),
        reason,
    };

    match channel {
        CHANGE_BATCH_QUANTITY_CHANNEL => {
            let payload = ChangeBatchQuantityPayload::deserialize(payload)
                .map_err(|e| invalid(e.to_string()))?;
            Ok(ChangeBatchQuantity::new(payload.batchref, payload.qty).into())
        }
        _ => Err(invalid("unknown channel".to_string())),
    }
}
