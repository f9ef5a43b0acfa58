//! Reading transaction receipts out of a verified receipts-trie value.
//!
//! A receipt is `[status, cumulative_gas_used, bloom, logs]` and each log is
//! `[address, topics, data]`. Typed receipts (EIP-2718) carry one extra
//! leading type byte before the list.

use alloy_primitives::{Address, B256, U256};

use crate::error::ReceiptError;
use crate::hash::keccak256;
use crate::rlp_item::RlpItem;

/// One event log, borrowing its data from the receipt buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log<'a> {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: &'a [u8],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt<'a> {
    /// EIP-2718 transaction type, `None` for legacy receipts.
    pub tx_type: Option<u8>,
    /// Status code, or the post-transaction state root before Byzantium.
    pub status: U256,
    pub cumulative_gas_used: U256,
    pub bloom: &'a [u8],
    pub logs: Vec<Log<'a>>,
}

impl<'a> Receipt<'a> {
    pub fn decode(bytes: &'a [u8]) -> Result<Self, ReceiptError> {
        let (tx_type, bytes) = match bytes.split_first() {
            Some((&tx_type, rest)) if (0x01..=0x7f).contains(&tx_type) => (Some(tx_type), rest),
            _ => (None, bytes),
        };

        let fields = RlpItem::new(bytes)?.to_list()?;
        let [status, gas, bloom, logs] = fields[..] else {
            return Err(ReceiptError::ReceiptArity(fields.len()));
        };

        let logs = logs
            .iter()?
            .enumerate()
            .map(|(index, log)| -> Result<Log<'a>, ReceiptError> { Log::decode(index, &log?) })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Receipt {
            tx_type,
            status: status.to_uint()?,
            cumulative_gas_used: gas.to_uint()?,
            bloom: bloom.to_bytes()?,
            logs,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == U256::from(1)
    }

    /// Logs accepted by `filter`, in receipt order.
    pub fn matching_logs<'r>(&'r self, filter: &'r LogFilter) -> impl Iterator<Item = &'r Log<'a>> + 'r {
        self.logs.iter().filter(move |log| filter.matches(log))
    }
}

impl<'a> Log<'a> {
    fn decode(index: usize, item: &RlpItem<'a>) -> Result<Self, ReceiptError> {
        let fields = item.to_list()?;
        let [address, topics, data] = fields[..] else {
            return Err(ReceiptError::LogArity {
                index,
                arity: fields.len(),
            });
        };

        let topics = topics
            .iter()?
            .map(|topic| -> Result<B256, ReceiptError> {
                let topic = topic?.to_bytes()?;
                if topic.len() != 32 {
                    return Err(ReceiptError::TopicLength {
                        index,
                        len: topic.len(),
                    });
                }
                Ok(B256::from_slice(topic))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Log {
            address: address.to_address()?,
            topics,
            data: data.to_bytes()?,
        })
    }

    /// The first topic, the event signature hash for non-anonymous events.
    pub fn signature(&self) -> Option<&B256> {
        self.topics.first()
    }
}

/// Selects logs by emitter and event signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilter {
    pub emitter: Address,
    pub topic0: B256,
}

impl LogFilter {
    /// Filter on `signature`, e.g. `Transfer(address,address,uint256)`.
    pub fn for_event(emitter: Address, signature: &str) -> Self {
        LogFilter {
            emitter,
            topic0: B256::from(keccak256(signature.as_bytes())),
        }
    }

    pub fn matches(&self, log: &Log<'_>) -> bool {
        log.address == self.emitter && log.signature() == Some(&self.topic0)
    }
}

/// Key of the receipt at `index` in a block's receipts trie, `rlp(index)`.
pub fn receipt_trie_key(index: u64) -> Vec<u8> {
    rlp::encode(&index).to_vec()
}
