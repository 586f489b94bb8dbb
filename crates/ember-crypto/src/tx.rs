//! EIP-155 signing of legacy (type 0) transactions.

use crate::error::CryptoError;
use crate::{keccak256, rlp};
use ember_types::address::ADDRESS_SIZE;
use k256::ecdsa::SigningKey;

/// Gas used by a plain native-currency transfer.
pub const TRANSFER_GAS: u64 = 21_000;

/// Everything needed to sign an outbound transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIntent {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: [u8; ADDRESS_SIZE],
    /// Value in wei.
    pub value: u128,
    pub data: Vec<u8>,
}

impl TxIntent {
    /// Native transfer with the fixed transfer gas limit.
    pub fn transfer(to: [u8; ADDRESS_SIZE], value: u128, nonce: u64, gas_price: u128) -> Self {
        Self {
            nonce,
            gas_price,
            gas_limit: TRANSFER_GAS,
            to,
            value,
            data: Vec::new(),
        }
    }

    fn base_fields(&self) -> Vec<Vec<u8>> {
        vec![
            rlp::encode_uint(self.nonce as u128),
            rlp::encode_uint(self.gas_price),
            rlp::encode_uint(self.gas_limit as u128),
            rlp::encode_bytes(&self.to),
            rlp::encode_uint(self.value),
            rlp::encode_bytes(&self.data),
        ]
    }

    /// RLP payload hashed for signing (EIP-155: chain id, 0, 0 appended).
    pub fn signing_payload(&self, chain_id: u64) -> Vec<u8> {
        let mut fields = self.base_fields();
        fields.push(rlp::encode_uint(chain_id as u128));
        fields.push(rlp::encode_uint(0));
        fields.push(rlp::encode_uint(0));
        rlp::encode_list(&fields)
    }

    pub fn signing_hash(&self, chain_id: u64) -> [u8; 32] {
        keccak256(&self.signing_payload(chain_id))
    }
}

/// A signed, broadcast-ready transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    pub raw: Vec<u8>,
    pub hash: [u8; 32],
}

impl SignedTx {
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }
}

/// Sign `intent` for `chain_id` with a secp256k1 secret key.
pub fn sign_transaction(
    secret: &[u8; 32],
    chain_id: u64,
    intent: &TxIntent,
) -> Result<SignedTx, CryptoError> {
    let key = SigningKey::from_slice(secret).map_err(|_| CryptoError::InvalidKey)?;
    let digest = intent.signing_hash(chain_id);
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;

    let v = chain_id as u128 * 2 + 35 + u128::from(recovery_id.is_y_odd());
    let sig_bytes = signature.to_bytes();

    let mut fields = intent.base_fields();
    fields.push(rlp::encode_uint(v));
    fields.push(rlp::encode_uint_bytes(&sig_bytes[..32]));
    fields.push(rlp::encode_uint_bytes(&sig_bytes[32..]));
    let raw = rlp::encode_list(&fields);
    let hash = keccak256(&raw);

    Ok(SignedTx { raw, hash })
}
