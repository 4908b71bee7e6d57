/// First id used for entries of a batched JSON-RPC request.
/// Non-batched traffic counts up from 1, so batch ids never collide with it.
pub const BATCH_ID_OFFSET: u64 = 128;
/// Id of the first non-batched JSON-RPC request on a provider
pub const DEFAULT_REQUEST_ID: u64 = 1;
/// Selector of `Error(string)`, the preamble of a Solidity revert reason
pub const REVERT_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
/// ABI word size in bytes
pub const WORD_SIZE: usize = 32;
/// Record key template for currency addresses, `{}` is the upper-cased ticker
pub const CRYPTO_ADDRESS_KEY: &str = "crypto.{}.address";
/// `NewURI` log lookups in flight at once per registry scan
pub const MAX_CONCURRENT_URI_LOOKUPS: usize = 8;
/// Canonical signature of the ERC-721 transfer event
pub const TRANSFER_EVENT: &str = "Transfer(address,address,uint256)";
/// Canonical signature of the registry event that carries the plain-text domain
pub const NEW_URI_EVENT: &str = "NewURI(uint256,string)";
