/// ─── Certx Service Constants ────────────────────────────────────────────────
///
/// Defaults shared by the issuance, anchoring and verification services.
/// Every value here can be overridden through the node configuration.

// ── Identity ─────────────────────────────────────────────────────────────────

/// Random bytes in a certificate identifier. 128 bits keeps brute-force
/// enumeration against the public verification endpoint infeasible.
pub const CERTIFICATE_ID_BYTES: usize = 16;

/// Longest accepted textual certificate id (base-58 of 16 bytes is at most 22).
pub const CERTIFICATE_ID_MAX_CHARS: usize = 32;

// ── Collaborator timeouts ────────────────────────────────────────────────────

/// Upper bound for a single completion / quiz / directory read (milliseconds).
pub const DEFAULT_LEDGER_TIMEOUT_MS: u64 = 5_000;

/// Upper bound for one round trip to the minting network (milliseconds).
pub const DEFAULT_MINT_TIMEOUT_MS: u64 = 30_000;

// ── Anchoring ────────────────────────────────────────────────────────────────

/// A mint lease older than this is considered abandoned (seconds).
/// The configured mint timeout must stay below it.
pub const MINT_LEASE_TTL_SECS: i64 = 120;

/// Prefix of on-chain asset names minted for certificates.
pub const ASSET_NAME_PREFIX: &str = "CERT";

/// Maximum asset name length accepted by the minting network (bytes).
pub const MAX_ASSET_NAME_BYTES: usize = 32;

/// Placeholder artwork used when no image URI is configured.
pub const DEFAULT_ANCHOR_IMAGE_URI: &str = "ipfs://certx-default-certificate-artwork";

/// Destination address length bounds (characters).
pub const MIN_DESTINATION_ADDRESS_LEN: usize = 8;
pub const MAX_DESTINATION_ADDRESS_LEN: usize = 128;

// ── Metadata ─────────────────────────────────────────────────────────────────

/// Maximum number of metadata entries on one certificate.
pub const MAX_METADATA_ENTRIES: usize = 64;

/// Maximum metadata key length (characters).
pub const MAX_METADATA_KEY_LEN: usize = 64;

/// Maximum metadata value length (characters).
pub const MAX_METADATA_VALUE_LEN: usize = 1_024;

// ── Storage ──────────────────────────────────────────────────────────────────

/// On-disk schema version written to the `meta` tree.
pub const STATE_SCHEMA_VERSION: u32 = 1;

pub const SECONDS_PER_DAY: i64 = 86_400;
