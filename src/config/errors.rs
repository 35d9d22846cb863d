//! Error code constants

/// Metadata error codes (0100-0199)
pub const ERR_META_MISSING: &str = "E-VSH-0100";
pub const ERR_META_INVALID: &str = "E-VSH-0101";

/// Filesystem precondition codes (0200-0299)
pub const ERR_NOT_A_FILE: &str = "E-VSH-0200";
pub const ERR_NOT_A_DIRECTORY: &str = "E-VSH-0201";
pub const ERR_DESTINATION_EXISTS: &str = "E-VSH-0202";
pub const ERR_NOT_AN_ARCHIVE: &str = "E-VSH-0203";
pub const ERR_IO: &str = "E-VSH-0204";

/// Descriptor content codes (0300-0399)
pub const ERR_DESCRIPTOR_EMPTY: &str = "E-VSH-0300";
pub const ERR_DESCRIPTOR_NOT_MAP: &str = "E-VSH-0301";
pub const ERR_DESCRIPTOR_SYNTAX: &str = "E-VSH-0302";

/// Build tool contract codes (0400-0499)
pub const ERR_VOCABULARY_CONFLICT: &str = "E-VSH-0400";
pub const ERR_VOCABULARY_MISMATCH: &str = "E-VSH-0401";
pub const ERR_VERSION_PARSE: &str = "E-VSH-0402";
pub const ERR_TOOL_DISCOVERY: &str = "E-VSH-0403";

/// Resource spec codes (0500-0599)
pub const ERR_MEMORY_INVALID: &str = "E-VSH-0500";

/// Process codes (0600-0699)
pub const ERR_COMPONENT_FAILED: &str = "E-VSH-0600";
pub const ERR_SPAWN: &str = "E-VSH-0601";

/// CLI codes (0700-0799)
pub const ERR_CLI_USAGE: &str = "E-VSH-0700";
pub const ERR_CLI_METADATA: &str = "E-VSH-0701";
pub const ERR_CLI_OUTPUT: &str = "E-VSH-0702";
