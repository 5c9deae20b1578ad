//! Process exit codes for the `repo-vendor` binary.

/// Everything the command attempted succeeded.
pub const SUCCESS: i32 = 0;

/// Generic failure: bad manifest, bad arguments, I/O trouble.
pub const FAILURE: i32 = 1;

/// One or more repositories failed to vendor. The command still attempted
/// every selected repository before exiting with this code.
pub const VENDOR_FAILED: i32 = 8;
