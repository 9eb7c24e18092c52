//! Error handling utilities

use crate::error::NoxideError;
use tracing::error;

/// Exit code for a fatal error
///
/// `NoxideError`s anywhere in the chain pick their own category code,
/// anything else is a general failure.
pub fn fatal_exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<NoxideError>()
        .map(NoxideError::exit_code)
        .unwrap_or(1)
}

/// Handle fatal errors and exit with appropriate status code
///
/// With `verbose >= 1` the whole error chain is printed.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);

    if let Some(noxide_err) = error.downcast_ref::<NoxideError>() {
        eprintln!("{}", noxide_err.user_message());
    } else {
        eprintln!("Error: {error}");
    }

    if verbose >= 1 {
        eprintln!("\nError chain:");
        for (i, cause) in error.chain().enumerate() {
            eprintln!("  {}: {}", i, cause);
        }
    }

    std::process::exit(fatal_exit_code(&error))
}
