// Logging macros for use inside the crate: `debug!`, `info!`, `warn!`, `error!`.
// Backed by `tracing`, `log`, or nothing, depending on enabled features.

#[allow(unused_imports, reason = "not every level is used in every build")]
pub(crate) use crate::observability::{
    log_debug as debug, log_error as error, log_info as info, log_warn as warn,
};
