//! External request servers (RPC, work submission).

use crate::error::Result;

pub trait RequestServer: Send + Sync {
    fn name(&self) -> &str;

    /// Stop accepting requests. Called once during shutdown.
    fn stop(&self) -> Result<()>;
}
