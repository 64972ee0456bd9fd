pub use crate::catalog::Catalog;
pub use crate::channels::Channels;
pub use crate::config::{self, Config};
pub use crate::coordinator::{self, Coordinator, Snapshot};
pub use crate::error::{Error as BridgeError, TransportError};
pub use crate::options::Options;
pub use crate::scheduler::{self, Scheduler};

pub use anyhow::{anyhow, bail, Result};
pub use log::{debug, error, info, warn};
pub use tokio::sync::broadcast;
