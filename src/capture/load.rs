use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{info, warn};

use super::{Capture, CaptureParts};
use crate::error::CaptureError;

/// Reads a decoded capture snapshot (JSON) written by the backend.
pub fn load(path: &Path) -> Result<Capture, CaptureError> {
    let file = File::open(path).map_err(|source| CaptureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match from_reader(BufReader::new(file)) {
        Ok(capture) => {
            info!(
                path = %path.display(),
                packets = capture.packets().len(),
                transactions = capture.transactions().len(),
                transfers = capture.num_transfers(),
                events = capture.events().len(),
                "capture loaded"
            );
            Ok(capture)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "capture rejected");
            Err(e)
        }
    }
}

pub fn from_reader<R: Read>(reader: R) -> Result<Capture, CaptureError> {
    let parts: CaptureParts = serde_json::from_reader(reader)?;
    Capture::from_parts(parts)
}
