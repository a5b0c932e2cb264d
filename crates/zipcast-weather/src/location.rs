//! The ordered, duplicate-free set of tracked zip codes.

use crate::store::SnapshotWriter;
use crate::types::LocationCode;

#[derive(Debug, Default)]
pub struct LocationRegistry {
    locations: Vec<LocationCode>,
    revision: u64,
    writer: Option<SnapshotWriter>,
}

impl LocationRegistry {
    /// Registry that is never persisted
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry rehydrated from, and written back to, the writer's key.
    ///
    /// Invalid or repeated codes in the snapshot are dropped.
    pub fn persistent(writer: SnapshotWriter) -> Self {
        let mut locations: Vec<LocationCode> = Vec::new();

        for raw in writer.read::<Vec<String>>().unwrap_or_default() {
            match LocationCode::parse(&raw) {
                Ok(code) if !locations.contains(&code) => locations.push(code),
                Ok(_) => {}
                Err(e) => tracing::warn!("Dropping stored location: {}", e),
            }
        }

        Self {
            locations,
            revision: 0,
            writer: Some(writer),
        }
    }

    pub fn locations(&self) -> &[LocationCode] {
        &self.locations
    }

    pub fn contains(&self, code: &LocationCode) -> bool {
        self.locations.contains(code)
    }

    /// Incremented on every change to the location sequence
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Track a new code. Invalid input is logged and ignored; a code that is
    /// already tracked keeps its original position.
    ///
    /// Returns the code when the sequence changed.
    pub fn add_location(&mut self, raw: &str) -> Option<LocationCode> {
        let code = match LocationCode::parse(raw) {
            Ok(code) => code,
            Err(_) => {
                tracing::warn!("Wrong zipcode: {}", raw);
                return None;
            }
        };

        self.add_code(code.clone()).then_some(code)
    }

    /// Track an already validated code. Returns false when it was tracked.
    pub fn add_code(&mut self, code: LocationCode) -> bool {
        if self.locations.contains(&code) {
            tracing::debug!("Location {} already tracked", code);
            return false;
        }

        tracing::info!("Tracking location {}", code);
        self.locations.push(code);
        self.changed();
        true
    }

    /// Stop tracking a code. Returns false when it was not tracked.
    pub fn remove_location(&mut self, code: &str) -> bool {
        let code = code.trim();
        let before = self.locations.len();
        self.locations.retain(|location| location.as_str() != code);

        if self.locations.len() == before {
            return false;
        }

        tracing::info!("Stopped tracking location {}", code);
        self.changed();
        true
    }

    fn changed(&mut self) {
        self.revision += 1;
        if let Some(writer) = &self.writer {
            writer.write(&self.locations);
        }
    }
}
