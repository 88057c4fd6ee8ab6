use crate::runtime::device::Device;

/// The lowest run key.
pub const RUN_MIN: u8 = 1;
/// Where the last selection is kept in the hub's storage.
pub const STORAGE_OFFSET: usize = 0;
pub const STORAGE_LEN: usize = 1;

/// The selected run, always within `[RUN_MIN, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    value: u8,
    max: u8,
}

impl Selection {
    pub fn new(max: u8) -> Selection {
        Selection {
            value: RUN_MIN,
            max: max.max(RUN_MIN),
        }
    }

    /// The persisted selection, or the lowest key when there is none.
    pub fn load(device: &dyn Device, max: u8) -> Selection {
        let mut selection = Selection::new(max);
        if let Some(value) = selection.stored(device) {
            selection.value = value;
        }
        selection
    }

    /// Reads the persisted value. Missing, zero, out of range
    /// and unreadable all mean there is no selection.
    pub fn stored(&self, device: &dyn Device) -> Option<u8> {
        let data = device.storage_read(STORAGE_OFFSET, STORAGE_LEN).ok()?;
        let value = *data.first()?;
        if self.contains(value) {
            Some(value)
        } else {
            None
        }
    }

    /// Persists the current value, ignoring storage failures.
    pub fn store(&self, device: &mut dyn Device) {
        if self.contains(self.value) {
            let _ = device.storage_write(STORAGE_OFFSET, &[self.value]);
        }
    }

    pub fn contains(&self, value: u8) -> bool {
        (RUN_MIN..=self.max).contains(&value)
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    pub fn next(&mut self) {
        self.value = if self.value >= self.max { RUN_MIN } else { self.value + 1 };
    }

    pub fn previous(&mut self) {
        self.value = if self.value <= RUN_MIN { self.max } else { self.value - 1 };
    }

    /// The key the run is registered under.
    pub fn key(&self) -> String {
        self.value.to_string()
    }
}
