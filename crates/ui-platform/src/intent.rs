use std::collections::BTreeMap;

use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LaunchFlags: u8 {
        const NEW_TASK = 0b0001;
        const CLEAR_TASK = 0b0010;
    }
}

impl Default for LaunchFlags {
    fn default() -> Self {
        LaunchFlags::NEW_TASK
    }
}

/// Request to bring an application (or a URI handled by one) to the foreground.
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchIntent {
    pub package: String,
    pub flags: LaunchFlags,
    pub data_uri: Option<String>,
    pub extras: BTreeMap<String, String>,
}

impl LaunchIntent {
    pub fn for_package(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            flags: LaunchFlags::default(),
            data_uri: None,
            extras: BTreeMap::new(),
        }
    }

    pub fn with_flags(mut self, flags: LaunchFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_data_uri(mut self, uri: impl Into<String>) -> Self {
        self.data_uri = Some(uri.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }
}
